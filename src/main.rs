//! hitsim - headless runner
//!
//! Loads a scenario, plays it frame by frame with the scripted bot (or
//! autoplay) and prints every judgement followed by a score summary.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;

use hitsim::beatmap::Scenario;
use hitsim::bot::Bot;
use hitsim::sim::{FrameInput, Judgement, JudgementSink, Playfield, ScoreCounter, Tee};
use hitsim::{GameplaySettings, Mods, NotelockKind};

#[derive(Parser, Debug)]
#[command(name = "hitsim")]
#[command(about = "Play a hit-object scenario headlessly and print the judgements")]
struct Args {
    /// Scenario JSON file
    #[arg(required = true)]
    scenario: PathBuf,

    /// Gameplay settings JSON (defaults when omitted)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Comma separated mods, e.g. "hd,hr" or "autoplay"
    #[arg(long, default_value = "")]
    mods: String,

    /// Playback speed, overrides dt/ht
    #[arg(long)]
    speed: Option<f32>,

    /// Notelock algorithm (neosu, stable, lazer, none)
    #[arg(long)]
    notelock: Option<String>,

    /// Simulated frames per second (real time)
    #[arg(long, default_value_t = 240)]
    fps: u32,

    /// Seed for the bot's timing jitter
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Max bot timing error (ms)
    #[arg(long, default_value_t = 0)]
    jitter: i64,

    /// Print JSON lines instead of text
    #[arg(long)]
    json: bool,
}

/// Prints sink events as they happen
struct Printer {
    json: bool,
    now: i64,
}

#[derive(Serialize)]
struct JudgementLine<'a> {
    time: i64,
    #[serde(flatten)]
    judgement: &'a Judgement,
}

impl JudgementSink for Printer {
    fn on_judgement(&mut self, judgement: &Judgement) {
        if self.json {
            let line = JudgementLine {
                time: self.now,
                judgement,
            };
            match serde_json::to_string(&line) {
                Ok(s) => println!("{s}"),
                Err(e) => log::warn!("failed to serialize judgement: {e}"),
            }
        } else {
            println!(
                "{:>8} ms  {:<12} {:+5} ms  ({:.0}, {:.0}){}",
                self.now,
                judgement.result.as_str(),
                judgement.delta,
                judgement.pos.x,
                judgement.pos.y,
                if judgement.end_of_combo { "  end of combo" } else { "" }
            );
        }
    }

    fn on_slider_break(&mut self) {
        if self.json {
            println!("{{\"time\":{},\"slider_break\":true}}", self.now);
        } else {
            println!("{:>8} ms  slider break", self.now);
        }
    }

    fn on_score_bonus(&mut self, _points: u32) {}
}

#[derive(Serialize)]
struct Summary {
    score: u64,
    accuracy: f64,
    max_combo: u32,
    possible_combo: u32,
    perfects: u32,
    goods: u32,
    mehs: u32,
    misses: u32,
    slider_breaks: u32,
    health: f64,
    mean_hit_error: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.fps == 0 {
        bail!("--fps must be greater than zero");
    }

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;

    let mut settings = match &args.settings {
        Some(path) => GameplaySettings::load(path)
            .with_context(|| format!("Failed to load settings {}", path.display()))?,
        None => GameplaySettings::default(),
    };
    if let Some(name) = &args.notelock {
        settings.notelock = NotelockKind::from_str(name)
            .with_context(|| format!("Unknown notelock kind: {name}"))?;
    }

    let mut mods = Mods::parse_list(&args.mods).map_err(|name| anyhow::anyhow!("Unknown mod: {name}"))?;
    if let Some(speed) = args.speed {
        if speed <= 0.0 {
            bail!("--speed must be positive");
        }
        mods.speed = speed;
    }

    let ctx = scenario.context(mods, settings);
    let objects = scenario.build(&ctx).context("Failed to build scenario")?;
    log::info!(
        "Loaded {} objects (AR {:.1}, OD {:.1}, CS {:.1}, HP {:.1})",
        objects.len(),
        ctx.difficulty.ar,
        ctx.difficulty.od,
        ctx.difficulty.cs,
        ctx.difficulty.hp
    );

    let mut bot = Bot::new(&objects, args.jitter, args.seed);
    let mut field = Playfield::new(objects, ctx);
    let mut score = ScoreCounter::new(field.context().difficulty.hp);
    let mut printer = Printer {
        json: args.json,
        now: 0,
    };

    // song time advances faster than real time under dt
    let frame_ms = 1000.0 / args.fps as f64 * mods.speed as f64;
    let start = field.objects().first().map_or(0, |o| o.time() - 1000).max(0);
    let end = field.end_time() + 1000;

    let mut frame: u64 = 0;
    loop {
        let now = start + (frame as f64 * frame_ms) as i64;
        if now > end {
            break;
        }

        let input = if mods.autoplay {
            FrameInput::new(field.auto_cursor(now), frame_ms as f32)
        } else {
            bot.frame(now, frame_ms as f32, &field)
        };

        printer.now = now;
        field.update(now, &input, &mut Tee(&mut printer, &mut score));
        frame += 1;
    }
    log::info!("Simulated {frame} frames ({start}..{end} ms)");

    let summary = Summary {
        score: score.score,
        accuracy: score.accuracy(),
        max_combo: score.max_combo,
        possible_combo: field.max_combo(),
        perfects: score.perfects,
        goods: score.goods,
        mehs: score.mehs,
        misses: score.misses,
        slider_breaks: score.slider_breaks,
        health: score.health,
        mean_hit_error: score.mean_hit_error(),
    };

    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!();
        println!("Score:        {}", summary.score);
        println!("Accuracy:     {:.2}%", summary.accuracy * 100.0);
        println!("Combo:        {}x / {}x", summary.max_combo, summary.possible_combo);
        println!(
            "300 / 100 / 50 / miss: {} / {} / {} / {}",
            summary.perfects, summary.goods, summary.mehs, summary.misses
        );
        println!("Slider breaks: {}", summary.slider_breaks);
        println!("Health:       {:.1}%", summary.health * 100.0);
        match summary.mean_hit_error {
            Some(err) => println!("Hit error:    {err:+.2} ms"),
            None => println!("Hit error:    -"),
        }
    }

    Ok(())
}
