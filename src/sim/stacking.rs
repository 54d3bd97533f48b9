//! Stack offsets for objects placed on (nearly) the same spot

use super::object::HitObject;
use crate::consts::STACK_LENIENCE;

/// Recompute stack heights in place.
///
/// `version` selects the algorithm: files newer than v5 use the
/// backwards-walking one, older files the forward one.
pub fn calculate_stacks(objects: &mut [HitObject], approach_time: f32, stack_leniency: f32, version: u32) {
    for object in objects.iter_mut() {
        object.base_mut().stack = 0;
    }

    let threshold = approach_time * stack_leniency;
    if version > 5 {
        stack_backwards(objects, threshold);
    } else {
        stack_forwards(objects, threshold);
    }

    let stacked = objects.iter().filter(|o| o.base().stack != 0).count();
    log::debug!("stacking: {stacked} of {} objects offset (v{version})", objects.len());
}

/// Move every object to its stacked position
pub fn apply_stack_offsets(objects: &mut [HitObject], offset: f32, hard_rock: bool) {
    for object in objects.iter_mut() {
        object.update_stack_position(offset, hard_rock);
    }
}

#[inline]
fn close(a: glam::Vec2, b: glam::Vec2) -> bool {
    a.distance(b) < STACK_LENIENCE
}

fn stack_of(objects: &[HitObject], i: usize) -> i32 {
    objects[i].base().stack
}

fn set_stack(objects: &mut [HitObject], i: usize, stack: i32) {
    objects[i].base_mut().stack = stack;
}

fn stack_backwards(objects: &mut [HitObject], threshold: f32) {
    for i in (0..objects.len()).rev() {
        if stack_of(objects, i) != 0 || objects[i].is_spinner() {
            continue;
        }

        let is_slider = matches!(objects[i], HitObject::Slider(_));
        // object currently being stacked onto
        let mut top = i;
        let mut n = i;

        while n > 0 {
            n -= 1;
            if objects[n].is_spinner() {
                continue;
            }

            let top_start = objects[top].original_start_pos();

            if is_slider {
                if objects[top].time() as f32 - threshold > objects[n].time() as f32 {
                    break;
                }
                let n_pos = if objects[n].duration() != 0 {
                    objects[n].original_end_pos()
                } else {
                    objects[n].original_start_pos()
                };
                if close(n_pos, top_start) {
                    set_stack(objects, n, stack_of(objects, top) + 1);
                    top = n;
                }
                continue;
            }

            if objects[top].time() as f32 - threshold > objects[n].end_time() as f32 {
                break;
            }

            // circles after a slider end are pushed the other way
            let n_end = objects[n].original_end_pos();
            if objects[n].duration() != 0 && close(n_end, top_start) {
                let offset = stack_of(objects, top) - stack_of(objects, n) + 1;
                for j in n + 1..=i {
                    if close(n_end, objects[j].original_start_pos()) {
                        set_stack(objects, j, stack_of(objects, j) - offset);
                    }
                }
                break;
            }

            if close(objects[n].original_start_pos(), top_start) {
                set_stack(objects, n, stack_of(objects, top) + 1);
                top = n;
            }
        }
    }
}

fn stack_forwards(objects: &mut [HitObject], threshold: f32) {
    for i in 0..objects.len() {
        let is_slider = matches!(objects[i], HitObject::Slider(_));
        if stack_of(objects, i) != 0 && !is_slider {
            continue;
        }

        let start = objects[i].original_start_pos();
        let end = if is_slider {
            objects[i].original_end_pos()
        } else {
            start
        };
        let mut start_time = objects[i].end_time();
        let mut slider_stack = 0;

        for j in i + 1..objects.len() {
            if objects[j].time() as f32 - threshold > start_time as f32 {
                break;
            }

            let pos_j = objects[j].original_start_pos();
            if close(pos_j, start) {
                set_stack(objects, i, stack_of(objects, i) + 1);
                start_time = objects[j].end_time();
            } else if close(pos_j, end) {
                // notes after a slider end are bumped down and right
                slider_stack += 1;
                set_stack(objects, j, stack_of(objects, j) - slider_stack);
                start_time = objects[j].end_time();
            }
        }
    }
}
