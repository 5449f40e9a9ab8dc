//! Curve sampling for standard motions.
//!
//! Model:
//! - Each curve has keys ordered by time in milliseconds.
//! - Between two keys the value is linearly interpolated.
//! - Before the first key the first value holds; after the last key the last value holds.

use crate::assets::Keyframe;

/// Find the segment [i, i+1] containing `t` and return (i, i+1, local_t) with local_t in [0,1].
/// Edge cases:
/// - If t <= first.time, returns (0, 0, 0) and caller should pick keys[0].
/// - If t >= last.time, returns (last, last, 0) and caller should pick keys[last].
fn find_segment(keys: &[Keyframe], t: f32) -> (usize, usize, f32) {
    let n = keys.len();
    if n <= 1 || t <= keys[0].time_ms {
        return (0, 0, 0.0);
    }
    if t >= keys[n - 1].time_ms {
        return (n - 1, n - 1, 0.0);
    }
    // First key strictly after t; keys are sorted so this is a binary search.
    let hi = keys.partition_point(|k| k.time_ms <= t);
    let lo = hi - 1;
    let t0 = keys[lo].time_ms;
    let t1 = keys[hi].time_ms;
    let denom = (t1 - t0).max(f32::EPSILON);
    (lo, hi, ((t - t0) / denom).clamp(0.0, 1.0))
}

/// Sample a curve at `t` milliseconds. An empty curve samples as 0.0.
pub fn sample_curve(keys: &[Keyframe], t: f32) -> f32 {
    match keys.len() {
        0 => 0.0,
        1 => keys[0].value,
        _ => {
            let (i0, i1, lt) = find_segment(keys, t);
            if i0 == i1 {
                return keys[i0].value;
            }
            let a = keys[i0].value;
            let b = keys[i1].value;
            a + (b - a) * lt
        }
    }
}
