//! Days-to-closest-sample fold.
//!
//! While daily files are folded into a composite, a per-pixel plane tracks how far (in
//! days, offset by one) the nearest observation lies from the target day. The distance
//! stored for a contributing file at day difference `d` is `|d| + 1`, so a value of `0`
//! keeps meaning "no observation seen yet".
//!
//! The fold is sequential over the files of a window, sorted by date, and distinguishes
//! the first file of the window from the following ones:
//!
//! * first file: where the file has data (`mask > 0`) the value becomes `|d| + 1`,
//!   elsewhere it is left untouched.
//! * later files: where the file has data and nothing was recorded yet the value becomes
//!   `|d| + 1`; then, where the file has data and a value exists, the minimum of the
//!   two is kept.
//!
//! For every pixel with at least one observation the result is the smallest `|d| + 1`
//! over the contributing files; pixels never observed keep `0`.

/// Distance recorded for a file at day difference `day_difference`.
#[inline]
pub fn sample_distance(day_difference: i32) -> f32 {
    (day_difference.unsigned_abs() + 1) as f32
}

/// Next closest-sample value of one pixel.
#[inline]
pub fn next_closest_sample(old: f32, mask: f32, candidate: f32, first_file: bool) -> f32 {
    if mask.is_nan() || mask <= 0.0 {
        return old;
    }
    if first_file {
        return candidate;
    }
    let current = if old == 0.0 { candidate } else { old };
    if current > 0.0 {
        candidate.min(current)
    } else {
        old
    }
}

/// Fold one contributing file into the closest-sample plane.
///
/// Arguments
/// -----------------
/// * `days`: Running closest-sample plane of the composite.
/// * `mask`: Mask plane of the contributing daily file.
/// * `day_difference`: Signed day difference of the file to the target day.
/// * `first_file`: Whether this is the first file folded into this composite.
pub fn fold_closest_sample(days: &mut [f32], mask: &[f32], day_difference: i32, first_file: bool) {
    let candidate = sample_distance(day_difference);
    for (old, &m) in days.iter_mut().zip(mask) {
        *old = next_closest_sample(*old, m, candidate, first_file);
    }
}
