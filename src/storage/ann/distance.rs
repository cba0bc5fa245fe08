//! Distance functions.

/// Distance between two equal-length vectors; smaller is closer.
pub type DistanceFn = fn(&[f32], &[f32]) -> f32;

/// Computes cosine distance, `1 - cos(a, b)`.
///
/// Sums are accumulated in `f64`. Returns `1.0` when either vector has zero
/// magnitude, so the zero anchor sits at distance one from everything.
///
/// # Returns
///
/// A value in `[0.0, 2.0]` for finite input.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    (1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}
