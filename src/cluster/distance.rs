//! Missing-aware Euclidean distance.
//!
//! Only dimensions present in both vectors contribute. The sum is scaled
//! by `total / shared` so that vectors with many gaps are not made to look
//! closer than complete ones. With no shared dimension the distance is
//! `+inf`.

use crate::matrix::Cell;

/// Squared distance over shared dimensions, scaled to the full length.
pub fn squared_distance(a: &[Cell], b: &[Cell]) -> f64 {
    let mut sum = 0.0;
    let mut shared = 0usize;
    for (x, y) in a.iter().zip(b) {
        if let (Some(x), Some(y)) = (x, y) {
            let d = x - y;
            sum += d * d;
            shared += 1;
        }
    }
    if shared == 0 {
        return f64::INFINITY;
    }
    sum * (a.len().max(b.len()) as f64 / shared as f64)
}

/// Euclidean distance over shared dimensions, scaled to the full length.
#[inline]
pub fn euclidean_distance(a: &[Cell], b: &[Cell]) -> f64 {
    squared_distance(a, b).sqrt()
}
