//! Forward slit smearing: kernel, lookup, and the smearing operator.

pub mod kernel;
pub mod lookup;
pub mod operator;

use std::ops::Range;

pub use kernel::plengt;
pub use lookup::{Bracket, BracketCursor, interpolate, locate, lookup, lookup_blended};
pub use operator::{SmearSettings, prepare_extrapolation, smear};

/// Indices of the extrapolation fit window: `q ≥ s_final`, excluding the last sample.
pub fn tail_window(q: &[f64], s_final: f64) -> Range<usize> {
    let start = q.partition_point(|&v| v < s_final);
    let end = q.len().saturating_sub(1);
    start..end.max(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_window_bounds() {
        let q = [0.1, 0.2, 0.3, 0.4, 0.5];
        assert_eq!(tail_window(&q, 0.25), 2..4);
        assert_eq!(tail_window(&q, 0.2), 1..4);
        assert_eq!(tail_window(&q, 0.5), 4..4);
        assert_eq!(tail_window(&q, 0.9), 5..5);
        assert!(tail_window(&[], 0.1).is_empty());
    }
}
