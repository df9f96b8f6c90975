//! Domain errors raised while setting up areas or comparing rankings.

use thiserror::Error;

/// Precondition violations of the election model.
///
/// All of them are configuration errors: they are raised eagerly during
/// setup (or by a caller handing in malformed rankings) and abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The area size variance factor must lie in `[0, 1]`.
    #[error("size variance must be in [0, 1], but is {0}")]
    InvalidSizeVariance(f64),

    /// An area anchor does not lie inside the grid.
    #[error("anchor ({row}, {col}) lies outside the {height}x{width} grid")]
    AnchorOutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    /// Two rankings being compared have different lengths.
    #[error("rankings must have the same length, but have {left} and {right}")]
    LengthMismatch { left: usize, right: usize },

    /// Two rank arrays do not span the same value range.
    #[error("rank arrays {left:?} and {right:?} aren't comparable")]
    Incomparable { left: Vec<f64>, right: Vec<f64> },

    /// The search pairs were built for a different ranking length.
    #[error("expected {expected} search pairs, but got {actual}")]
    PairsMismatch { expected: usize, actual: usize },
}
