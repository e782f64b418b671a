//! Error types for the windtrail core.

use thiserror::Error;

/// Errors produced while constructing scenes, fields and gradients.
///
/// Per-frame operations never fail: a particle without field data simply
/// does not move. Everything here is raised at construction time.
#[derive(Debug, Error)]
pub enum WindError {
    /// Width or height was zero, negative, non-finite, or overflowed `usize`.
    #[error("invalid dimensions: width and height must be positive and finite")]
    InvalidDimensions,

    /// A flat data buffer did not match the declared grid size.
    #[error("dimension mismatch: expected {expected} cells for a {nx}x{ny} grid, got {got}")]
    DimensionMismatch {
        nx: usize,
        ny: usize,
        expected: usize,
        got: usize,
    },

    /// A field vector contained NaN or infinity.
    #[error("non-finite vector at cell ({x}, {y})")]
    NonFiniteVector { x: usize, y: usize },

    /// The normalization magnitude was zero, negative or non-finite.
    #[error("invalid max magnitude: {0}")]
    InvalidMagnitude(f64),

    /// A color gradient violated its stop ordering or range rules.
    #[error("invalid gradient: {0}")]
    InvalidGradient(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Writing an output artifact failed.
    #[error("i/o error: {0}")]
    Io(String),
}
