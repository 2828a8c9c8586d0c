//! Error types for the ACES 2 building blocks.
//!
//! Parameter tables are built once from a peak luminance and a pair of
//! primaries. Anything that would make those tables meaningless is rejected
//! up front with a [`ColorError`]; per-pixel math never fails.

use thiserror::Error;

/// Color model construction error.
#[derive(Debug, Error)]
pub enum ColorError {
    /// Peak luminance is not finite or outside the supported range.
    #[error("peak luminance {value} is outside [{min}, {max}]")]
    PeakLuminance {
        /// Requested peak in cd/m²
        value: f32,
        /// Lowest accepted peak
        min: f32,
        /// Highest accepted peak
        max: f32,
    },

    /// Primaries do not span a color space.
    #[error("degenerate primaries: {0}")]
    DegeneratePrimaries(String),

    /// A parameter vector has the wrong length.
    #[error("expected {expected} parameters but {found} found")]
    ParamCount {
        /// Required length
        expected: usize,
        /// Supplied length
        found: usize,
    },
}

/// Result type for color model construction.
pub type ColorResult<T> = Result<T, ColorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = ColorError::PeakLuminance { value: 0.5, min: 1.0, max: 100_000.0 };
        assert_eq!(e.to_string(), "peak luminance 0.5 is outside [1, 100000]");
        let e = ColorError::ParamCount { expected: 9, found: 3 };
        assert_eq!(e.to_string(), "expected 9 parameters but 3 found");
    }
}
