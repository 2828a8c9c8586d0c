//! Error types for operator construction and evaluation.
//!
//! Op data is checked once, when an evaluator is built. After that `apply`
//! only fails on buffer contract violations (wrong depth, pixel counts that
//! differ), which arrive wrapped in [`OpsError::Core`].

use thiserror::Error;

/// Error type for operator construction and evaluation.
#[derive(Error, Debug)]
pub enum OpsError {
    /// A length or size is out of range.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Two inputs that must agree in size do not.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// LUT contents or flags are inconsistent.
    #[error("invalid LUT: {0}")]
    InvalidLut(String),

    /// An inverse direction reached an evaluator without being resolved.
    #[error("{0}: finalize was not called before evaluation")]
    FinalizeNotCalled(&'static str),

    /// Operation not supported for this depth or direction.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Shader text cannot be produced for the requested target.
    #[error("shader emission: {0}")]
    Shader(String),

    /// Buffer contract violation.
    #[error(transparent)]
    Core(#[from] vfx_core::Error),

    /// ACES 2 parameter error.
    #[error("color model: {0}")]
    Color(#[from] vfx_color::ColorError),
}

/// Result type for operator construction and evaluation.
pub type OpsResult<T> = Result<T, OpsError>;
