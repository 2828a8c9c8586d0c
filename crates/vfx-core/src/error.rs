//! Error types for vfx-core.
//!
//! Buffer construction and bit-depth checks fail with [`Error`]. These are
//! contract violations: a kernel is never run on a buffer that does not
//! match its declared depth or pixel count.
//!
//! # Usage
//!
//! ```rust
//! use vfx_core::{BitDepth, Error, PixelBuf};
//!
//! let data = [0u8; 6];
//! let err = PixelBuf::u8(&data).unwrap_err();
//! assert!(matches!(err, Error::NotRgba { len: 6 }));
//! ```

use crate::format::BitDepth;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by buffer and bit-depth handling.
#[derive(Debug, Error)]
pub enum Error {
    /// Slice length is not a whole number of RGBA pixels.
    #[error("buffer of {len} channels is not a whole number of RGBA pixels")]
    NotRgba {
        /// Number of channel elements in the slice
        len: usize,
    },

    /// Buffer depth differs from what the evaluator was built for.
    #[error("bit depth mismatch: expected {expected}, found {found}")]
    DepthMismatch {
        /// Depth the evaluator was built for
        expected: BitDepth,
        /// Depth of the buffer passed in
        found: BitDepth,
    },

    /// Source and destination hold a different number of pixels.
    #[error("pixel count mismatch: source has {src}, destination has {dst}")]
    PixelCountMismatch {
        /// Source pixel count
        src: usize,
        /// Destination pixel count
        dst: usize,
    },

    /// Element type cannot carry the requested depth.
    #[error("{depth} cannot be stored in {format} elements")]
    StorageMismatch {
        /// Requested depth
        depth: BitDepth,
        /// Element type name
        format: &'static str,
    },
}
