//! # vfx-core
//!
//! Core types for bit-depth polymorphic pixel processing.
//!
//! This crate provides the foundational types used by the other vfx crates:
//!
//! - [`BitDepth`] - Channel depth registry: `range`, `is_float`, storage type
//! - [`Channel`] - Element trait for `u8`, `u16`, `f16`, `f32` with the saturating store
//! - [`PixelBuf`], [`PixelBufMut`] - Packed RGBA buffers tagged with their depth
//! - [`Error`] - Buffer contract violations
//!
//! ## Crate Structure
//!
//! ```text
//! vfx-core (this crate)
//!    ^
//!    |
//!    +-- vfx-ops (matrix, log, LUT1D and fixed-function evaluators)
//!    +-- vfx-bench
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod error;
pub mod format;
pub mod pixel;

// Re-exports for convenience
pub use buffer::*;
pub use error::*;
pub use format::*;
pub use pixel::{saturate, Channel};

/// Half float type used by `F16` buffers.
pub use half::f16;

/// Prelude module for convenient imports.
///
/// ```
/// use vfx_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::{PixelBuf, PixelBufMut, PixelData, PixelDataMut};
    pub use crate::error::{Error, Result};
    pub use crate::format::{BitDepth, DataFormat};
    pub use crate::pixel::Channel;
    pub use half::f16;
}
