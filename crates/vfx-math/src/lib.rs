//! # vfx-math
//!
//! Math utilities for pixel-processing kernels.
//!
//! - [`sse_math`] - fast `log2`, `exp2`, `pow`, `atan`, `atan2`, `cos`, `sin`,
//!   `sincos` on packed 4-lane floats, with a scalar fallback
//! - [`simd`] - portable [`wide`] helpers: lane-wise scale/offset and the
//!   column-register 4x4 matrix
//! - [`primaries`] - chromaticities and RGB/XYZ matrices in double precision
//!
//! # Design
//!
//! All matrix operations assume **row-major** storage and **column vectors**:
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - double precision 3x3/4x4 matrices
//! - [`wide`] - portable SIMD on stable Rust
//!
//! # Used By
//!
//! - `vfx-color` - ACES 2 appearance model
//! - `vfx-ops` - matrix, log, LUT and fixed-function kernels

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod primaries;
pub mod simd;
pub mod sse_math;

pub use primaries::Primaries;

/// Re-export glam types for direct use
pub mod glam {
    pub use ::glam::{DMat3, DMat4, DVec3, DVec4};
}
