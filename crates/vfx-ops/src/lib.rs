//! # vfx-ops
//!
//! CPU evaluators and GPU shader emitters for color pipeline operators.
//!
//! Each operator has an op data type that describes it (and can be
//! validated, inverted and compared) and a renderer built from the data
//! for a given pair of input and output bit depths. Renderers implement
//! [`CpuOp`] and most op data types also implement
//! [`shader::ShaderBuilder`].
//!
//! # Modules
//!
//! - [`op`] - Evaluator contract and the bit-depth pipeline
//! - [`matrix`] - 4x4 matrix with offset
//! - [`log_op`] - Log, antilog and camera log curves
//! - [`lut1d`] - 1D LUTs, forward and inverse
//! - [`fixed_function`] - ACES and ACES 2 fixed transforms, colour models, curves
//! - [`shader`] - Shader text and texture descriptors
//! - [`parallel`] - Tiled evaluation on the Rayon pool (feature `parallel`)
//!
//! # Example
//!
//! ```rust
//! use vfx_core::{BitDepth, PixelBuf, PixelBufMut};
//! use vfx_ops::log_op::{LogOpData, LogRenderer};
//! use vfx_ops::CpuOp;
//!
//! let op = LogRenderer::new(&LogOpData::log2(), BitDepth::F32, BitDepth::F32).unwrap();
//!
//! let src = [4.0f32, 8.0, 16.0, 1.0];
//! let mut dst = [0.0f32; 4];
//! op.apply(PixelBuf::f32(&src).unwrap(), PixelBufMut::f32(&mut dst).unwrap()).unwrap();
//! assert!((dst[0] - 2.0).abs() < 1e-4);
//! assert!((dst[2] - 4.0).abs() < 1e-4);
//! ```
//!
//! # Building an inverse
//!
//! Inverse directions are resolved on the op data before a renderer is
//! built. Matrices are inverted by `finalize`; 1D LUT inverses pick their
//! exact or fast path from the op data. A renderer given an unresolved
//! inverse fails with [`OpsError::FinalizeNotCalled`].

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod fixed_function;
pub mod log_op;
pub mod lut1d;
pub mod matrix;
pub mod op;
pub mod shader;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use error::{OpsError, OpsResult};
pub use op::{apply_op, apply_op_in_place, CpuOp, DepthScale, Direction, BLOCK_PIXELS};
