//! 1D lookup tables.
//!
//! A [`Lut1DOpData`] holds one curve per RGB channel. Alpha is never looked
//! up, only rescaled between the input and output depths.
//!
//! # Evaluation
//!
//! [`Lut1DRenderer::new`] picks one of these kernels:
//!
//! | direction | input depth      | kernel                                       |
//! |-----------|------------------|----------------------------------------------|
//! | forward   | integer or half  | lookup, one table entry per input code       |
//! | forward   | float            | linear interpolation, or half-code pairs     |
//! | inverse   | any              | bisection on the forward curve (`Exact`)     |
//! | inverse   | any              | forward kernel on a resampled LUT (`Fast`)   |
//!
//! Each kernel has a [`HueAdjust::Dw3`] variant that keeps the hue of the
//! input by re-placing the middle channel between the new min and max.
//!
//! An inverse LUT must be finalized first; finalizing flattens reversals so
//! that every curve has a unique inverse.
//!
//! # Example
//!
//! ```rust
//! use vfx_core::{BitDepth, PixelBuf, PixelBufMut};
//! use vfx_ops::lut1d::{Lut1DOpData, Lut1DRenderer};
//! use vfx_ops::CpuOp;
//!
//! let values = [0.1f32, 0.6, 1.1].iter().flat_map(|&v| [v, v, v]).collect();
//! let lut = Lut1DOpData::from_values(values, false, false).unwrap();
//! let op = Lut1DRenderer::new(&lut, BitDepth::F32, BitDepth::F32).unwrap();
//!
//! let src = [0.5f32, 1.0, 2.0, 0.25];
//! let mut dst = [0.0f32; 4];
//! op.apply(PixelBuf::f32(&src).unwrap(), PixelBufMut::f32(&mut dst).unwrap()).unwrap();
//! assert!((dst[0] - 0.6).abs() < 1e-6);
//! assert_eq!(&dst[1..], &[1.1, 1.1, 0.25]);
//!
//! // and back
//! let inv = Lut1DRenderer::new(&lut.inverse().finalize().unwrap(), BitDepth::F32, BitDepth::F32).unwrap();
//! let mut back = [0.0f32; 4];
//! inv.apply(PixelBuf::f32(&dst).unwrap(), PixelBufMut::f32(&mut back).unwrap()).unwrap();
//! assert!((back[0] - 0.5).abs() < 1e-6);
//! ```

mod compose;
mod data;
mod forward;
mod inverse;

pub use compose::{compose, make_fast_from_inverse, ComposeMethod};
pub use data::{
    ComponentProperties, HueAdjust, InversionQuality, Lut1DOpData, HALF_DOMAIN_LENGTH, MAX_LENGTH,
};
pub use forward::ForwardRenderer;
pub use inverse::InverseRenderer;

use tracing::debug;
use vfx_core::BitDepth;

use crate::op::{CpuOp, Direction};
use crate::OpsResult;

/// Positions of (max, mid, min) for each outcome of the three pairwise
/// comparisons. Any NaN lands on (2, 1, 0).
const ORDER3: [usize; 12] = [2, 1, 0, 2, 1, 0, 2, 1, 2, 0, 1, 2];

/// Indices of the largest, middle and smallest of three values.
#[inline]
pub(crate) fn order3(rgb: &[f32; 3]) -> (usize, usize, usize) {
    let val = (rgb[0] > rgb[1]) as i32 * 5 + (rgb[1] > rgb[2]) as i32 * 4
        - (rgb[0] > rgb[2]) as i32 * 3
        + 3;
    let i = val as usize;
    (ORDER3[i], ORDER3[i + 1], ORDER3[i + 2])
}

#[derive(Debug, Clone)]
enum Kernel {
    Forward(ForwardRenderer),
    Inverse(InverseRenderer),
}

/// CPU evaluator for a 1D LUT.
#[derive(Debug, Clone)]
pub struct Lut1DRenderer {
    kernel: Kernel,
    in_depth: BitDepth,
    out_depth: BitDepth,
}

impl Lut1DRenderer {
    /// Builds the evaluator for `in_depth` to `out_depth`.
    ///
    /// An inverse LUT with [`InversionQuality::Fast`] is resampled onto a
    /// forward LUT here. Any other inverse LUT must have been finalized.
    pub fn new(data: &Lut1DOpData, in_depth: BitDepth, out_depth: BitDepth) -> OpsResult<Self> {
        if data.direction() == Direction::Inverse && data.inversion_quality() == InversionQuality::Fast {
            let fast = make_fast_from_inverse(data)?;
            let r = Self::exact(&fast, in_depth, out_depth)?;
            debug!(
                ?in_depth,
                ?out_depth,
                length = data.length(),
                fast_length = fast.length(),
                kernel = r.kind(),
                "LUT1D fast inverse renderer built"
            );
            return Ok(r);
        }
        let r = Self::exact(data, in_depth, out_depth)?;
        debug!(?in_depth, ?out_depth, length = data.length(), kernel = r.kind(), "LUT1D renderer built");
        Ok(r)
    }

    /// Same as [`new`](Self::new) but inverse LUTs always use bisection.
    pub(crate) fn exact(data: &Lut1DOpData, in_depth: BitDepth, out_depth: BitDepth) -> OpsResult<Self> {
        let kernel = match data.direction() {
            Direction::Forward => Kernel::Forward(ForwardRenderer::new(data, in_depth, out_depth)?),
            Direction::Inverse => Kernel::Inverse(InverseRenderer::new(data, in_depth, out_depth)?),
        };
        Ok(Self { kernel, in_depth, out_depth })
    }

    /// Name of the selected kernel.
    pub fn kind(&self) -> &'static str {
        match &self.kernel {
            Kernel::Forward(f) => f.kind(),
            Kernel::Inverse(i) => i.kind(),
        }
    }
}

impl CpuOp for Lut1DRenderer {
    fn name(&self) -> &'static str {
        "lut1d"
    }

    fn input_depth(&self) -> BitDepth {
        self.in_depth
    }

    fn output_depth(&self) -> BitDepth {
        self.out_depth
    }

    fn process(&self, block: &mut [[f32; 4]]) {
        match &self.kernel {
            Kernel::Forward(f) => f.process(block),
            Kernel::Inverse(i) => i.process(block),
        }
    }
}
