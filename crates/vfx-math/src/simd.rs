//! Portable 4-lane helpers on RGBA pixels.
//!
//! Thin wrappers over [`wide::f32x4`] used by the matrix and curve kernels.
//! One pixel is one register: lanes are R, G, B, A.
//!
//! # Example
//!
//! ```rust
//! use vfx_math::simd::{Mat4Cols, scale_offset_x4};
//!
//! let out = scale_offset_x4([0.5; 4], [2.0, 3.0, 4.0, 1.0], [0.1, 0.2, 0.3, 0.0]);
//! assert!((out[0] - 1.1).abs() < 1e-6);
//!
//! let m = Mat4Cols::from_rows(&[
//!     [1.0, 0.0, 0.0, 0.0],
//!     [0.0, 2.0, 0.0, 0.0],
//!     [0.0, 0.0, 3.0, 0.0],
//!     [0.0, 0.0, 0.0, 1.0],
//! ]);
//! assert_eq!(m.apply([1.0, 1.0, 1.0, 0.5]), [1.0, 2.0, 3.0, 0.5]);
//! ```

use wide::f32x4;

/// `out = in * scale`, lane-wise.
#[inline]
pub fn scale_x4(px: [f32; 4], scale: [f32; 4]) -> [f32; 4] {
    (f32x4::from(px) * f32x4::from(scale)).to_array()
}

/// `out = in * scale + offset`, lane-wise.
#[inline]
pub fn scale_offset_x4(px: [f32; 4], scale: [f32; 4], offset: [f32; 4]) -> [f32; 4] {
    (f32x4::from(px) * f32x4::from(scale) + f32x4::from(offset)).to_array()
}

/// Clamps every lane to `[lo, hi]`.
#[inline]
pub fn clamp_x4(px: [f32; 4], lo: f32, hi: f32) -> [f32; 4] {
    f32x4::from(px).max(f32x4::splat(lo)).min(f32x4::splat(hi)).to_array()
}

/// 4x4 matrix held as four column registers.
///
/// A pixel is multiplied by broadcasting each input lane against its
/// column and accumulating: `out = c0*R + c1*G + c2*B + c3*A`.
#[derive(Debug, Clone, Copy)]
pub struct Mat4Cols {
    cols: [f32x4; 4],
}

impl Mat4Cols {
    /// Builds from a row-major 4x4 matrix.
    pub fn from_rows(m: &[[f32; 4]; 4]) -> Self {
        let col = |c: usize| f32x4::from([m[0][c], m[1][c], m[2][c], m[3][c]]);
        Self {
            cols: [col(0), col(1), col(2), col(3)],
        }
    }

    /// `M * px`.
    #[inline]
    pub fn apply(&self, px: [f32; 4]) -> [f32; 4] {
        self.apply_reg(px).to_array()
    }

    /// `M * px + offset`.
    #[inline]
    pub fn apply_offset(&self, px: [f32; 4], offset: [f32; 4]) -> [f32; 4] {
        (self.apply_reg(px) + f32x4::from(offset)).to_array()
    }

    #[inline]
    fn apply_reg(&self, px: [f32; 4]) -> f32x4 {
        self.cols[0] * f32x4::splat(px[0])
            + self.cols[1] * f32x4::splat(px[1])
            + self.cols[2] * f32x4::splat(px[2])
            + self.cols[3] * f32x4::splat(px[3])
    }
}
