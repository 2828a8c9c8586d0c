//! 4x4 matrix with offsets.
//!
//! `out = M * in + offset` on RGBA. The op data is kept in `f64`; the
//! renderer folds the bit-depth scaling into an `f32` copy and picks the
//! cheapest of four kernels:
//!
//! | kernel        | when                           | per pixel              |
//! |---------------|--------------------------------|------------------------|
//! | `Scale`       | diagonal, no offsets           | `s * in`               |
//! | `ScaleOffset` | diagonal with offsets          | `s * in + o`           |
//! | `Full`        | off-diagonal terms, no offsets | `M * in`               |
//! | `FullOffset`  | off-diagonal terms and offsets | `M * in + o`           |
//!
//! An inverse-direction matrix has to be resolved with
//! [`MatrixOpData::finalize`] before a renderer can be built.
//!
//! # Example
//!
//! ```rust
//! use vfx_core::BitDepth;
//! use vfx_ops::matrix::MatrixOpData;
//! use vfx_ops::Direction;
//!
//! let m = MatrixOpData::from_diagonal([2.0, 4.0, 8.0, 1.0]).with_direction(Direction::Inverse);
//! let fwd = m.finalize().unwrap();
//! assert_eq!(fwd.matrix()[1][1], 0.25);
//! ```

use tracing::debug;
use vfx_core::BitDepth;
use vfx_math::glam::{DMat4, DVec4};
use vfx_math::simd::{scale_offset_x4, scale_x4, Mat4Cols};

use crate::op::{CpuOp, Direction};
use crate::shader::{ShaderBuilder, ShaderText};
use crate::{OpsError, OpsResult};

const IDENTITY: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

// ============================================================================
// Op Data
// ============================================================================

/// Row-major 4x4 matrix, RGBA offsets and a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixOpData {
    m: [[f64; 4]; 4],
    offsets: [f64; 4],
    direction: Direction,
}

impl Default for MatrixOpData {
    fn default() -> Self {
        Self::identity()
    }
}

impl MatrixOpData {
    /// Identity matrix, zero offsets.
    pub fn identity() -> Self {
        Self { m: IDENTITY, offsets: [0.0; 4], direction: Direction::Forward }
    }

    /// Diagonal matrix.
    pub fn from_diagonal(diag: [f64; 4]) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, d) in diag.into_iter().enumerate() {
            m[i][i] = d;
        }
        Self { m, offsets: [0.0; 4], direction: Direction::Forward }
    }

    /// Full matrix given by rows, plus offsets.
    pub fn from_rows_offset(m: [[f64; 4]; 4], offsets: [f64; 4]) -> Self {
        Self { m, offsets, direction: Direction::Forward }
    }

    /// Diagonal scale plus offsets.
    pub fn scale_offset(scale: [f64; 4], offsets: [f64; 4]) -> Self {
        Self { offsets, ..Self::from_diagonal(scale) }
    }

    /// Same data with another direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Rows of the matrix.
    pub fn matrix(&self) -> &[[f64; 4]; 4] {
        &self.m
    }

    /// RGBA offsets.
    pub fn offsets(&self) -> &[f64; 4] {
        &self.offsets
    }

    /// Direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// All off-diagonal entries are zero.
    pub fn is_diagonal(&self) -> bool {
        (0..4).all(|r| (0..4).all(|c| r == c || self.m[r][c] == 0.0))
    }

    /// Any offset is non-zero.
    pub fn has_offsets(&self) -> bool {
        self.offsets.iter().any(|&o| o != 0.0)
    }

    /// Alpha is read into RGB or written from anything but itself.
    pub fn has_alpha(&self) -> bool {
        self.m[3] != [0.0, 0.0, 0.0, 1.0]
            || self.offsets[3] != 0.0
            || (0..3).any(|r| self.m[r][3] != 0.0)
    }

    /// Unit matrix and zero offsets.
    pub fn is_identity(&self) -> bool {
        self.m == IDENTITY && !self.has_offsets()
    }

    /// Leaves every pixel unchanged in either direction.
    pub fn is_no_op(&self) -> bool {
        self.is_identity()
    }

    /// Rejects non-finite entries.
    pub fn validate(&self) -> OpsResult<()> {
        let finite = self.m.iter().flatten().chain(self.offsets.iter()).all(|v| v.is_finite());
        if !finite {
            return Err(OpsError::InvalidParameter("matrix has non-finite entries".into()));
        }
        Ok(())
    }

    fn to_dmat4(&self) -> DMat4 {
        DMat4::from_cols_array_2d(&self.m).transpose()
    }

    fn from_dmat4(m: &DMat4) -> [[f64; 4]; 4] {
        m.transpose().to_cols_array_2d()
    }

    /// Numeric inverse as a forward matrix: `M⁻¹ * (in - offset)`.
    ///
    /// Fails when the matrix is singular.
    pub fn inverse(&self) -> OpsResult<Self> {
        let m = self.to_dmat4();
        let det = m.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return Err(OpsError::InvalidParameter(format!(
                "singular matrix cannot be inverted (determinant {det})"
            )));
        }
        let inv = m.inverse();
        let off = -(inv * DVec4::from_array(self.offsets));
        Ok(Self {
            m: Self::from_dmat4(&inv),
            offsets: off.to_array(),
            direction: Direction::Forward,
        })
    }

    /// Resolves the direction: forward data is returned as is, inverse data
    /// is replaced by its numeric inverse.
    pub fn finalize(&self) -> OpsResult<Self> {
        self.validate()?;
        match self.direction {
            Direction::Forward => Ok(self.clone()),
            Direction::Inverse => self.inverse(),
        }
    }

    /// `other ∘ self`: applies `self`, then `other`.
    pub fn compose(&self, other: &Self) -> OpsResult<Self> {
        if !self.direction.is_forward() || !other.direction.is_forward() {
            return Err(OpsError::FinalizeNotCalled("Matrix"));
        }
        let a = self.to_dmat4();
        let b = other.to_dmat4();
        let off = b * DVec4::from_array(self.offsets) + DVec4::from_array(other.offsets);
        Ok(Self {
            m: Self::from_dmat4(&(b * a)),
            offsets: off.to_array(),
            direction: Direction::Forward,
        })
    }

    /// Emits `outColor = M * outColor + offset` for a forward matrix.
    pub fn emit_shader(&self, builder: &mut dyn ShaderBuilder) -> OpsResult<()> {
        if !self.direction.is_forward() {
            return Err(OpsError::FinalizeNotCalled("Matrix"));
        }
        let lang = builder.language();
        let px = builder.pixel_name().to_string();
        let mut ss = ShaderText::new(lang);
        let o = self.offsets;

        ss.blank();
        ss.line("// Add Matrix processing");
        ss.blank();
        if self.is_diagonal() {
            let d = [self.m[0][0], self.m[1][1], self.m[2][2], self.m[3][3]];
            let mut expr = format!("{px} * {}", ss.float4_const(d[0], d[1], d[2], d[3]));
            if self.has_offsets() {
                expr = format!("{expr} + {}", ss.float4_const(o[0], o[1], o[2], o[3]));
            }
            ss.line(format!("{px} = {expr};"));
        } else {
            let m = self.m.map(|row| row.map(|v| v as f32));
            let mut expr = if lang.is_glsl() || lang == crate::shader::GpuLanguage::Metal {
                // Column-major constructors
                let col = |c: usize| ss.float4_const(m[0][c], m[1][c], m[2][c], m[3][c]);
                let ty = if lang.is_glsl() { "mat4" } else { "float4x4" };
                format!("{ty}({}, {}, {}, {}) * {px}", col(0), col(1), col(2), col(3))
            } else {
                let row = |r: usize| ss.float4_const(m[r][0], m[r][1], m[r][2], m[r][3]);
                format!("mul(float4x4({}, {}, {}, {}), {px})", row(0), row(1), row(2), row(3))
            };
            if self.has_offsets() {
                expr = format!("{expr} + {}", ss.float4_const(o[0], o[1], o[2], o[3]));
            }
            ss.line(format!("{px} = {expr};"));
        }
        builder.add_to_function_code(ss.as_str());
        Ok(())
    }
}

// ============================================================================
// Renderer
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Kernel {
    Scale([f32; 4]),
    ScaleOffset([f32; 4], [f32; 4]),
    Full(Mat4Cols),
    FullOffset(Mat4Cols, [f32; 4]),
}

/// CPU evaluator for a forward matrix.
#[derive(Debug, Clone)]
pub struct MatrixRenderer {
    kernel: Kernel,
    in_depth: BitDepth,
    out_depth: BitDepth,
}

impl MatrixRenderer {
    /// Builds the evaluator for `in_depth` to `out_depth`.
    ///
    /// Fails with [`OpsError::FinalizeNotCalled`] on inverse-direction data.
    pub fn new(data: &MatrixOpData, in_depth: BitDepth, out_depth: BitDepth) -> OpsResult<Self> {
        data.validate()?;
        if !data.direction.is_forward() {
            return Err(OpsError::FinalizeNotCalled("Matrix"));
        }

        let scale = out_depth.range_f64() / in_depth.range_f64();
        let out_range = out_depth.range_f64();
        let m = data.m.map(|row| row.map(|v| (v * scale) as f32));
        let offsets = data.offsets.map(|o| (o * out_range) as f32);
        let diag = [m[0][0], m[1][1], m[2][2], m[3][3]];

        let kernel = match (data.is_diagonal(), data.has_offsets()) {
            (true, false) => Kernel::Scale(diag),
            (true, true) => Kernel::ScaleOffset(diag, offsets),
            (false, false) => Kernel::Full(Mat4Cols::from_rows(&m)),
            (false, true) => Kernel::FullOffset(Mat4Cols::from_rows(&m), offsets),
        };
        debug!(?in_depth, ?out_depth, kernel = kernel.name(), "matrix renderer built");

        Ok(Self { kernel, in_depth, out_depth })
    }
}

impl Kernel {
    fn name(&self) -> &'static str {
        match self {
            Self::Scale(_) => "scale",
            Self::ScaleOffset(..) => "scale_offset",
            Self::Full(_) => "full",
            Self::FullOffset(..) => "full_offset",
        }
    }
}

impl CpuOp for MatrixRenderer {
    fn name(&self) -> &'static str {
        "matrix"
    }

    fn input_depth(&self) -> BitDepth {
        self.in_depth
    }

    fn output_depth(&self) -> BitDepth {
        self.out_depth
    }

    fn process(&self, block: &mut [[f32; 4]]) {
        match &self.kernel {
            Kernel::Scale(s) => {
                for px in block.iter_mut() {
                    *px = scale_x4(*px, *s);
                }
            }
            Kernel::ScaleOffset(s, o) => {
                for px in block.iter_mut() {
                    *px = scale_offset_x4(*px, *s, *o);
                }
            }
            Kernel::Full(m) => {
                for px in block.iter_mut() {
                    *px = m.apply(*px);
                }
            }
            Kernel::FullOffset(m, o) => {
                for px in block.iter_mut() {
                    *px = m.apply_offset(*px, *o);
                }
            }
        }
    }
}
