//! Evaluator contract and the bit-depth pipeline.
//!
//! Every evaluator implements [`CpuOp`]. The trait's provided `apply`
//! methods take care of the typed buffers: pixels are loaded block by block
//! into a stack scratch of `[f32; 4]`, handed to [`CpuOp::process`], and
//! written back with the saturating store of the output depth.
//!
//! ```text
//! u8/u16/f16/f32 --load--> [f32; 4] x BLOCK --process--> --store(range(out))--> u8/u16/f16/f32
//! ```
//!
//! Loading does not normalise: an evaluator sees raw codes (0..=1023 for a
//! 10-bit buffer) and decides how to use them. Most evaluators scale with a
//! [`DepthScale`]; the LUT lookup path indexes its tables with the code.
//!
//! Because a whole block is read before any of it is written, in-place
//! evaluation gives the same result as evaluation into a separate buffer.
//!
//! # Example
//!
//! ```rust
//! use vfx_core::{BitDepth, PixelBuf, PixelBufMut};
//! use vfx_ops::matrix::{MatrixOpData, MatrixRenderer};
//! use vfx_ops::CpuOp;
//!
//! let data = MatrixOpData::scale_offset([2.0, 3.0, 4.0, 1.0], [0.1, 0.2, 0.3, 0.0]);
//! let op = MatrixRenderer::new(&data, BitDepth::F32, BitDepth::F32).unwrap();
//!
//! let src = [0.5f32, 0.5, 0.5, 1.0];
//! let mut dst = [0.0f32; 4];
//! op.apply(PixelBuf::f32(&src).unwrap(), PixelBufMut::f32(&mut dst).unwrap()).unwrap();
//! assert!((dst[0] - 1.1).abs() < 1e-6);
//! ```

use tracing::trace;
use vfx_core::{BitDepth, Channel, PixelBuf, PixelBufMut, PixelData, PixelDataMut};

use crate::{OpsError, OpsResult};

/// Pixels per scratch block.
pub const BLOCK_PIXELS: usize = 128;

// ============================================================================
// Direction
// ============================================================================

/// Direction of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Apply the operator as described.
    #[default]
    Forward,
    /// Apply the inverse of the operator.
    Inverse,
}

impl Direction {
    /// The opposite direction.
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            Self::Forward => Self::Inverse,
            Self::Inverse => Self::Forward,
        }
    }

    /// Whether this is [`Direction::Forward`].
    #[inline]
    pub fn is_forward(self) -> bool {
        self == Self::Forward
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Inverse => write!(f, "inverse"),
        }
    }
}

// ============================================================================
// CpuOp
// ============================================================================

/// A fully parameterised CPU evaluator.
///
/// Evaluators are built once from op data for a fixed input and output
/// depth. From then on they are immutable, so one instance can be shared
/// by any number of threads.
pub trait CpuOp: Send + Sync {
    /// Short name used in log records.
    fn name(&self) -> &'static str;

    /// Depth of the buffers this evaluator reads.
    fn input_depth(&self) -> BitDepth;

    /// Depth of the buffers this evaluator writes.
    fn output_depth(&self) -> BitDepth;

    /// Evaluates a block of pixels in place.
    ///
    /// On entry the channels hold raw values of the input depth. On return
    /// they hold values scaled to the output depth, ready for the
    /// saturating store.
    fn process(&self, block: &mut [[f32; 4]]);

    /// Evaluates `src` into `dst`.
    fn apply(&self, src: PixelBuf<'_>, dst: PixelBufMut<'_>) -> OpsResult<()> {
        apply_op(self, src, dst)
    }

    /// Evaluates `buf` in place.
    ///
    /// The buffer must have the input depth, and the output depth must share
    /// its element type.
    fn apply_in_place(&self, buf: PixelBufMut<'_>) -> OpsResult<()> {
        apply_op_in_place(self, buf)
    }
}

/// Scaling between raw channel values and nominal `[0, 1]` values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthScale {
    /// `1 / range(in)`
    pub input: f32,
    /// `range(out)`
    pub output: f32,
}

impl DepthScale {
    /// Scale for an input/output depth pair.
    pub fn new(in_depth: BitDepth, out_depth: BitDepth) -> Self {
        Self {
            input: 1.0 / in_depth.range(),
            output: out_depth.range(),
        }
    }

    /// Raw input values to nominal values, all four channels.
    #[inline]
    pub fn normalize(&self, block: &mut [[f32; 4]]) {
        if self.input != 1.0 {
            scale_block(block, self.input);
        }
    }

    /// Nominal values to the output scale, all four channels.
    #[inline]
    pub fn denormalize(&self, block: &mut [[f32; 4]]) {
        if self.output != 1.0 {
            scale_block(block, self.output);
        }
    }

    /// Factor that carries a raw input value straight to the output scale.
    #[inline]
    pub fn passthrough(&self) -> f32 {
        self.input * self.output
    }
}

#[inline]
fn scale_block(block: &mut [[f32; 4]], s: f32) {
    for px in block.iter_mut() {
        for c in px.iter_mut() {
            *c *= s;
        }
    }
}

// ============================================================================
// Typed Dispatch
// ============================================================================

fn check_depth(expected: BitDepth, found: BitDepth) -> OpsResult<()> {
    if expected != found {
        return Err(vfx_core::Error::DepthMismatch { expected, found }.into());
    }
    Ok(())
}

#[inline]
fn load<I: Channel>(src: &[I], block: &mut [[f32; 4]]) {
    for (px, c) in block.iter_mut().zip(src.chunks_exact(4)) {
        *px = [c[0].to_f32(), c[1].to_f32(), c[2].to_f32(), c[3].to_f32()];
    }
}

#[inline]
fn store<O: Channel>(block: &[[f32; 4]], dst: &mut [O], range: f32) {
    for (px, c) in block.iter().zip(dst.chunks_exact_mut(4)) {
        c[0] = O::store(px[0], range);
        c[1] = O::store(px[1], range);
        c[2] = O::store(px[2], range);
        c[3] = O::store(px[3], range);
    }
}

fn run_blocks<K, I, O>(op: &K, src: &[I], dst: &mut [O], range: f32)
where
    K: CpuOp + ?Sized,
    I: Channel,
    O: Channel,
{
    let mut scratch = [[0.0f32; 4]; BLOCK_PIXELS];
    for (s, d) in src.chunks(BLOCK_PIXELS * 4).zip(dst.chunks_mut(BLOCK_PIXELS * 4)) {
        let block = &mut scratch[..s.len() / 4];
        load(s, block);
        op.process(block);
        store(block, d, range);
    }
}

fn run_blocks_in_place<K, T>(op: &K, buf: &mut [T], range: f32)
where
    K: CpuOp + ?Sized,
    T: Channel,
{
    let mut scratch = [[0.0f32; 4]; BLOCK_PIXELS];
    for chunk in buf.chunks_mut(BLOCK_PIXELS * 4) {
        let block = &mut scratch[..chunk.len() / 4];
        load(chunk, block);
        op.process(block);
        store(block, chunk, range);
    }
}

macro_rules! run_into {
    ($op:expr, $src:expr, $dst:expr, $range:expr) => {
        match $dst {
            PixelDataMut::U8(d) => run_blocks($op, $src, d, $range),
            PixelDataMut::U16(d) => run_blocks($op, $src, d, $range),
            PixelDataMut::F16(d) => run_blocks($op, $src, d, $range),
            PixelDataMut::F32(d) => run_blocks($op, $src, d, $range),
        }
    };
}

/// Checks the buffers against `op` and evaluates `src` into `dst`.
pub fn apply_op<K: CpuOp + ?Sized>(op: &K, src: PixelBuf<'_>, dst: PixelBufMut<'_>) -> OpsResult<()> {
    check_depth(op.input_depth(), src.depth())?;
    check_depth(op.output_depth(), dst.depth())?;
    if src.num_pixels() != dst.num_pixels() {
        return Err(vfx_core::Error::PixelCountMismatch {
            src: src.num_pixels(),
            dst: dst.num_pixels(),
        }
        .into());
    }
    trace!(op = op.name(), pixels = src.num_pixels(), "apply");

    let range = op.output_depth().range();
    let dst = dst.into_data();
    match src.data() {
        PixelData::U8(s) => run_into!(op, s, dst, range),
        PixelData::U16(s) => run_into!(op, s, dst, range),
        PixelData::F16(s) => run_into!(op, s, dst, range),
        PixelData::F32(s) => run_into!(op, s, dst, range),
    }
    Ok(())
}

/// Checks that `op` can run in place on `buf`. Returns the output range.
pub(crate) fn check_in_place<K: CpuOp + ?Sized>(op: &K, buf: &PixelBufMut<'_>) -> OpsResult<f32> {
    check_depth(op.input_depth(), buf.depth())?;
    let (in_depth, out_depth) = (op.input_depth(), op.output_depth());
    if in_depth.storage_format() != out_depth.storage_format() {
        return Err(OpsError::Unsupported(format!(
            "in-place evaluation from {in_depth} to {out_depth} changes the element type"
        )));
    }
    Ok(out_depth.range())
}

/// Checks the buffer against `op` and evaluates it in place.
pub fn apply_op_in_place<K: CpuOp + ?Sized>(op: &K, buf: PixelBufMut<'_>) -> OpsResult<()> {
    let range = check_in_place(op, &buf)?;
    trace!(op = op.name(), pixels = buf.num_pixels(), "apply in place");

    process_in_place(op, buf, range);
    Ok(())
}

/// Runs `op` over an already checked buffer.
pub(crate) fn process_in_place<K: CpuOp + ?Sized>(op: &K, buf: PixelBufMut<'_>, range: f32) {
    match buf.into_data() {
        PixelDataMut::U8(d) => run_blocks_in_place(op, d, range),
        PixelDataMut::U16(d) => run_blocks_in_place(op, d, range),
        PixelDataMut::F16(d) => run_blocks_in_place(op, d, range),
        PixelDataMut::F32(d) => run_blocks_in_place(op, d, range),
    }
}
