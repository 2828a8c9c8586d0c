//! Tiled multi-threaded evaluation using Rayon.
//!
//! Every evaluator is stateless once built, so a buffer can be cut into
//! tiles of whole pixels and each tile run on its own worker. The result
//! is identical to [`CpuOp::apply_in_place`].
//!
//! # Example
//!
//! ```rust
//! use vfx_core::{BitDepth, PixelBufMut};
//! use vfx_ops::matrix::{MatrixOpData, MatrixRenderer};
//! use vfx_ops::parallel;
//!
//! let data = MatrixOpData::from_diagonal([0.5, 0.5, 0.5, 1.0]);
//! let op = MatrixRenderer::new(&data, BitDepth::F32, BitDepth::F32).unwrap();
//!
//! let mut pixels = vec![1.0f32; 1920 * 4];
//! parallel::apply_tiled(&op, PixelBufMut::f32(&mut pixels).unwrap(), 256).unwrap();
//! assert_eq!(pixels[0], 0.5);
//! ```

use rayon::prelude::*;
use tracing::trace;
use vfx_core::PixelBufMut;

use crate::op::{check_in_place, process_in_place, CpuOp};
use crate::{OpsError, OpsResult};

/// Default tile size in pixels.
pub const DEFAULT_TILE_PIXELS: usize = 4096;

/// Evaluates `op` in place, one tile of `tile_pixels` pixels per task.
///
/// The buffer contract is the same as for [`CpuOp::apply_in_place`].
pub fn apply_tiled<K: CpuOp + ?Sized>(
    op: &K,
    buf: PixelBufMut<'_>,
    tile_pixels: usize,
) -> OpsResult<()> {
    if tile_pixels == 0 {
        return Err(OpsError::InvalidDimensions("tile size must be > 0".into()));
    }
    let range = check_in_place(op, &buf)?;
    trace!(
        op = op.name(),
        pixels = buf.num_pixels(),
        tile_pixels,
        "apply tiled"
    );

    buf.into_tiles(tile_pixels)
        .into_par_iter()
        .for_each(|tile| process_in_place(op, tile, range));
    Ok(())
}
