//! Packed RGBA pixel buffers.
//!
//! A buffer is a borrowed slice of channel elements in RGBA order, tagged
//! with its [`BitDepth`]. Alpha is always the fourth channel. Evaluators take
//! a [`PixelBuf`] as source and a [`PixelBufMut`] as destination, or a single
//! [`PixelBufMut`] for in-place application.
//!
//! ```rust
//! use vfx_core::{BitDepth, PixelBuf, PixelBufMut};
//!
//! let src = [0.1f32, 0.2, 0.3, 1.0, 0.4, 0.5, 0.6, 1.0];
//! let buf = PixelBuf::f32(&src).unwrap();
//! assert_eq!(buf.num_pixels(), 2);
//! assert_eq!(buf.depth(), BitDepth::F32);
//!
//! let mut codes = [0u16; 4];
//! let out = PixelBufMut::u10(&mut codes).unwrap();
//! assert_eq!(out.depth(), BitDepth::U10);
//! ```

use crate::error::{Error, Result};
use crate::format::{BitDepth, DataFormat};
use half::f16;

/// Borrowed channel data, one variant per element type.
#[derive(Debug, Clone, Copy)]
pub enum PixelData<'a> {
    /// 8-bit codes.
    U8(&'a [u8]),
    /// 10, 12 or 16-bit codes.
    U16(&'a [u16]),
    /// Half floats.
    F16(&'a [f16]),
    /// Single floats.
    F32(&'a [f32]),
}

/// Mutably borrowed channel data.
#[derive(Debug)]
pub enum PixelDataMut<'a> {
    /// 8-bit codes.
    U8(&'a mut [u8]),
    /// 10, 12 or 16-bit codes.
    U16(&'a mut [u16]),
    /// Half floats.
    F16(&'a mut [f16]),
    /// Single floats.
    F32(&'a mut [f32]),
}

#[inline]
fn check_rgba(len: usize) -> Result<()> {
    if len % 4 != 0 {
        return Err(Error::NotRgba { len });
    }
    Ok(())
}

fn check_u16_depth(depth: BitDepth) -> Result<()> {
    if depth.storage_format() != DataFormat::U16 {
        return Err(Error::StorageMismatch {
            depth,
            format: DataFormat::U16.name(),
        });
    }
    Ok(())
}

/// Read-only RGBA buffer.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuf<'a> {
    depth: BitDepth,
    data: PixelData<'a>,
}

impl<'a> PixelBuf<'a> {
    /// 8-bit buffer.
    pub fn u8(data: &'a [u8]) -> Result<Self> {
        check_rgba(data.len())?;
        Ok(Self { depth: BitDepth::U8, data: PixelData::U8(data) })
    }

    /// 10-bit buffer (codes right-justified in `u16`).
    pub fn u10(data: &'a [u16]) -> Result<Self> {
        Self::with_u16(BitDepth::U10, data)
    }

    /// 12-bit buffer (codes right-justified in `u16`).
    pub fn u12(data: &'a [u16]) -> Result<Self> {
        Self::with_u16(BitDepth::U12, data)
    }

    /// 16-bit buffer.
    pub fn u16(data: &'a [u16]) -> Result<Self> {
        Self::with_u16(BitDepth::U16, data)
    }

    /// `u16`-backed buffer of the given integer depth.
    pub fn with_u16(depth: BitDepth, data: &'a [u16]) -> Result<Self> {
        check_u16_depth(depth)?;
        check_rgba(data.len())?;
        Ok(Self { depth, data: PixelData::U16(data) })
    }

    /// Half float buffer.
    pub fn f16(data: &'a [f16]) -> Result<Self> {
        check_rgba(data.len())?;
        Ok(Self { depth: BitDepth::F16, data: PixelData::F16(data) })
    }

    /// Float buffer.
    pub fn f32(data: &'a [f32]) -> Result<Self> {
        check_rgba(data.len())?;
        Ok(Self { depth: BitDepth::F32, data: PixelData::F32(data) })
    }

    /// Bit depth of the channels.
    #[inline]
    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    /// Underlying typed slice.
    #[inline]
    pub fn data(&self) -> PixelData<'a> {
        self.data
    }

    /// Number of channel elements.
    pub fn len(&self) -> usize {
        match self.data {
            PixelData::U8(d) => d.len(),
            PixelData::U16(d) => d.len(),
            PixelData::F16(d) => d.len(),
            PixelData::F32(d) => d.len(),
        }
    }

    /// Whether the buffer holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of RGBA pixels.
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.len() / 4
    }
}

/// Mutable RGBA buffer.
#[derive(Debug)]
pub struct PixelBufMut<'a> {
    depth: BitDepth,
    data: PixelDataMut<'a>,
}

impl<'a> PixelBufMut<'a> {
    /// 8-bit buffer.
    pub fn u8(data: &'a mut [u8]) -> Result<Self> {
        check_rgba(data.len())?;
        Ok(Self { depth: BitDepth::U8, data: PixelDataMut::U8(data) })
    }

    /// 10-bit buffer (codes right-justified in `u16`).
    pub fn u10(data: &'a mut [u16]) -> Result<Self> {
        Self::with_u16(BitDepth::U10, data)
    }

    /// 12-bit buffer (codes right-justified in `u16`).
    pub fn u12(data: &'a mut [u16]) -> Result<Self> {
        Self::with_u16(BitDepth::U12, data)
    }

    /// 16-bit buffer.
    pub fn u16(data: &'a mut [u16]) -> Result<Self> {
        Self::with_u16(BitDepth::U16, data)
    }

    /// `u16`-backed buffer of the given integer depth.
    pub fn with_u16(depth: BitDepth, data: &'a mut [u16]) -> Result<Self> {
        check_u16_depth(depth)?;
        check_rgba(data.len())?;
        Ok(Self { depth, data: PixelDataMut::U16(data) })
    }

    /// Half float buffer.
    pub fn f16(data: &'a mut [f16]) -> Result<Self> {
        check_rgba(data.len())?;
        Ok(Self { depth: BitDepth::F16, data: PixelDataMut::F16(data) })
    }

    /// Float buffer.
    pub fn f32(data: &'a mut [f32]) -> Result<Self> {
        check_rgba(data.len())?;
        Ok(Self { depth: BitDepth::F32, data: PixelDataMut::F32(data) })
    }

    /// Bit depth of the channels.
    #[inline]
    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    /// Underlying typed slice.
    #[inline]
    pub fn data_mut(&mut self) -> &mut PixelDataMut<'a> {
        &mut self.data
    }

    /// Consumes the buffer, returning the typed slice.
    #[inline]
    pub fn into_data(self) -> PixelDataMut<'a> {
        self.data
    }

    /// Number of channel elements.
    pub fn len(&self) -> usize {
        match &self.data {
            PixelDataMut::U8(d) => d.len(),
            PixelDataMut::U16(d) => d.len(),
            PixelDataMut::F16(d) => d.len(),
            PixelDataMut::F32(d) => d.len(),
        }
    }

    /// Whether the buffer holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of RGBA pixels.
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.len() / 4
    }

    /// Reborrows as a shorter-lived mutable buffer.
    pub fn reborrow(&mut self) -> PixelBufMut<'_> {
        let data = match &mut self.data {
            PixelDataMut::U8(d) => PixelDataMut::U8(&mut **d),
            PixelDataMut::U16(d) => PixelDataMut::U16(&mut **d),
            PixelDataMut::F16(d) => PixelDataMut::F16(&mut **d),
            PixelDataMut::F32(d) => PixelDataMut::F32(&mut **d),
        };
        PixelBufMut { depth: self.depth, data }
    }

    /// Read-only view of the current contents.
    pub fn as_buf(&self) -> PixelBuf<'_> {
        let data = match &self.data {
            PixelDataMut::U8(d) => PixelData::U8(&**d),
            PixelDataMut::U16(d) => PixelData::U16(&**d),
            PixelDataMut::F16(d) => PixelData::F16(&**d),
            PixelDataMut::F32(d) => PixelData::F32(&**d),
        };
        PixelBuf { depth: self.depth, data }
    }

    /// Splits into consecutive buffers of at most `tile_pixels` pixels.
    pub fn into_tiles(self, tile_pixels: usize) -> Vec<PixelBufMut<'a>> {
        let step = tile_pixels.max(1) * 4;
        let depth = self.depth;
        match self.data {
            PixelDataMut::U8(d) => d
                .chunks_mut(step)
                .map(|c| PixelBufMut { depth, data: PixelDataMut::U8(c) })
                .collect(),
            PixelDataMut::U16(d) => d
                .chunks_mut(step)
                .map(|c| PixelBufMut { depth, data: PixelDataMut::U16(c) })
                .collect(),
            PixelDataMut::F16(d) => d
                .chunks_mut(step)
                .map(|c| PixelBufMut { depth, data: PixelDataMut::F16(c) })
                .collect(),
            PixelDataMut::F32(d) => d
                .chunks_mut(step)
                .map(|c| PixelBufMut { depth, data: PixelDataMut::F32(c) })
                .collect(),
        }
    }
}
