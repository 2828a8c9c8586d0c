//! Channel element types and the saturating store.
//!
//! Pixel buffers hold one of four element types: `u8`, `u16` (which also
//! carries right-justified 10 and 12-bit codes), [`f16`] and `f32`. The
//! [`Channel`] trait converts between the raw element and `f32` without any
//! normalisation; scaling by [`BitDepth::range`](crate::BitDepth::range) is
//! the caller's job.
//!
//! # Storing
//!
//! [`Channel::store`] is the saturating cast used by every evaluator when it
//! writes a result:
//!
//! - integer targets clamp to `[0, range]`, round half to even, and map NaN to 0
//! - `f16` uses IEEE round-to-nearest-even
//! - `f32` is the identity
//!
//! ```rust
//! use vfx_core::pixel::Channel;
//!
//! assert_eq!(u8::store(254.5, 255.0), 254);
//! assert_eq!(u8::store(255.5, 255.0), 255);
//! assert_eq!(u8::store(f32::NAN, 255.0), 0);
//! assert_eq!(u16::store(2000.0, 1023.0), 1023);
//! ```

use crate::format::DataFormat;
use half::f16;

/// A channel element type.
pub trait Channel: Copy + Default + Send + Sync + 'static {
    /// In-memory format of this element.
    const FORMAT: DataFormat;

    /// Raw value as `f32` (no normalisation).
    fn to_f32(self) -> f32;

    /// Saturating conversion from `f32`; `range` is the nominal maximum of
    /// the target depth and only matters for integer elements.
    fn store(v: f32, range: f32) -> Self;

    /// Index of this element in a per-code lookup table, clamped to `max`.
    ///
    /// `f16` uses its bit pattern. `f32` has no code and maps to 0.
    fn code(self, max: usize) -> usize;
}

/// Clamp to `[0, range]`, round half to even, NaN to 0.
#[inline]
pub fn saturate(v: f32, range: f32) -> f32 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, range).round_ties_even()
}

impl Channel for u8 {
    const FORMAT: DataFormat = DataFormat::U8;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn store(v: f32, range: f32) -> Self {
        saturate(v, range.min(255.0)) as u8
    }

    #[inline]
    fn code(self, max: usize) -> usize {
        (self as usize).min(max)
    }
}

impl Channel for u16 {
    const FORMAT: DataFormat = DataFormat::U16;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn store(v: f32, range: f32) -> Self {
        saturate(v, range.min(65535.0)) as u16
    }

    #[inline]
    fn code(self, max: usize) -> usize {
        (self as usize).min(max)
    }
}

impl Channel for f16 {
    const FORMAT: DataFormat = DataFormat::F16;

    #[inline]
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    #[inline]
    fn store(v: f32, _range: f32) -> Self {
        f16::from_f32(v)
    }

    #[inline]
    fn code(self, max: usize) -> usize {
        (self.to_bits() as usize).min(max)
    }
}

impl Channel for f32 {
    const FORMAT: DataFormat = DataFormat::F32;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn store(v: f32, _range: f32) -> Self {
        v
    }

    #[inline]
    fn code(self, _max: usize) -> usize {
        0
    }
}

/// Half-float helpers for 16-bit code arithmetic.
pub mod half_bits {
    use half::f16;

    /// Number of half codes.
    pub const HALF_CODES: usize = 65536;
    /// Code of `+HALF_MAX` (65504), the last finite positive half.
    pub const POS_HALF_MAX: u16 = 0x7BFF;
    /// Code of `+Inf`.
    pub const POS_INF: u16 = 0x7C00;
    /// Code of `-0`.
    pub const NEG_ZERO: u16 = 0x8000;
    /// Code of `-HALF_MAX`.
    pub const NEG_HALF_MAX: u16 = 0xFBFF;
    /// Code of `-Inf`.
    pub const NEG_INF: u16 = 0xFC00;
    /// Code of `1.0`.
    pub const ONE: u16 = 0x3C00;
    /// Largest finite half value.
    pub const HALF_MAX: f32 = 65504.0;

    /// Value of a half code as `f32`.
    #[inline]
    pub fn value(code: u16) -> f32 {
        f16::from_bits(code).to_f32()
    }

    /// Half code nearest to `v` (IEEE round-to-nearest-even).
    #[inline]
    pub fn code(v: f32) -> u16 {
        f16::from_f32(v).to_bits()
    }

    /// Whether a code is NaN.
    #[inline]
    pub fn is_nan(code: u16) -> bool {
        f16::from_bits(code).is_nan()
    }
}
