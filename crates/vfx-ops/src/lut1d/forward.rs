//! Forward LUT1D evaluation.

use vfx_core::pixel::half_bits;
use vfx_core::{f16, BitDepth};

use super::compose::{compose, ComposeMethod};
use super::data::{HueAdjust, Lut1DOpData};
use super::order3;
use crate::op::Direction;
use crate::{OpsError, OpsResult};

/// `(b - a) * z + a`
#[inline]
pub(super) fn lerpf(a: f32, b: f32, z: f32) -> f32 {
    (b - a) * z + a
}

/// Per-channel tables and the way they are indexed.
#[derive(Debug, Clone)]
enum Table {
    /// One entry per input code. Half inputs index by bit pattern.
    Lookup { luts: [Vec<f32>; 3], half: bool },
    /// Linear interpolation over a standard domain.
    Linear { luts: [Vec<f32>; 3], step: f32, last: usize },
    /// Interpolation between the two half codes around the input.
    HalfCode { luts: [Vec<f32>; 3], in_scale: f32 },
}

/// Evaluator for a forward LUT.
///
/// Integer and half inputs go through a lookup table with one entry per
/// input code; if the LUT does not match the input depth it is first
/// resampled onto it. 32-bit float inputs are interpolated.
#[derive(Debug, Clone)]
pub struct ForwardRenderer {
    table: Table,
    hue: bool,
    alpha_scale: f32,
}

impl ForwardRenderer {
    pub(super) fn new(data: &Lut1DOpData, in_depth: BitDepth, out_depth: BitDepth) -> OpsResult<Self> {
        data.validate()?;
        if data.direction != Direction::Forward {
            return Err(OpsError::Unsupported(
                "the forward LUT1D evaluator needs a forward LUT".into(),
            ));
        }
        let out_range = out_depth.range();

        let table = if in_depth == BitDepth::F32 {
            let luts = channels(data, out_range);
            if data.half_domain {
                Table::HalfCode { luts, in_scale: 1.0 / in_depth.range() }
            } else {
                let n = data.length();
                Table::Linear { luts, step: (n as f32 - 1.0) / in_depth.range(), last: n - 1 }
            }
        } else if data.may_lookup(in_depth) {
            Table::Lookup { luts: channels(data, out_range), half: in_depth == BitDepth::F16 }
        } else {
            let domain = Lut1DOpData::make_lookup_domain(in_depth)?;
            let baked = compose(&domain, data, ComposeMethod::ResampleNo)?;
            Table::Lookup { luts: channels(&baked, out_range), half: in_depth == BitDepth::F16 }
        };

        Ok(Self {
            table,
            hue: data.hue_adjust == HueAdjust::Dw3,
            alpha_scale: out_range / in_depth.range(),
        })
    }

    /// Kernel name for log records.
    pub(super) fn kind(&self) -> &'static str {
        match (&self.table, self.hue) {
            (Table::Lookup { .. }, false) => "lookup",
            (Table::Lookup { .. }, true) => "lookup_hue",
            (Table::Linear { .. }, false) => "linear",
            (Table::Linear { .. }, true) => "linear_hue",
            (Table::HalfCode { .. }, false) => "half_code",
            (Table::HalfCode { .. }, true) => "half_code_hue",
        }
    }

    #[inline]
    fn eval(&self, c: usize, v: f32) -> f32 {
        match &self.table {
            Table::Lookup { luts, half } => {
                let lut = &luts[c];
                let code = if *half {
                    half_bits::code(v) as usize
                } else if v > 0.0 {
                    v as usize
                } else {
                    0
                };
                lut[code.min(lut.len() - 1)]
            }
            Table::Linear { luts, step, last } => {
                let lut = &luts[c];
                let mut idx = v * step;
                if idx.is_nan() {
                    idx = 0.0;
                }
                let idx = idx.clamp(0.0, *last as f32);
                let low = idx as usize;
                let high = (low + 1).min(*last);
                let delta = high as f32 - idx;
                lerpf(lut[high], lut[low], delta)
            }
            Table::HalfCode { luts, in_scale } => {
                let lut = &luts[c];
                let (a, b, fraction) = edge_codes(v * in_scale);
                lerpf(lut[b as usize], lut[a as usize], 1.0 - fraction)
            }
        }
    }

    pub(super) fn process(&self, block: &mut [[f32; 4]]) {
        if self.hue {
            for px in block.iter_mut() {
                let rgb = [px[0], px[1], px[2]];
                let (max, mid, min) = order3(&rgb);
                let chroma = rgb[max] - rgb[min];
                let hue_factor = if chroma == 0.0 { 0.0 } else { (rgb[mid] - rgb[min]) / chroma };

                let mut out = [self.eval(0, rgb[0]), self.eval(1, rgb[1]), self.eval(2, rgb[2])];
                out[mid] = hue_factor * (out[max] - out[min]) + out[min];
                *px = [out[0], out[1], out[2], px[3] * self.alpha_scale];
            }
        } else {
            for px in block.iter_mut() {
                *px = [
                    self.eval(0, px[0]),
                    self.eval(1, px[1]),
                    self.eval(2, px[2]),
                    px[3] * self.alpha_scale,
                ];
            }
        }
    }
}

/// Channel `c` of every entry, scaled to the output range, NaN as 0.
fn channels(data: &Lut1DOpData, out_range: f32) -> [Vec<f32>; 3] {
    std::array::from_fn(|c| {
        (0..data.length())
            .map(|i| {
                let v = data.value(i, c) * out_range;
                if v.is_nan() {
                    0.0
                } else {
                    v
                }
            })
            .collect()
    })
}

/// The two adjacent half codes around `f` and the position of `f` between
/// them, `a` being the one nearer to zero.
///
/// Infinities are clamped to `±HALF_MAX`.
pub(super) fn edge_codes(mut f: f32) -> (u16, u16, f32) {
    let mut h = f16::from_f32(f);
    if h.is_infinite() {
        h = if h.is_sign_negative() { f16::MIN } else { f16::MAX };
        f = h.to_f32();
    }

    let bits = h.to_bits();
    let (a, b) = if h.to_f32().abs() > f.abs() {
        (bits.wrapping_sub(1), bits)
    } else {
        let mut b = bits.wrapping_add(1);
        if f16::from_bits(b).is_infinite() {
            b = if h.is_sign_negative() {
                half_bits::NEG_HALF_MAX
            } else {
                half_bits::POS_HALF_MAX
            };
        }
        (bits, b)
    };

    let fa = half_bits::value(a);
    let fb = half_bits::value(b);
    let mut fraction = (f - fa) / (fb - fa);
    if fraction.is_nan() {
        fraction = 0.0;
    }
    (a, b, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_codes() {
        let (a, b, t) = edge_codes(1.0);
        assert_eq!((a, b, t), (half_bits::ONE, half_bits::ONE + 1, 0.0));

        // halfway between 1.0 and the next half
        let next = half_bits::value(half_bits::ONE + 1);
        let (a, b, t) = edge_codes((1.0 + next) * 0.5);
        assert_eq!((a, b), (half_bits::ONE, half_bits::ONE + 1));
        assert!((t - 0.5).abs() < 1e-3);

        // negative values walk away from -0
        let (a, b, _) = edge_codes(-1.0);
        assert_eq!(a, half_bits::code(-1.0));
        assert_eq!(b, half_bits::code(-1.0) + 1);

        let (a, b, t) = edge_codes(f32::INFINITY);
        assert_eq!((a, b, t), (half_bits::POS_HALF_MAX, half_bits::POS_HALF_MAX, 0.0));
        let (a, _, _) = edge_codes(1e9);
        assert_eq!(a, half_bits::POS_HALF_MAX);
        let (a, _, _) = edge_codes(f32::NEG_INFINITY);
        assert_eq!(a, half_bits::NEG_HALF_MAX);
    }

    #[test]
    fn test_lerpf_ends() {
        assert_eq!(lerpf(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerpf(2.0, 4.0, 1.0), 4.0);
        assert_eq!(lerpf(2.0, 4.0, 0.25), 2.5);
    }
}
