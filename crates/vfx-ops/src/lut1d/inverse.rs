//! Exact inverse LUT1D evaluation by bisection.
//!
//! Each channel keeps a copy of the forward curve scaled to the input
//! range and negated when the curve decreases, so every search runs on an
//! increasing array. The search is restricted to the effective domain
//! found by [`Lut1DOpData::finalize`]; values outside it are clamped to its
//! ends, which makes inputs inside a leading or trailing flat spot land on
//! the edge of the spot nearest the middle of the LUT.
//!
//! Half-domain LUTs carry two ranges, one for the positive codes and one
//! for the negative codes. The LUT value at code 0 decides which one a
//! given input is searched in.

use vfx_core::pixel::half_bits;
use vfx_core::BitDepth;

use super::data::{ComponentProperties, HueAdjust, Lut1DOpData};
use super::order3;
use crate::op::Direction;
use crate::{OpsError, OpsResult};

const NEG_ZERO: usize = half_bits::NEG_ZERO as usize;

#[derive(Debug, Clone)]
struct ChannelParams {
    lut: Vec<f32>,
    start: usize,
    end: usize,
    neg_start: usize,
    neg_end: usize,
    flip: f32,
    bisect: f32,
}

impl ChannelParams {
    fn new(data: &Lut1DOpData, c: usize, p: &ComponentProperties, in_range: f32) -> Self {
        let flip = if p.is_increasing { 1.0 } else { -1.0 };
        let lut = (0..data.length())
            .map(|i| {
                let v = data.value(i, c) * in_range;
                // negative half codes run away from zero, so their sign is reversed
                if data.half_domain && i >= NEG_ZERO {
                    -v * flip
                } else {
                    v * flip
                }
            })
            .collect();
        Self {
            lut,
            start: p.start_domain,
            end: p.end_domain,
            neg_start: p.neg_start_domain,
            neg_end: p.neg_end_domain,
            flip,
            bisect: data.value(0, c) * in_range,
        }
    }

    #[inline]
    fn is_increasing(&self) -> bool {
        self.flip > 0.0
    }
}

/// Bisection over `lut[start..=end]`.
///
/// Returns the bracketing indices and the fractional position of the
/// clamped value between them.
#[inline]
fn search(lut: &[f32], start: usize, end: usize, flip: f32, val: f32) -> (usize, usize, f32) {
    let mut cv = val * flip;
    if cv < lut[start] {
        cv = lut[start];
    }
    if cv > lut[end] {
        cv = lut[end];
    }

    let mut low = start + lut[start..end].partition_point(|&x| x < cv);
    if low > start {
        low -= 1;
    }
    let high = if low < end { low + 1 } else { low };

    let delta = if lut[high] > lut[low] {
        (cv - lut[low]) / (lut[high] - lut[low])
    } else {
        0.0
    };
    (low, high, delta)
}

/// Fractional index of `val`, scaled by `scale`.
#[inline]
fn find_lut_inv(lut: &[f32], start: usize, end: usize, flip: f32, scale: f32, val: f32) -> f32 {
    let (low, _, delta) = search(lut, start, end, flip, val);
    (low as f32 + delta) * scale
}

/// Half value of the fractional code of `val`, scaled by `scale`.
#[inline]
fn find_lut_inv_half(lut: &[f32], start: usize, end: usize, flip: f32, scale: f32, val: f32) -> f32 {
    let (low, high, delta) = search(lut, start, end, flip, val);
    let base = half_bits::value(low as u16);
    let domain = if high > low {
        let next = half_bits::value(high as u16);
        base + delta * (next - base)
    } else {
        base
    };
    domain * scale
}

/// Evaluator for an inverse LUT with exact inversion.
#[derive(Debug, Clone)]
pub struct InverseRenderer {
    params: [ChannelParams; 3],
    half: bool,
    hue: bool,
    scale: f32,
    alpha_scale: f32,
}

impl InverseRenderer {
    pub(super) fn new(data: &Lut1DOpData, in_depth: BitDepth, out_depth: BitDepth) -> OpsResult<Self> {
        data.validate()?;
        if data.direction != Direction::Inverse {
            return Err(OpsError::Unsupported(
                "the inverse LUT1D evaluator needs an inverse LUT".into(),
            ));
        }
        let props = data.props.as_ref().ok_or(OpsError::FinalizeNotCalled("LUT1D"))?;

        let in_range = in_depth.range();
        let out_range = out_depth.range();
        let params = std::array::from_fn(|c| ChannelParams::new(data, c, &props[c], in_range));
        // index units to output units; half codes are converted to values first
        let scale = if data.half_domain {
            out_range
        } else {
            out_range / (data.length() as f32 - 1.0)
        };

        Ok(Self {
            params,
            half: data.half_domain,
            hue: data.hue_adjust == HueAdjust::Dw3,
            scale,
            alpha_scale: out_range / in_range,
        })
    }

    /// Kernel name for log records.
    pub(super) fn kind(&self) -> &'static str {
        match (self.half, self.hue) {
            (false, false) => "inverse",
            (false, true) => "inverse_hue",
            (true, false) => "inverse_half_code",
            (true, true) => "inverse_half_code_hue",
        }
    }

    #[inline]
    fn eval(&self, c: usize, v: f32) -> f32 {
        let p = &self.params[c];
        if !self.half {
            return find_lut_inv(&p.lut, p.start, p.end, p.flip, self.scale, v);
        }
        if p.is_increasing() == (v >= p.bisect) {
            find_lut_inv_half(&p.lut, p.start, p.end, p.flip, self.scale, v)
        } else {
            find_lut_inv_half(&p.lut, p.neg_start, p.neg_end, -p.flip, self.scale, v)
        }
    }

    pub(super) fn process(&self, block: &mut [[f32; 4]]) {
        for px in block.iter_mut() {
            let rgb = [px[0], px[1], px[2]];
            let mut out = [self.eval(0, rgb[0]), self.eval(1, rgb[1]), self.eval(2, rgb[2])];
            if self.hue {
                let (max, mid, min) = order3(&rgb);
                let chroma = rgb[max] - rgb[min];
                let hue_factor = if chroma == 0.0 { 0.0 } else { (rgb[mid] - rgb[min]) / chroma };
                out[mid] = hue_factor * (out[max] - out[min]) + out[min];
            }
            *px = [out[0], out[1], out[2], px[3] * self.alpha_scale];
        }
    }
}
