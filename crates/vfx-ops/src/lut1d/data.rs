//! LUT1D op data: values, flags, validation and inverse preparation.

use tracing::warn;
use vfx_core::pixel::half_bits;
use vfx_core::{f16, BitDepth};

use crate::op::Direction;
use crate::{OpsError, OpsResult};

/// Largest accepted LUT length.
pub const MAX_LENGTH: usize = 1024 * 1024;

/// Number of entries of a half-domain LUT.
pub const HALF_DOMAIN_LENGTH: usize = 65536;

/// Tolerance used by the identity and extended-range checks.
const ABS_TOL: f32 = 1e-5;

/// Hue handling around the per-channel curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HueAdjust {
    /// Channels are independent.
    #[default]
    None,
    /// The middle channel is re-placed between the new min and max so the
    /// saturation-normalised hue of the input is kept.
    Dw3,
}

/// How an inverse-direction LUT is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InversionQuality {
    /// Resample the inverse onto a forward LUT and interpolate it.
    Fast,
    /// Bisection on the forward table for every pixel.
    #[default]
    Exact,
    /// Same as `Exact`.
    Best,
}

/// Per-channel shape of a LUT, computed when an inverse LUT is finalized.
///
/// Indices are entry indices, not value offsets. For half-domain LUTs the
/// `neg_*` pair bounds the negative codes (32768 and up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentProperties {
    /// Overall direction of the curve. A flat curve counts as decreasing.
    pub is_increasing: bool,
    /// First entry past the leading flat spot.
    pub start_domain: usize,
    /// Last entry before the trailing flat spot.
    pub end_domain: usize,
    /// Same as `start_domain` for the negative half codes.
    pub neg_start_domain: usize,
    /// Same as `end_domain` for the negative half codes.
    pub neg_end_domain: usize,
}

/// A 1D LUT with one curve per RGB channel.
///
/// `values` holds `3 * length` interleaved RGB entries in nominal units
/// (1.0 is the top of the output range). A half-domain LUT has exactly
/// 65536 entries and entry `i` is the output for the half float whose bit
/// pattern is `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut1DOpData {
    pub(super) values: Vec<f32>,
    pub(super) half_domain: bool,
    pub(super) raw_halfs: bool,
    pub(super) hue_adjust: HueAdjust,
    pub(super) quality: InversionQuality,
    pub(super) file_output_depth: Option<BitDepth>,
    pub(super) direction: Direction,
    pub(super) props: Option<[ComponentProperties; 3]>,
}

impl Lut1DOpData {
    fn with_values(values: Vec<f32>, half_domain: bool) -> Self {
        Self {
            values,
            half_domain,
            raw_halfs: false,
            hue_adjust: HueAdjust::None,
            quality: InversionQuality::default(),
            file_output_depth: None,
            direction: Direction::Forward,
            props: None,
        }
    }

    /// Identity ramp `i / (length - 1)` on every channel.
    pub fn identity(length: usize) -> OpsResult<Self> {
        check_length(length)?;
        let step = 1.0 / (length as f32 - 1.0);
        let values = (0..length)
            .flat_map(|i| {
                let v = i as f32 * step;
                [v, v, v]
            })
            .collect();
        Ok(Self::with_values(values, false))
    }

    /// Half-domain identity: entry `i` holds the half float with bits `i`,
    /// NaN codes included.
    pub fn half_domain_identity() -> Self {
        Self::with_values(half_ramp(false), true)
    }

    /// Identity domain used to bake lookups: NaN codes map to 0.
    pub(super) fn half_lookup_domain() -> Self {
        Self::with_values(half_ramp(true), true)
    }

    /// Builds a LUT from interleaved RGB values.
    ///
    /// With `raw_halfs` every value is a half-float bit pattern stored as a
    /// number (e.g. `15360.0` for 1.0) and is decoded here.
    pub fn from_values(values: Vec<f32>, half_domain: bool, raw_halfs: bool) -> OpsResult<Self> {
        if values.len() % 3 != 0 {
            return Err(OpsError::SizeMismatch(format!(
                "LUT 1D: {} values is not a whole number of RGB entries.",
                values.len()
            )));
        }
        let values = if raw_halfs { decode_raw_halfs(values)? } else { values };
        let mut lut = Self::with_values(values, half_domain);
        lut.raw_halfs = raw_halfs;
        lut.validate()?;
        Ok(lut)
    }

    /// Same data with another hue adjustment.
    pub fn with_hue_adjust(mut self, hue_adjust: HueAdjust) -> Self {
        self.hue_adjust = hue_adjust;
        self
    }

    /// Same data with another inversion quality.
    pub fn with_inversion_quality(mut self, quality: InversionQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Depth the LUT was authored for.
    pub fn with_file_output_depth(mut self, depth: BitDepth) -> Self {
        self.file_output_depth = Some(depth);
        self
    }

    /// Same data with another direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self.props = None;
        self
    }

    /// Number of entries per channel.
    pub fn length(&self) -> usize {
        self.values.len() / 3
    }

    /// Interleaved RGB values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Entry `i` of channel `c`.
    #[inline]
    pub fn value(&self, i: usize, c: usize) -> f32 {
        self.values[i * 3 + c]
    }

    /// Whether the input is indexed by half-float codes.
    pub fn is_input_half_domain(&self) -> bool {
        self.half_domain
    }

    /// Whether the values were given as raw half patterns.
    pub fn is_output_raw_halfs(&self) -> bool {
        self.raw_halfs
    }

    /// Hue adjustment.
    pub fn hue_adjust(&self) -> HueAdjust {
        self.hue_adjust
    }

    /// Inversion quality.
    pub fn inversion_quality(&self) -> InversionQuality {
        self.quality
    }

    /// Depth the LUT was authored for, if known.
    pub fn file_output_depth(&self) -> Option<BitDepth> {
        self.file_output_depth
    }

    /// Direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Per-channel properties, available once an inverse LUT is finalized.
    pub fn component_properties(&self) -> Option<&[ComponentProperties; 3]> {
        self.props.as_ref()
    }

    /// Checks length and the half-domain size.
    pub fn validate(&self) -> OpsResult<()> {
        if self.values.len() % 3 != 0 {
            return Err(OpsError::SizeMismatch(format!(
                "LUT 1D: {} values is not a whole number of RGB entries.",
                self.values.len()
            )));
        }
        let n = self.length();
        check_length(n)?;
        if self.half_domain && n != HALF_DOMAIN_LENGTH {
            return Err(OpsError::InvalidLut(format!(
                "1D LUT: {n} entries found, {HALF_DOMAIN_LENGTH} required for halfDomain 1D LUT."
            )));
        }
        Ok(())
    }

    /// Whether the values match the identity of this domain.
    ///
    /// Standard domains allow an absolute error of 1e-5; half domains allow
    /// one half ULP.
    pub fn is_identity(&self) -> bool {
        if self.half_domain {
            return (0..self.length()).all(|i| {
                let aim = f16::from_bits(i as u16);
                (0..3).all(|c| !halfs_differ(aim, f16::from_f32(self.value(i, c)), 1))
            });
        }
        let step = 1.0 / (self.length() as f32 - 1.0);
        (0..self.length()).all(|i| {
            let aim = i as f32 * step;
            (0..3).all(|c| (self.value(i, c) - aim).abs() <= ABS_TOL)
        })
    }

    /// Leaves every value unchanged.
    ///
    /// A standard-domain identity still clamps to `[0, 1]`, so only a
    /// half-domain identity qualifies.
    pub fn is_no_op(&self) -> bool {
        self.half_domain && self.is_identity()
    }

    /// Any value outside `[0, 1]` (NaN ignored).
    pub fn has_extended_range(&self) -> bool {
        self.values
            .iter()
            .any(|&v| !v.is_nan() && (v < -ABS_TOL || v > 1.0 + ABS_TOL))
    }

    /// Whether a buffer of `in_depth` can index this table directly.
    pub fn may_lookup(&self, in_depth: BitDepth) -> bool {
        if self.half_domain {
            return in_depth == BitDepth::F16;
        }
        !in_depth.is_float() && in_depth.lookup_size() == Some(self.length())
    }

    /// Identity domain with one entry per input code of `depth`: a standard
    /// ramp for integer depths, a half domain for float depths.
    pub fn make_lookup_domain(depth: BitDepth) -> OpsResult<Self> {
        match depth.lookup_size() {
            Some(n) if depth.is_integer() => Self::identity(n),
            _ => Ok(Self::half_lookup_domain()),
        }
    }

    /// Same LUT with the opposite direction.
    pub fn inverse(&self) -> Self {
        self.clone().with_direction(self.direction.inverse())
    }

    /// Whether `other` undoes `self`.
    pub fn is_inverse(&self, other: &Self) -> bool {
        self.direction != other.direction
            && self.half_domain == other.half_domain
            && self.hue_adjust == other.hue_adjust
            && self.values == other.values
    }

    /// Hue adjustment is off on both sides.
    pub fn may_compose(&self, other: &Self) -> bool {
        self.hue_adjust == HueAdjust::None && other.hue_adjust == HueAdjust::None
    }

    /// Prepares the LUT for evaluation.
    ///
    /// Forward LUTs are returned as is. Inverse LUTs get reversals
    /// flattened so that every channel is monotonic, and their effective
    /// domains computed.
    pub fn finalize(&self) -> OpsResult<Self> {
        self.validate()?;
        let mut lut = self.clone();
        if lut.direction == Direction::Inverse {
            lut.initialize_from_forward();
        } else {
            lut.props = None;
        }
        Ok(lut)
    }

    fn initialize_from_forward(&mut self) {
        let n = self.length();
        let mut props = [ComponentProperties::default(); 3];
        let mut flattened = 0usize;

        for (c, p) in props.iter_mut().enumerate() {
            let (low, high) = if self.half_domain {
                (0, half_bits::ONE as usize)
            } else {
                (0, n - 1)
            };
            p.is_increasing = self.value(low, c) < self.value(high, c);

            if self.half_domain {
                let seed = self.value(0, c);
                flattened += self.flatten(c, 1..=half_bits::POS_INF as usize, p.is_increasing, seed);
                // -0 continues from +0 so the halves cannot overlap
                flattened += self.flatten(
                    c,
                    half_bits::NEG_ZERO as usize..=half_bits::NEG_INF as usize,
                    !p.is_increasing,
                    seed,
                );
                let (s, e) = self.effective_domain(c, 0, half_bits::POS_HALF_MAX as usize);
                p.start_domain = s;
                p.end_domain = e;
                let (s, e) = self.effective_domain(
                    c,
                    half_bits::NEG_ZERO as usize,
                    half_bits::NEG_HALF_MAX as usize,
                );
                p.neg_start_domain = s;
                p.neg_end_domain = e;
            } else {
                let seed = self.value(0, c);
                flattened += self.flatten(c, 1..=n - 1, p.is_increasing, seed);
                let (s, e) = self.effective_domain(c, 0, n - 1);
                p.start_domain = s;
                p.end_domain = e;
            }
        }

        if flattened > 0 {
            warn!(entries = flattened, length = n, "LUT1D reversals flattened for inversion");
        }
        self.props = Some(props);
    }

    /// Replaces every entry that moves against `increasing` with its
    /// predecessor. Returns the number of entries changed.
    fn flatten(
        &mut self,
        c: usize,
        range: std::ops::RangeInclusive<usize>,
        increasing: bool,
        seed: f32,
    ) -> usize {
        let mut prev = seed;
        let mut changed = 0;
        for i in range {
            let v = &mut self.values[i * 3 + c];
            if increasing != (*v > prev) {
                if *v != prev {
                    changed += 1;
                }
                *v = prev;
            } else {
                prev = *v;
            }
        }
        changed
    }

    /// Trims flat spots at both ends of `[first, last]`.
    fn effective_domain(&self, c: usize, first: usize, last: usize) -> (usize, usize) {
        let mut end = last;
        let end_value = self.value(end, c);
        while end > first && self.value(end - 1, c) == end_value {
            end -= 1;
        }
        let mut start = first;
        let start_value = self.value(start, c);
        while start < end && self.value(start + 1, c) == start_value {
            start += 1;
        }
        (start, end)
    }
}

fn check_length(n: usize) -> OpsResult<()> {
    if n < 2 {
        return Err(OpsError::InvalidDimensions("LUT 1D length needs to be at least 2.".into()));
    }
    if n > MAX_LENGTH {
        return Err(OpsError::InvalidDimensions(format!(
            "LUT 1D: Length '{n}' must not be greater than 1024x1024 ({MAX_LENGTH})."
        )));
    }
    Ok(())
}

fn half_ramp(filter_nan: bool) -> Vec<f32> {
    (0..HALF_DOMAIN_LENGTH)
        .flat_map(|i| {
            let mut v = half_bits::value(i as u16);
            if filter_nan && v.is_nan() {
                v = 0.0;
            }
            [v, v, v]
        })
        .collect()
}

fn decode_raw_halfs(values: Vec<f32>) -> OpsResult<Vec<f32>> {
    values
        .into_iter()
        .map(|v| {
            if v.fract() != 0.0 || !(0.0..=65535.0).contains(&v) {
                return Err(OpsError::InvalidLut(format!(
                    "LUT 1D: '{v}' is not a valid raw half value."
                )));
            }
            Ok(half_bits::value(v as u16))
        })
        .collect()
}

/// Orders half codes so that -0 and +0 are adjacent.
fn half_for_compare(h: f16) -> i32 {
    let raw = h.to_bits() as i32;
    if raw < 32767 {
        raw + 32768
    } else {
        2 * 32768 - raw
    }
}

/// Whether two halves are more than `tolerance` ULPs apart.
pub(crate) fn halfs_differ(expected: f16, actual: f16, tolerance: i32) -> bool {
    if expected.is_nan() || actual.is_nan() {
        return expected.is_nan() != actual.is_nan();
    }
    let (a, b) = (half_for_compare(expected), half_for_compare(actual));
    if expected.is_infinite() || actual.is_infinite() {
        return a != b;
    }
    (b - a).abs() > tolerance
}
