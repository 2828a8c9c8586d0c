//! Composition of two LUTs and the fast inverse.

use tracing::debug;
use vfx_core::BitDepth;

use super::data::{HueAdjust, Lut1DOpData, HALF_DOMAIN_LENGTH};
use super::Lut1DRenderer;
use crate::op::{CpuOp, Direction, BLOCK_PIXELS};
use crate::{OpsError, OpsResult};

/// Domain of the result of [`compose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeMethod {
    /// Keep the first LUT's domain.
    ResampleNo,
    /// Resample onto the lookup domain of a depth when the first LUT is
    /// smaller than it (a half domain for float depths).
    ResampleInDepth(BitDepth),
    /// At least 65536 standard-domain entries.
    ResampleBig,
    /// A 65536-entry half domain.
    ResampleHalfDomain,
}

impl ComposeMethod {
    /// Minimum size and whether a half domain is required.
    fn requirements(self) -> (usize, bool) {
        match self {
            Self::ResampleNo => (0, false),
            Self::ResampleInDepth(d) => (d.lookup_size().unwrap_or(HALF_DOMAIN_LENGTH), d.is_float()),
            Self::ResampleBig => (HALF_DOMAIN_LENGTH, false),
            Self::ResampleHalfDomain => (HALF_DOMAIN_LENGTH, true),
        }
    }
}

/// `b ∘ a`: a LUT that applies `a`, then `b`.
///
/// Two inverse LUTs compose as the inverse of `a⁻¹ ∘ b⁻¹`. When `a` is an
/// inverse (and `b` is not) both are evaluated through a half domain. The
/// inverse stages always use exact inversion. The result takes its hue
/// adjustment from `b` and is finalized.
pub fn compose(a: &Lut1DOpData, b: &Lut1DOpData, method: ComposeMethod) -> OpsResult<Lut1DOpData> {
    let (mut lut1, mut lut2) = (a.clone(), b.clone());
    let restore_inverse =
        lut1.direction == Direction::Inverse && lut2.direction == Direction::Inverse;
    if restore_inverse {
        std::mem::swap(&mut lut1, &mut lut2);
        lut1 = lut1.with_direction(Direction::Forward);
        lut2 = lut2.with_direction(Direction::Forward);
    }

    let (min_size, need_half) = method.requirements();
    let good_domain = lut1.half_domain || (lut1.length() >= min_size && !need_half);
    let use_orig_domain = method == ComposeMethod::ResampleNo;
    let lut1_inverse = lut1.direction == Direction::Inverse;

    let mut stages = Vec::with_capacity(2);
    let mut result = if (!good_domain && !use_orig_domain) || lut1_inverse {
        stages.push(lut1.finalize()?);
        if min_size == 0 || lut1_inverse || need_half {
            Lut1DOpData::half_lookup_domain()
        } else {
            Lut1DOpData::identity(min_size)?
        }
    } else {
        lut1.with_direction(Direction::Forward)
    };
    stages.push(lut2.finalize()?);

    eval_through(&mut result.values, &stages)?;

    result.hue_adjust = lut2.hue_adjust;
    result.props = None;
    if restore_inverse {
        result.direction = Direction::Inverse;
    }
    debug!(
        length = result.length(),
        half_domain = result.half_domain,
        ?method,
        "LUT1D composed"
    );
    result.finalize()
}

/// Evaluates interleaved RGB `values` through the curves of each stage at
/// 32-bit float. Hue adjustment is left to whoever applies the result.
fn eval_through(values: &mut [f32], stages: &[Lut1DOpData]) -> OpsResult<()> {
    let renderers = stages
        .iter()
        .map(|s| {
            let curves = s.clone().with_hue_adjust(HueAdjust::None);
            Lut1DRenderer::exact(&curves, BitDepth::F32, BitDepth::F32)
        })
        .collect::<OpsResult<Vec<_>>>()?;

    let mut scratch = [[0.0f32; 4]; BLOCK_PIXELS];
    for chunk in values.chunks_mut(BLOCK_PIXELS * 3) {
        let block = &mut scratch[..chunk.len() / 3];
        for (px, rgb) in block.iter_mut().zip(chunk.chunks_exact(3)) {
            *px = [rgb[0], rgb[1], rgb[2], 0.0];
        }
        for r in &renderers {
            r.process(block);
        }
        for (px, rgb) in block.iter().zip(chunk.chunks_exact_mut(3)) {
            rgb.copy_from_slice(&px[..3]);
        }
    }
    Ok(())
}

/// Resamples an inverse LUT onto a forward LUT.
///
/// The domain follows the depth the LUT was authored for (12-bit when
/// unknown) and becomes a half domain when the values leave `[0, 1]`.
pub fn make_fast_from_inverse(lut: &Lut1DOpData) -> OpsResult<Lut1DOpData> {
    if lut.direction != Direction::Inverse {
        return Err(OpsError::Unsupported(
            "a fast 1D LUT can only be made from an inverse 1D LUT".into(),
        ));
    }
    let mut depth = lut.file_output_depth.unwrap_or(BitDepth::U12);
    if lut.has_extended_range() {
        depth = BitDepth::F16;
    }
    debug!(%depth, length = lut.length(), "building fast inverse LUT1D");
    let domain = Lut1DOpData::make_lookup_domain(depth)?;
    compose(&domain, lut, ComposeMethod::ResampleNo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(v: &[f32]) -> Lut1DOpData {
        let values = v.iter().flat_map(|&x| [x, x, x]).collect();
        Lut1DOpData::from_values(values, false, false).unwrap()
    }

    #[test]
    fn test_compose_keeps_first_domain() {
        let a = Lut1DOpData::identity(5).unwrap();
        let b = ramp(&[0.0, 0.25, 1.0]);
        let c = compose(&a, &b, ComposeMethod::ResampleNo).unwrap();
        assert_eq!(c.length(), 5);
        // b at 0, .25, .5, .75, 1
        let expected = [0.0, 0.125, 0.25, 0.625, 1.0];
        for (i, e) in expected.iter().enumerate() {
            assert!((c.value(i, 1) - e).abs() < 1e-6, "entry {i}: {}", c.value(i, 1));
        }
    }

    #[test]
    fn test_compose_resample_big() {
        let a = ramp(&[0.0, 1.0]);
        let b = ramp(&[0.0, 0.5, 1.0]);
        let c = compose(&a, &b, ComposeMethod::ResampleBig).unwrap();
        assert_eq!(c.length(), HALF_DOMAIN_LENGTH);
        assert!(!c.is_input_half_domain());

        let hd = compose(&a, &b, ComposeMethod::ResampleHalfDomain).unwrap();
        assert!(hd.is_input_half_domain());

        let d = compose(&a, &b, ComposeMethod::ResampleInDepth(BitDepth::U10)).unwrap();
        assert_eq!(d.length(), 1024);
    }

    #[test]
    fn test_compose_with_inverse_is_identity() {
        let fwd = ramp(&[0.0, 0.1, 0.3, 0.6, 1.0]);
        let c = compose(&fwd, &fwd.inverse(), ComposeMethod::ResampleNo).unwrap();
        let step = 1.0 / 4.0;
        for i in 0..5 {
            assert!((c.value(i, 0) - i as f32 * step).abs() < 1e-6);
        }
    }

    #[test]
    fn test_compose_two_inverses() {
        let a = ramp(&[0.0, 0.5, 1.0]).inverse();
        let b = ramp(&[0.0, 0.25, 1.0]).inverse();
        let c = compose(&a, &b, ComposeMethod::ResampleNo).unwrap();
        assert_eq!(c.direction(), Direction::Inverse);
        assert_eq!(c.length(), 3);
        assert!(c.component_properties().is_some());
    }

    #[test]
    fn test_hue_taken_from_second() {
        let a = Lut1DOpData::identity(4).unwrap().with_hue_adjust(HueAdjust::Dw3);
        let b = ramp(&[0.0, 1.0]);
        assert_eq!(compose(&a, &b, ComposeMethod::ResampleNo).unwrap().hue_adjust(), HueAdjust::None);
        assert!(!a.may_compose(&b));
    }

    #[test]
    fn test_fast_domain_choice() {
        let inv = ramp(&[0.0, 0.2, 1.0]).inverse();
        assert_eq!(make_fast_from_inverse(&inv).unwrap().length(), 4096);

        let inv8 = inv.clone().with_file_output_depth(BitDepth::U8);
        assert_eq!(make_fast_from_inverse(&inv8).unwrap().length(), 256);

        let ext = ramp(&[-0.5, 0.2, 1.5]).inverse();
        assert!(make_fast_from_inverse(&ext).unwrap().is_input_half_domain());

        assert!(matches!(
            make_fast_from_inverse(&inv.inverse()),
            Err(OpsError::Unsupported(_))
        ));
    }
}
