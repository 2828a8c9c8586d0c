//! ACES 2 output transform.
//!
//! ```text
//! encoding RGB -> JMh -> tonescale + chroma compress -> gamut compress -> limiting RGB
//! ```
//!
//! Encoding RGB is scene-referred (usually AP0). Limiting RGB is
//! display-linear with 1.0 at 100 cd/m², so an SDR transform fills [0, 1]
//! and an HDR one reaches `peak / 100`.

use tracing::debug;
use vfx_math::primaries::ACES_AP1;
use vfx_math::Primaries;

use super::cam::{jmh_to_rgb, rgb_to_jmh, JMhParams};
use super::chroma::{
    tonescale_chroma_compress_fwd, tonescale_chroma_compress_inv, ChromaCompressParams,
    SharedCompressionParams,
};
use super::common::F3;
use super::gamut::{gamut_compress_fwd, gamut_compress_inv, GamutCompressParams};
use super::tonescale::ToneScaleParams;
use crate::{ColorError, ColorResult};

// ============================================================================
// Parameters
// ============================================================================

/// Precomputed state of an ACES 2 output transform.
///
/// Building this runs the reach, cusp and hull gamma searches, so build it
/// once and share it.
#[derive(Debug, Clone)]
pub struct Aces2Params {
    /// Peak luminance in cd/m²
    pub peak_luminance: f32,
    /// Appearance model of the encoding primaries
    pub input: JMhParams,
    /// Appearance model of the limiting primaries
    pub limit: JMhParams,
    /// Tonescale curve
    pub tonescale: ToneScaleParams,
    /// Values shared by chroma and gamut compression
    pub shared: SharedCompressionParams,
    /// Chroma compression strengths
    pub chroma: ChromaCompressParams,
    /// Gamut compression constants and cusp table
    pub gamut: GamutCompressParams,
}

impl Aces2Params {
    /// Builds the transform for a display with `peak_luminance` cd/m² and
    /// `limiting` primaries, taking RGB in `encoding` primaries.
    pub fn new(
        peak_luminance: f32,
        limiting: &Primaries,
        encoding: &Primaries,
    ) -> ColorResult<Self> {
        let tonescale = ToneScaleParams::new(peak_luminance)?;
        let input = JMhParams::new(encoding)?;
        let limit = JMhParams::new(limiting)?;
        let reach = JMhParams::new(&ACES_AP1)?;

        let shared = SharedCompressionParams::new(peak_luminance, &input, &reach);
        let chroma = ChromaCompressParams::new(&tonescale);
        let gamut = GamutCompressParams::new(&tonescale, &input, &limit, &shared);

        debug!(peak_luminance, limit_j_max = shared.limit_j_max, "ACES2 output transform built");

        Ok(Self { peak_luminance, input, limit, tonescale, shared, chroma, gamut })
    }

    /// Builds from a parameter vector `[peak, rx, ry, gx, gy, bx, by, wx, wy]`
    /// holding the peak and the limiting primaries. Encoding is AP0.
    pub fn from_params(params: &[f64]) -> ColorResult<Self> {
        if params.len() != 9 {
            return Err(ColorError::ParamCount { expected: 9, found: params.len() });
        }
        let limiting = limiting_primaries(&params[1..])?;
        Self::new(params[0] as f32, &limiting, &vfx_math::primaries::ACES_AP0)
    }
}

/// Primaries from eight floats, rejecting any other count.
pub fn limiting_primaries(params: &[f64]) -> ColorResult<Primaries> {
    if params.len() != 8 {
        return Err(ColorError::ParamCount { expected: 8, found: params.len() });
    }
    Primaries::from_params(params).ok_or(ColorError::ParamCount { expected: 8, found: params.len() })
}

// ============================================================================
// Output Transform
// ============================================================================

/// Scene-referred to display-referred rendering and its inverse.
#[derive(Debug, Clone)]
pub struct OutputTransform {
    params: Aces2Params,
}

impl OutputTransform {
    /// Wraps precomputed parameters.
    pub fn new(params: Aces2Params) -> Self {
        Self { params }
    }

    /// The parameters in use.
    pub fn params(&self) -> &Aces2Params {
        &self.params
    }

    /// Encoding RGB to limiting RGB.
    #[inline]
    pub fn forward(&self, rgb: F3) -> F3 {
        let p = &self.params;
        let jmh = rgb_to_jmh(&rgb, &p.input);
        let tonemapped = tonescale_chroma_compress_fwd(&jmh, &p.input, &p.tonescale, &p.shared, &p.chroma);
        let compressed = gamut_compress_fwd(&tonemapped, &p.gamut, &p.shared);
        jmh_to_rgb(&compressed, &p.limit)
    }

    /// Limiting RGB to encoding RGB.
    #[inline]
    pub fn inverse(&self, rgb: F3) -> F3 {
        let p = &self.params;
        let compressed = rgb_to_jmh(&rgb, &p.limit);
        let tonemapped = gamut_compress_inv(&compressed, &p.gamut, &p.shared);
        let jmh = tonescale_chroma_compress_inv(&tonemapped, &p.input, &p.tonescale, &p.shared, &p.chroma);
        jmh_to_rgb(&jmh, &p.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aces2::cam::rgb_to_aab;
    use vfx_math::primaries::{ACES_AP0, P3_D65, REC709, REC2020};

    fn sdr() -> OutputTransform {
        OutputTransform::new(Aces2Params::new(100.0, &REC709, &ACES_AP0).unwrap())
    }

    #[test]
    fn test_invalid_peak() {
        assert!(matches!(
            Aces2Params::new(0.0, &REC709, &ACES_AP0),
            Err(ColorError::PeakLuminance { .. })
        ));
    }

    #[test]
    fn test_from_params() {
        let mut v = vec![1000.0];
        v.extend_from_slice(&REC2020.to_params());
        let p = Aces2Params::from_params(&v).unwrap();
        assert_eq!(p.peak_luminance, 1000.0);

        assert!(matches!(
            Aces2Params::from_params(&v[..5]),
            Err(ColorError::ParamCount { expected: 9, found: 5 })
        ));
    }

    #[test]
    fn test_black_and_grey() {
        let ot = sdr();
        assert_eq!(ot.forward([0.0; 3]), [0.0; 3]);

        let grey = ot.forward([0.18, 0.18, 0.18]);
        assert_eq!(grey[0], grey[1]);
        assert_eq!(grey[1], grey[2]);
        // Mid grey lands close to 10 cd/m²
        assert!((grey[1] - 0.1).abs() < 0.01, "grey -> {grey:?}");
    }

    #[test]
    fn test_achromatic_roundtrip() {
        for (peak, limiting) in [(100.0f32, REC709), (1000.0, P3_D65)] {
            let ot = OutputTransform::new(Aces2Params::new(peak, &limiting, &ACES_AP0).unwrap());
            let top = peak / 100.0;
            for i in 1..=20 {
                let x = top * i as f32 / 20.0;
                let aab = rgb_to_aab(&[x, x, x], &ot.params().input);
                assert_eq!(aab[1], 0.0);
                assert_eq!(aab[2], 0.0);

                let fwd = ot.forward([x, x, x]);
                let back = ot.inverse(fwd);
                for c in back {
                    assert!((c - x).abs() <= 5e-4 * x, "peak {peak}: {x} -> {fwd:?} -> {back:?}");
                }
            }
        }
    }

    #[test]
    fn test_monotonic_grey_ramp() {
        let ot = sdr();
        let mut prev = 0.0;
        for i in 1..32 {
            let v = i as f32 * 0.25;
            let out = ot.forward([v, v, v])[1];
            assert!(out > prev, "not increasing at {v}");
            assert!(out <= 1.0 + 1e-4, "{v} -> {out} above peak");
            prev = out;
        }
    }

    #[test]
    fn test_extreme_inputs_stay_finite() {
        let ot = sdr();
        for rgb in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [-0.1, 0.2, 0.05], [50.0, 1.0, 0.0]] {
            let out = ot.forward(rgb);
            assert!(out.iter().all(|c| c.is_finite()), "{rgb:?} -> {out:?}");
        }
    }

    #[test]
    fn test_chromatic_roundtrip() {
        let ot = sdr();
        for rgb in [[0.3f32, 0.2, 0.1], [0.05, 0.1, 0.2], [0.25, 0.25, 0.3]] {
            let back = ot.inverse(ot.forward(rgb));
            for i in 0..3 {
                assert!((back[i] - rgb[i]).abs() < 5e-3, "{rgb:?} -> {back:?}");
            }
        }
    }
}
