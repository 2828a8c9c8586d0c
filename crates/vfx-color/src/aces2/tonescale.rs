//! ACES 2 tonescale.
//!
//! A rational curve mapping scene luminance to display luminance for a
//! given peak:
//!
//! ```text
//! f(Y)  = m_2 * (Y / (Y + s_2))^g
//! Y_ts  = max(0, f^2 / (f + t_1)) * n_r
//! ```
//!
//! Input is relative (1.0 = 100 cd/m²), output is in cd/m².

use super::common::REFERENCE_LUMINANCE;
use crate::{ColorError, ColorResult};

/// Minimum accepted peak luminance (cd/m²).
pub const MIN_PEAK_LUMINANCE: f32 = 1.0;

/// Maximum accepted peak luminance (cd/m²).
pub const MAX_PEAK_LUMINANCE: f32 = 100_000.0;

/// Checks a peak luminance against the supported range.
pub fn validate_peak(peak_luminance: f32) -> ColorResult<()> {
    if peak_luminance.is_finite()
        && (MIN_PEAK_LUMINANCE..=MAX_PEAK_LUMINANCE).contains(&peak_luminance)
    {
        Ok(())
    } else {
        Err(ColorError::PeakLuminance {
            value: peak_luminance,
            min: MIN_PEAK_LUMINANCE,
            max: MAX_PEAK_LUMINANCE,
        })
    }
}

/// Tonescale constants for one peak luminance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneScaleParams {
    /// Peak luminance in cd/m²
    pub n: f32,
    /// Normalized white in cd/m² (what 1.0 maps to)
    pub n_r: f32,
    /// Contrast exponent
    pub g: f32,
    /// Shadow toe
    pub t_1: f32,
    /// Display-referred mid grey, relative
    pub c_t: f32,
    /// Scene scale
    pub s_2: f32,
    /// Curve normalization at the roof
    pub u_2: f32,
    /// Display scale
    pub m_2: f32,
}

impl ToneScaleParams {
    /// Derives the curve for `peak_luminance` cd/m².
    pub fn new(peak_luminance: f32) -> ColorResult<Self> {
        validate_peak(peak_luminance)?;

        let n = peak_luminance;
        let n_r = REFERENCE_LUMINANCE;
        let g = 1.15f32;
        // 18% grey anchor and its display luminance
        let c = 0.18f32;
        let c_d = 10.013f32;
        let w_g = 0.14f32;
        let t_1 = 0.04f32;
        let r_hit_min = 128.0f32;
        let r_hit_max = 896.0f32;

        let r_hit = r_hit_min + (r_hit_max - r_hit_min) * ((n / n_r).ln() / (10000.0f32 / 100.0).ln());
        let m_0 = n / n_r;
        let m_1 = 0.5 * (m_0 + (m_0 * (m_0 + 4.0 * t_1)).sqrt());
        let u = ((r_hit / m_1) / ((r_hit / m_1) + 1.0)).powf(g);
        let m = m_1 / u;
        let w_i = (n / 100.0).log2();
        let c_t = c_d / n_r * (1.0 + w_i * w_g);
        let g_ip = 0.5 * (c_t + (c_t * (c_t + 4.0 * t_1)).sqrt());
        let g_ipp2 = -(m_1 * (g_ip / m).powf(1.0 / g)) / ((g_ip / m).powf(1.0 / g) - 1.0);
        let w_2 = c / g_ipp2;
        let s_2 = w_2 * m_1;
        let u_2 = ((r_hit / m_1) / ((r_hit / m_1) + w_2)).powf(g);
        let m_2 = m_1 / u_2;

        Ok(Self { n, n_r, g, t_1, c_t, s_2, u_2, m_2 })
    }

    /// Relative scene luminance to display luminance in cd/m².
    #[inline]
    pub fn forward(&self, y: f32) -> f32 {
        let f = self.m_2 * (y.max(0.0) / (y + self.s_2)).powf(self.g);
        (f * f / (f + self.t_1)).max(0.0) * self.n_r
    }

    /// Relative display luminance to scene luminance in cd/m².
    ///
    /// Input is clamped to the curve's range so the result stays finite.
    #[inline]
    pub fn inverse(&self, y_ts: f32) -> f32 {
        let z = y_ts.min(self.n / (self.u_2 * self.n_r)).max(0.0);
        let ht = (z + (z * (4.0 * self.t_1 + z)).sqrt()) / 2.0;
        self.s_2 / ((self.m_2 / ht).powf(1.0 / self.g) - 1.0) * self.n_r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_validation() {
        assert!(ToneScaleParams::new(100.0).is_ok());
        assert!(ToneScaleParams::new(1.0).is_ok());
        assert!(ToneScaleParams::new(100_000.0).is_ok());
        for bad in [0.0, -100.0, 0.5, f32::NAN, f32::INFINITY, 200_000.0] {
            assert!(
                matches!(ToneScaleParams::new(bad), Err(ColorError::PeakLuminance { .. })),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn test_mid_grey_lands_near_ten_nits() {
        let p = ToneScaleParams::new(100.0).unwrap();
        let out = p.forward(0.18);
        assert!((out - 10.013).abs() < 0.05, "0.18 -> {out}");
        assert_eq!(p.forward(0.0), 0.0);
    }

    #[test]
    fn test_monotonic_and_bounded() {
        for peak in [100.0, 1000.0, 4000.0] {
            let p = ToneScaleParams::new(peak).unwrap();
            let mut prev = -1.0;
            for i in 0..200 {
                let y = i as f32 * 0.25;
                let out = p.forward(y);
                assert!(out >= prev, "not monotonic at {y}");
                assert!(out <= peak * 1.001, "{out} above peak {peak}");
                prev = out;
            }
        }
    }

    #[test]
    fn test_roundtrip() {
        let p = ToneScaleParams::new(1000.0).unwrap();
        for y in [0.001f32, 0.01, 0.18, 1.0, 4.0] {
            let out = p.forward(y) / REFERENCE_LUMINANCE;
            let back = p.inverse(out) / REFERENCE_LUMINANCE;
            assert!((back - y).abs() < 1e-3 * y.max(0.01), "{y} -> {out} -> {back}");
        }
    }

    #[test]
    fn test_inverse_clamps() {
        let p = ToneScaleParams::new(100.0).unwrap();
        assert_eq!(p.inverse(-1.0), 0.0);
        assert!(!p.inverse(1e6).is_nan());
    }
}
