//! ACES 2 tonescale and chroma compression.
//!
//! The tonescale runs on luminance (J -> Y -> Y' -> J'). Colorfulness is
//! then rescaled with the lightness change and rolled off with two toe
//! curves: one that expands toward a saturation limit in the shadows and one
//! that compresses toward the reach boundary.

use tracing::debug;

use super::cam::{j_to_y, y_to_j, JMhParams};
use super::common::*;
use super::tables::{make_reach_m_table, Table1D};
use super::tonescale::ToneScaleParams;

// ============================================================================
// Parameters
// ============================================================================

/// Values used by both chroma and gamut compression.
#[derive(Debug, Clone)]
pub struct SharedCompressionParams {
    /// J of the peak luminance
    pub limit_j_max: f32,
    /// Exponent relating colorfulness to lightness changes
    pub model_gamma: f32,
    /// Reach gamut colorfulness at `limit_j_max` per hue
    pub reach_m_table: Table1D,
}

impl SharedCompressionParams {
    /// Builds the shared values for a peak, with `input` the encoding model
    /// and `reach` the model of the reach gamut (AP1).
    pub fn new(peak_luminance: f32, input: &JMhParams, reach: &JMhParams) -> Self {
        let limit_j_max = y_to_j(peak_luminance, input);
        let model_gamma = 1.0 / (SURROUND[1] * (1.48 + (Y_B / L_A).sqrt()));
        Self {
            limit_j_max,
            model_gamma,
            reach_m_table: make_reach_m_table(reach, limit_j_max),
        }
    }
}

/// Chroma compression strengths for one peak luminance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromaCompressParams {
    /// Shadow expansion strength
    pub sat: f32,
    /// Shadow expansion threshold
    pub sat_thr: f32,
    /// Highlight compression strength
    pub compr: f32,
    /// Scale of the hue normalization series
    pub chroma_compress_scale: f32,
}

impl ChromaCompressParams {
    /// Derives the strengths from the tonescale's peak.
    pub fn new(ts: &ToneScaleParams) -> Self {
        let log_peak = (ts.n / ts.n_r).log10();
        let compr = CHROMA_COMPRESS + CHROMA_COMPRESS * CHROMA_COMPRESS_FACT * log_peak;
        let sat = (CHROMA_EXPAND - CHROMA_EXPAND * CHROMA_EXPAND_FACT * log_peak).max(0.2);
        let sat_thr = CHROMA_EXPAND_THR / ts.n;
        let chroma_compress_scale = (0.03379 * ts.n).powf(0.30596) - 0.45135;
        debug!(compr, sat, sat_thr, chroma_compress_scale, "chroma compress params");
        Self { sat, sat_thr, compr, chroma_compress_scale }
    }
}

// ============================================================================
// Toe
// ============================================================================

/// Smooth toe below `limit`; identity above it.
#[inline]
pub fn toe_fwd(x: f32, limit: f32, k1_in: f32, k2_in: f32) -> f32 {
    if x > limit {
        return x;
    }
    let k2 = k2_in.max(0.001);
    let k1 = (k1_in * k1_in + k2 * k2).sqrt();
    let k3 = (limit + k1) / (limit + k2);
    let minus_b = k3 * x - k1;
    0.5 * (minus_b + (minus_b * minus_b + 4.0 * k2 * k3 * x).sqrt())
}

/// Inverse of [`toe_fwd`].
#[inline]
pub fn toe_inv(x: f32, limit: f32, k1_in: f32, k2_in: f32) -> f32 {
    if x > limit {
        return x;
    }
    let k2 = k2_in.max(0.001);
    let k1 = (k1_in * k1_in + k2 * k2).sqrt();
    let k3 = (limit + k1) / (limit + k2);
    (x * x + k1 * x) / (k3 * (x + k2))
}

// ============================================================================
// Hue Normalization
// ============================================================================

/// Colorfulness normalization for a hue: a third-order Fourier series fit to
/// the reach gamut, times `scale`.
pub fn chroma_compress_norm(h: f32, scale: f32) -> f32 {
    let (b, a) = h.to_radians().sin_cos();
    let cos_hr2 = a * a - b * b;
    let sin_hr2 = 2.0 * a * b;
    let cos_hr3 = 4.0 * a * a * a - 3.0 * a;
    let sin_hr3 = 3.0 * b - 4.0 * b * b * b;

    let m = 11.34072 * a
        + 16.46899 * cos_hr2
        + 7.88380 * cos_hr3
        + 14.66441 * b
        - 6.37224 * sin_hr2
        + 9.19364 * sin_hr3
        + 77.12896;

    m * scale
}

// ============================================================================
// Tonescale + Chroma Compression
// ============================================================================

/// Applies the tonescale to J and compresses M accordingly.
pub fn tonescale_chroma_compress_fwd(
    jmh: &F3,
    p: &JMhParams,
    ts: &ToneScaleParams,
    shared: &SharedCompressionParams,
    pc: &ChromaCompressParams,
) -> F3 {
    let [j, m, h] = *jmh;

    let y = j_to_y(j, p) / REFERENCE_LUMINANCE;
    let j_ts = y_to_j(ts.forward(y), p);

    let mut m_cp = m;
    if m != 0.0 && j != 0.0 {
        let nj = j_ts / shared.limit_j_max;
        let snj = (1.0 - nj).max(0.0);
        let m_norm = chroma_compress_norm(h, pc.chroma_compress_scale);
        let limit = nj.powf(shared.model_gamma) * shared.reach_m_table.lookup(h) / m_norm;

        m_cp = m * (j_ts / j).powf(shared.model_gamma) / m_norm;
        m_cp = limit - toe_fwd(limit - m_cp, limit - 0.001, snj * pc.sat, (nj * nj + pc.sat_thr).sqrt());
        m_cp = toe_fwd(m_cp, limit, nj * pc.compr, snj);
        m_cp *= m_norm;
    }

    [j_ts, m_cp, h]
}

/// Inverse of [`tonescale_chroma_compress_fwd`].
pub fn tonescale_chroma_compress_inv(
    jmh: &F3,
    p: &JMhParams,
    ts: &ToneScaleParams,
    shared: &SharedCompressionParams,
    pc: &ChromaCompressParams,
) -> F3 {
    let [j_ts, m_cp, h] = *jmh;

    let y_ts = j_to_y(j_ts, p) / REFERENCE_LUMINANCE;
    let j = y_to_j(ts.inverse(y_ts), p);

    let mut m = m_cp;
    if m_cp != 0.0 && j != 0.0 {
        let nj = j_ts / shared.limit_j_max;
        let snj = (1.0 - nj).max(0.0);
        let m_norm = chroma_compress_norm(h, pc.chroma_compress_scale);
        let limit = nj.powf(shared.model_gamma) * shared.reach_m_table.lookup(h) / m_norm;

        m = m_cp / m_norm;
        m = toe_inv(m, limit, nj * pc.compr, snj);
        m = limit - toe_inv(limit - m, limit - 0.001, snj * pc.sat, (nj * nj + pc.sat_thr).sqrt());
        m *= m_norm;
        m *= (j_ts / j).powf(-shared.model_gamma);
    }

    [j, m, h]
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfx_math::primaries::{ACES_AP0, ACES_AP1};

    #[test]
    fn test_toe_passthrough_and_roundtrip() {
        assert_eq!(toe_fwd(1.5, 1.0, 0.1, 0.1), 1.5);
        for x in [0.0f32, 0.1, 0.3, 0.5, 0.7, 0.9] {
            let f = toe_fwd(x, 1.0, 0.2, 0.1);
            let back = toe_inv(f, 1.0, 0.2, 0.1);
            assert!((x - back).abs() < 1e-5, "{x} -> {f} -> {back}");
        }
        // The toe pins the limit
        assert!((toe_fwd(1.0, 1.0, 0.2, 0.1) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_norm_positive() {
        let ts = ToneScaleParams::new(100.0).unwrap();
        let pc = ChromaCompressParams::new(&ts);
        for i in 0..360 {
            let n = chroma_compress_norm(i as f32, pc.chroma_compress_scale);
            assert!(n > 0.0, "norm at hue {i} = {n}");
        }
    }

    #[test]
    fn test_params_by_peak() {
        let sdr = ChromaCompressParams::new(&ToneScaleParams::new(100.0).unwrap());
        assert!((sdr.compr - 2.4).abs() < 1e-6);
        assert!((sdr.sat - 1.3).abs() < 1e-6);
        let hdr = ChromaCompressParams::new(&ToneScaleParams::new(1000.0).unwrap());
        assert!(hdr.compr > sdr.compr);
        assert!(hdr.sat < sdr.sat && hdr.sat >= 0.2);
    }

    #[test]
    fn test_fwd_inv_roundtrip() {
        let p = JMhParams::new(&ACES_AP0).unwrap();
        let reach = JMhParams::new(&ACES_AP1).unwrap();
        let ts = ToneScaleParams::new(1000.0).unwrap();
        let shared = SharedCompressionParams::new(1000.0, &p, &reach);
        let pc = ChromaCompressParams::new(&ts);

        for jmh in [[40.0f32, 20.0, 30.0], [60.0, 5.0, 200.0], [25.0, 35.0, 300.0], [70.0, 0.0, 90.0]] {
            let fwd = tonescale_chroma_compress_fwd(&jmh, &p, &ts, &shared, &pc);
            assert!(fwd[1] >= 0.0);
            let back = tonescale_chroma_compress_inv(&fwd, &p, &ts, &shared, &pc);
            assert!((back[0] - jmh[0]).abs() < 1e-2, "{jmh:?} -> {fwd:?} -> {back:?}");
            assert!((back[1] - jmh[1]).abs() < 1e-2 * jmh[1].max(1.0), "{jmh:?} -> {back:?}");
            assert_eq!(back[2], jmh[2]);
        }
    }

    #[test]
    fn test_achromatic_stays_achromatic() {
        let p = JMhParams::new(&ACES_AP0).unwrap();
        let reach = JMhParams::new(&ACES_AP1).unwrap();
        let ts = ToneScaleParams::new(100.0).unwrap();
        let shared = SharedCompressionParams::new(100.0, &p, &reach);
        let pc = ChromaCompressParams::new(&ts);
        let out = tonescale_chroma_compress_fwd(&[50.0, 0.0, 0.0], &p, &ts, &shared, &pc);
        assert_eq!(out[1], 0.0);
        assert!(out[0] > 0.0 && out[0] < shared.limit_j_max);
    }
}
