//! ACES 2 gamut compression.
//!
//! Colorfulness is compressed along a line in the J/M plane aimed at a
//! focus point on the achromatic axis. The gamut boundary along that line is
//! approximated analytically from the hue's cusp and two hull gammas; the
//! reach boundary comes from the reach table. Values below
//! [`COMPRESSION_THRESHOLD`] of the boundary pass through unchanged.

use tracing::debug;

use super::cam::{y_to_j, JMhParams};
use super::chroma::SharedCompressionParams;
use super::common::*;
use super::tables::{fill_upper_hull_gamma, make_gamut_cusp_table, HullFit, Table3D};
use super::tonescale::ToneScaleParams;

// ============================================================================
// Parameters
// ============================================================================

/// Gamut compression constants and the limiting gamut's cusp table.
#[derive(Debug, Clone)]
pub struct GamutCompressParams {
    /// J of display mid grey
    pub mid_j: f32,
    /// Distance of the focus point, scaled by `limit_j_max`
    pub focus_dist: f32,
    /// Inverse of the lower hull gamma
    pub lower_hull_gamma_inv: f32,
    /// Per-hue cusp J, cusp M and inverse upper hull gamma
    pub gamut_cusp_table: Table3D,
}

impl GamutCompressParams {
    /// Builds the parameters for `limit` primaries at the tonescale's peak.
    pub fn new(
        ts: &ToneScaleParams,
        input: &JMhParams,
        limit: &JMhParams,
        shared: &SharedCompressionParams,
    ) -> Self {
        let mid_j = y_to_j(ts.c_t * REFERENCE_LUMINANCE, input);
        let log_peak = (ts.n / ts.n_r).log10();
        let focus_dist = FOCUS_DISTANCE + FOCUS_DISTANCE * FOCUS_DISTANCE_SCALING * log_peak;
        let lower_hull_gamma = 1.14 + 0.07 * log_peak;

        let mut gamut_cusp_table = make_gamut_cusp_table(limit, ts.n);
        let fit = HullFit {
            peak_luminance: ts.n,
            limit_j_max: shared.limit_j_max,
            mid_j,
            focus_dist,
            lower_hull_gamma_inv: 1.0 / lower_hull_gamma,
        };
        fill_upper_hull_gamma(&mut gamut_cusp_table, &fit, limit);

        debug!(mid_j, focus_dist, lower_hull_gamma, "gamut compress params");

        Self {
            mid_j,
            focus_dist,
            lower_hull_gamma_inv: 1.0 / lower_hull_gamma,
            gamut_cusp_table,
        }
    }
}

// ============================================================================
// Boundary Geometry
// ============================================================================

/// Steepening of the compression line for J above the cusp.
pub fn get_focus_gain(j: f32, cusp_j: f32, limit_j_max: f32) -> f32 {
    let thr = lerp(cusp_j, limit_j_max, FOCUS_GAIN_BLEND);
    if j > thr {
        // Approximate inverse required above threshold
        let gain = (limit_j_max - thr) / (limit_j_max - limit_j_max.min(j)).max(0.0001);
        gain.log10().powf(1.0 / FOCUS_ADJUST_GAIN) + 1.0
    } else {
        1.0
    }
}

/// J where the compression line through `(j, m)` meets the achromatic axis.
pub fn solve_j_intersect(j: f32, m: f32, focus_j: f32, max_j: f32, slope_gain: f32) -> f32 {
    let a = m / (focus_j * slope_gain);
    if j < focus_j {
        let b = 1.0 - m / slope_gain;
        let c = -j;
        let root = (b * b - 4.0 * a * c).sqrt();
        2.0 * c / (-b - root)
    } else {
        let b = -(1.0 + m / slope_gain + max_j * m / (focus_j * slope_gain));
        let c = max_j * m / slope_gain + j;
        let root = (b * b - 4.0 * a * c).sqrt();
        2.0 * c / (-b + root)
    }
}

/// Slope dJ/dM of the compression line leaving the axis at `intersect_j`.
#[inline]
fn compression_slope(intersect_j: f32, focus_j: f32, max_j: f32, slope_gain: f32) -> f32 {
    if intersect_j < focus_j {
        intersect_j * (intersect_j - focus_j) / (focus_j * slope_gain)
    } else {
        (max_j - intersect_j) * (intersect_j - focus_j) / (focus_j * slope_gain)
    }
}

/// Approximate gamut boundary on the compression line through `jmh_s`.
///
/// Returns `[J_boundary, M_boundary, J_intersect]`. The lower and upper hull
/// estimates are joined with a smooth minimum around the cusp.
pub fn find_gamut_boundary_intersection(
    jmh_s: &F3,
    jm_cusp_in: &F2,
    j_focus: f32,
    j_max: f32,
    slope_gain: f32,
    gamma_top_inv: f32,
    gamma_bottom_inv: f32,
) -> F3 {
    let s = SMOOTH_CUSPS.max(0.000001);
    let jm_cusp = [jm_cusp_in[0], jm_cusp_in[1] * (1.0 + SMOOTH_M * s)];

    let j_intersect_source = solve_j_intersect(jmh_s[0], jmh_s[1], j_focus, j_max, slope_gain);
    let j_intersect_cusp = solve_j_intersect(jm_cusp[0], jm_cusp[1], j_focus, j_max, slope_gain);

    let slope = compression_slope(j_intersect_source, j_focus, j_max, slope_gain);

    let m_boundary_lower = j_intersect_cusp
        * (j_intersect_source / j_intersect_cusp).powf(gamma_bottom_inv)
        / (jm_cusp[0] / jm_cusp[1] - slope);
    let m_boundary_upper = jm_cusp[1] * (j_max - j_intersect_cusp)
        * ((j_max - j_intersect_source) / (j_max - j_intersect_cusp)).powf(gamma_top_inv)
        / (slope * jm_cusp[1] + j_max - jm_cusp[0]);
    let m_boundary = jm_cusp[1] * smin(m_boundary_lower / jm_cusp[1], m_boundary_upper / jm_cusp[1], s);
    let j_boundary = j_intersect_source + slope * m_boundary;

    [j_boundary, m_boundary, j_intersect_source]
}

/// Reach boundary on the compression line through `(j, m)`.
///
/// Returns `[j, M_reach, h]`.
pub fn get_reach_boundary(
    j: f32,
    m: f32,
    h: f32,
    cusp_j: f32,
    focus_j: f32,
    focus_dist: f32,
    shared: &SharedCompressionParams,
) -> F3 {
    let limit_j_max = shared.limit_j_max;
    let reach_max_m = shared.reach_m_table.lookup(h);
    let slope_gain = limit_j_max * focus_dist * get_focus_gain(j, cusp_j, limit_j_max);
    let intersect_j = solve_j_intersect(j, m, focus_j, limit_j_max, slope_gain);
    let slope = compression_slope(intersect_j, focus_j, limit_j_max, slope_gain);
    let boundary = limit_j_max * (intersect_j / limit_j_max).powf(shared.model_gamma) * reach_max_m
        / (limit_j_max - slope * reach_max_m);
    [j, boundary, h]
}

/// Reinhard-style compression of `v` above `thr`, reaching 1 at `lim`.
pub fn compression_function(v: f32, thr: f32, lim: f32, invert: bool) -> f32 {
    let s = (lim - thr) * (1.0 - thr) / (lim - 1.0);
    let nd = (v - thr) / s;

    if invert {
        if v < thr || lim <= 1.0001 || v > thr + s {
            v
        } else {
            thr + s * (-nd / (nd - 1.0))
        }
    } else if v < thr || lim <= 1.0001 {
        v
    } else {
        thr + s * nd / (1.0 + nd)
    }
}

// ============================================================================
// Compression
// ============================================================================

fn focus_j(cusp_j: f32, p: &GamutCompressParams, limit_j_max: f32) -> f32 {
    lerp(cusp_j, p.mid_j, (CUSP_MID_BLEND - cusp_j / limit_j_max).min(1.0))
}

fn compress_gamut(
    jmh: &F3,
    jx: f32,
    p: &GamutCompressParams,
    shared: &SharedCompressionParams,
    invert: bool,
) -> F3 {
    let [j, m, h] = *jmh;
    let limit_j_max = shared.limit_j_max;

    if m < 0.0001 || j > limit_j_max {
        return [j, 0.0, h];
    }

    let cusp = p.gamut_cusp_table.lookup(h);
    let jm_cusp = [cusp[0], cusp[1]];
    let focus_j = focus_j(cusp[0], p, limit_j_max);
    let slope_gain = limit_j_max * p.focus_dist * get_focus_gain(jx, cusp[0], limit_j_max);

    let boundary = find_gamut_boundary_intersection(
        jmh,
        &jm_cusp,
        focus_j,
        limit_j_max,
        slope_gain,
        cusp[2],
        p.lower_hull_gamma_inv,
    );
    if boundary[1] <= 0.0 {
        return [j, 0.0, h];
    }
    let project_to_j = boundary[2];

    let reach = get_reach_boundary(boundary[0], boundary[1], h, cusp[0], focus_j, p.focus_dist, shared);

    let difference = (reach[1] / boundary[1]).max(1.0001);
    let threshold = COMPRESSION_THRESHOLD.max(1.0 / difference);

    let v = compression_function(m / boundary[1], threshold, difference, invert);

    [
        project_to_j + v * (boundary[0] - project_to_j),
        v * boundary[1],
        h,
    ]
}

/// Compresses JMh toward the limiting gamut.
pub fn gamut_compress_fwd(jmh: &F3, p: &GamutCompressParams, shared: &SharedCompressionParams) -> F3 {
    compress_gamut(jmh, jmh[0], p, shared, false)
}

/// Inverse of [`gamut_compress_fwd`].
///
/// Below the focus gain threshold the inverse is exact. Above it the line
/// slope depends on the unknown source J, which is estimated with one extra
/// inverse pass.
pub fn gamut_compress_inv(jmh: &F3, p: &GamutCompressParams, shared: &SharedCompressionParams) -> F3 {
    let cusp = p.gamut_cusp_table.lookup(jmh[2]);
    let jx = jmh[0];
    if jx <= lerp(cusp[0], shared.limit_j_max, FOCUS_GAIN_BLEND) {
        compress_gamut(jmh, jx, p, shared, true)
    } else {
        let jx = compress_gamut(jmh, jx, p, shared, true)[0];
        compress_gamut(jmh, jx, p, shared, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aces2::chroma::SharedCompressionParams;
    use vfx_math::primaries::{ACES_AP0, ACES_AP1, REC709};

    fn setup(peak: f32) -> (GamutCompressParams, SharedCompressionParams) {
        let ts = ToneScaleParams::new(peak).unwrap();
        let input = JMhParams::new(&ACES_AP0).unwrap();
        let reach = JMhParams::new(&ACES_AP1).unwrap();
        let limit = JMhParams::new(&REC709).unwrap();
        let shared = SharedCompressionParams::new(peak, &input, &reach);
        (GamutCompressParams::new(&ts, &input, &limit, &shared), shared)
    }

    #[test]
    fn test_compression_function() {
        // Below threshold: identity
        assert_eq!(compression_function(0.5, 0.75, 1.2, false), 0.5);
        // Above threshold: compressed but monotone and below the limit
        let a = compression_function(0.9, 0.75, 1.2, false);
        let b = compression_function(1.1, 0.75, 1.2, false);
        assert!(a < 0.9 && b < 1.1 && a < b && b < 1.0);
        // Limit maps onto the boundary
        assert!((compression_function(1.2, 0.75, 1.2, false) - 1.0).abs() < 1e-5);
        // Inverse
        let back = compression_function(b, 0.75, 1.2, true);
        assert!((back - 1.1).abs() < 1e-4);
    }

    #[test]
    fn test_focus_gain() {
        assert_eq!(get_focus_gain(30.0, 60.0, 100.0), 1.0);
        assert!(get_focus_gain(95.0, 60.0, 100.0) > 1.0);
        assert!(get_focus_gain(100.0, 60.0, 100.0).is_finite());
    }

    #[test]
    fn test_j_intersect_on_axis() {
        // M = 0 means the point is already on the axis
        assert!((solve_j_intersect(40.0, 0.0, 50.0, 100.0, 135.0) - 40.0).abs() < 1e-4);
        assert!((solve_j_intersect(70.0, 0.0, 50.0, 100.0, 135.0) - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_in_gamut_unchanged() {
        let (p, shared) = setup(100.0);
        for h in [0.0f32, 45.0, 110.0, 200.0, 250.0, 320.0] {
            let cusp = p.gamut_cusp_table.lookup(h);
            let jmh = [cusp[0] * 0.7, 5.0, h];
            let out = gamut_compress_fwd(&jmh, &p, &shared);
            assert!((out[0] - jmh[0]).abs() < 1e-3, "J moved at hue {h}: {out:?}");
            assert!((out[1] - jmh[1]).abs() < 1e-3, "M moved at hue {h}: {out:?}");
            assert_eq!(out[2], h);
        }
    }

    #[test]
    fn test_out_of_gamut_compressed_and_inverted() {
        let (p, shared) = setup(100.0);
        for h in [20.0f32, 140.0, 260.0] {
            let cusp = p.gamut_cusp_table.lookup(h);
            let jmh = [cusp[0] * 0.8, cusp[1] * 1.3, h];
            let fwd = gamut_compress_fwd(&jmh, &p, &shared);
            assert!(fwd[1] < jmh[1], "no compression at hue {h}");
            let inv = gamut_compress_inv(&fwd, &p, &shared);
            assert!((inv[1] - jmh[1]).abs() < 1e-2 * jmh[1], "{jmh:?} -> {fwd:?} -> {inv:?}");
            assert!((inv[0] - jmh[0]).abs() < 1e-2 * jmh[0]);
        }
    }

    #[test]
    fn test_inverse_of_reach_boundary_stays_outside() {
        let (p, shared) = setup(100.0);
        let limit_j_max = shared.limit_j_max;
        let boundary_of = |jmh: &F3, cusp: &F3| {
            let fj = focus_j(cusp[0], &p, limit_j_max);
            let slope_gain = limit_j_max * p.focus_dist * get_focus_gain(jmh[0], cusp[0], limit_j_max);
            let b = find_gamut_boundary_intersection(
                jmh,
                &[cusp[0], cusp[1]],
                fj,
                limit_j_max,
                slope_gain,
                cusp[2],
                p.lower_hull_gamma_inv,
            );
            (b, fj)
        };
        for h in [30.0f32, 150.0, 270.0] {
            let cusp = p.gamut_cusp_table.lookup(h);
            let (b, fj) = boundary_of(&[cusp[0] * 0.6, cusp[1] * 0.5, h], &cusp);
            let reach = get_reach_boundary(b[0], b[1], h, cusp[0], fj, p.focus_dist, &shared);
            let on_reach = [b[0], reach[1], h];

            let (own, _) = boundary_of(&on_reach, &cusp);
            assert!(reach[1] > own[1], "hue {h}: reach {reach:?} inside {own:?}");
            let inv = gamut_compress_inv(&on_reach, &p, &shared);
            assert!(inv[1] >= on_reach[1] - 1e-3, "hue {h}: inverse shrank {on_reach:?} to {inv:?}");
            assert!(inv[1] > own[1], "hue {h}: {inv:?} inside boundary {own:?}");
        }
    }

    #[test]
    fn test_achromatic_and_over_limit() {
        let (p, shared) = setup(100.0);
        assert_eq!(gamut_compress_fwd(&[50.0, 0.0, 10.0], &p, &shared), [50.0, 0.0, 10.0]);
        let over = [shared.limit_j_max + 1.0, 20.0, 10.0];
        assert_eq!(gamut_compress_fwd(&over, &p, &shared)[1], 0.0);
    }
}
