//! CAM16-derived appearance model.
//!
//! Converts between linear RGB in a given set of primaries and JMh
//! (lightness, colorfulness, hue in degrees). RGB 1.0 is
//! [`REFERENCE_LUMINANCE`] cd/m².
//!
//! ```text
//! RGB -> cone (matrix, adaptation) -> compressed cone -> Aab -> JMh
//! ```
//!
//! The opponent axes are computed so that three equal cone responses give
//! `a == 0` and `b == 0` exactly. The RGB/cone matrices are applied as a
//! neutral gain on green plus the red and blue differences, so equal RGB
//! gives equal cones and back again. Neutrals stay exactly neutral through
//! a round trip.

use tracing::debug;
use vfx_math::glam::{DMat3, DVec3};
use vfx_math::primaries::{rgb_to_xyz_matrix, xyz_to_rgb_matrix, CAM16_ACES};
use vfx_math::Primaries;

use super::common::*;
use crate::{ColorError, ColorResult};

// ============================================================================
// JMh Parameters
// ============================================================================

/// Per-primaries constants of the appearance model.
#[derive(Debug, Clone)]
pub struct JMhParams {
    /// RGB to adapted cone space, including the reference luminance scale
    /// and the diagonal adaptation `D_RGB`
    pub matrix_rgb_to_cam16_c: M33,
    /// Inverse of `matrix_rgb_to_cam16_c`
    pub matrix_cam16_c_to_rgb: M33,
    /// Row sum of `matrix_rgb_to_cam16_c`, identical for all rows
    pub neutral_gain: f32,
    /// White point XYZ scaled to the reference luminance
    pub xyz_w: F3,
    /// Luminance level adaptation factor
    pub f_l: f32,
    /// Base exponential nonlinearity
    pub z: f32,
    /// `c * z`, the exponent from achromatic response to J
    pub cz: f32,
    /// Achromatic response of the adopted white
    pub a_w: f32,
    /// Achromatic response of Y = 100 on the luminance-only path
    pub a_w_j: f32,
}

impl JMhParams {
    /// Builds the model constants for RGB in `primaries`.
    pub fn new(primaries: &Primaries) -> ColorResult<Self> {
        let rgb_to_xyz = rgb_to_xyz_matrix(primaries).ok_or_else(|| {
            ColorError::DegeneratePrimaries(format!("{primaries:?} have no RGB to XYZ matrix"))
        })?;
        let xyz_to_cam16 = xyz_to_rgb_matrix(&CAM16_ACES)
            .ok_or_else(|| ColorError::DegeneratePrimaries("CAM16 cone primaries".into()))?;

        let xyz_w = rgb_to_xyz * DVec3::splat(REFERENCE_LUMINANCE as f64);
        let y_w = xyz_w.y;
        let rgb_w = xyz_to_cam16 * xyz_w;

        // Viewing condition dependent parameters
        let k = 1.0 / (5.0 * L_A + 1.0);
        let k4 = k.powi(4);
        let n = Y_B / y_w as f32;
        let f_l = 0.2 * k4 * (5.0 * L_A) + 0.1 * (1.0 - k4).powi(2) * (5.0 * L_A).powf(1.0 / 3.0);
        let z = 1.48 + n.sqrt();

        let d_rgb = DVec3::splat(y_w) / rgb_w;
        let rgb_wc = d_rgb * rgb_w;
        let rgb_aw = [
            panlrc_forward(rgb_wc.x as f32, f_l),
            panlrc_forward(rgb_wc.y as f32, f_l),
            panlrc_forward(rgb_wc.z as f32, f_l),
        ];
        let a_w = RA * rgb_aw[0] + rgb_aw[1] + BA * rgb_aw[2];

        let f_l_w = f_l.powf(CAM_NL_EXPONENT);
        let a_w_j = CAM_NL_SCALE * f_l_w / (CAM_NL_OFFSET + f_l_w);

        let to_cone: DMat3 = DMat3::from_diagonal(d_rgb)
            * (xyz_to_cam16 * rgb_to_xyz)
            * REFERENCE_LUMINANCE as f64;
        if to_cone.determinant().abs() < 1e-12 {
            return Err(ColorError::DegeneratePrimaries(format!(
                "{primaries:?} give a singular cone matrix"
            )));
        }

        debug!(f_l, z, a_w, a_w_j, "JMh params");

        Ok(Self {
            matrix_rgb_to_cam16_c: m33_from_dmat3(&to_cone),
            matrix_cam16_c_to_rgb: m33_from_dmat3(&to_cone.inverse()),
            neutral_gain: y_w as f32,
            xyz_w: [xyz_w.x as f32, xyz_w.y as f32, xyz_w.z as f32],
            f_l,
            z,
            cz: SURROUND[1] * z,
            a_w,
            a_w_j,
        })
    }
}

// ============================================================================
// Cone Response Compression
// ============================================================================

/// Post-adaptation nonlinear response compression.
///
/// Uses IEEE `copysign`, so `+0.0` maps to `+0.0` and `-0.0` to `-0.0`.
#[inline]
pub fn panlrc_forward(v: f32, f_l: f32) -> f32 {
    let f_l_v = (f_l * v.abs() / REFERENCE_LUMINANCE).powf(CAM_NL_EXPONENT);
    CAM_NL_SCALE * 1.0f32.copysign(v) * f_l_v / (CAM_NL_OFFSET + f_l_v)
}

/// Inverse of [`panlrc_forward`], defined for `|v| < 400`.
#[inline]
pub fn panlrc_inverse(v: f32, f_l: f32) -> f32 {
    let a = v.abs();
    1.0f32.copysign(v) * REFERENCE_LUMINANCE / f_l
        * (CAM_NL_OFFSET * a / (CAM_NL_SCALE - a)).powf(1.0 / CAM_NL_EXPONENT)
}

// ============================================================================
// Luminance Path
// ============================================================================

/// Luminance in cd/m² to J, skipping the chromatic part of the model.
#[inline]
pub fn y_to_j(y: f32, p: &JMhParams) -> f32 {
    let f_l_y = (p.f_l * y.abs() / REFERENCE_LUMINANCE).powf(CAM_NL_EXPONENT);
    let a = CAM_NL_SCALE * f_l_y / (CAM_NL_OFFSET + f_l_y);
    1.0f32.copysign(y) * 100.0 * (a / p.a_w_j).powf(p.cz)
}

/// J to luminance in cd/m², inverse of [`y_to_j`].
#[inline]
pub fn j_to_y(j: f32, p: &JMhParams) -> f32 {
    let a = p.a_w_j * (j.abs() / 100.0).powf(1.0 / p.cz);
    1.0f32.copysign(j) * REFERENCE_LUMINANCE / p.f_l
        * (CAM_NL_OFFSET * a / (CAM_NL_SCALE - a)).powf(1.0 / CAM_NL_EXPONENT)
}

// ============================================================================
// RGB <-> Aab <-> JMh
// ============================================================================

/// `m * v` for a matrix whose rows all sum to `gain`, written so that
/// `v = (x, x, x)` gives exactly `(gain * x, gain * x, gain * x)`.
#[inline]
fn mult_neutral_split(m: &M33, gain: f32, v: &F3) -> F3 {
    let dr = v[0] - v[1];
    let db = v[2] - v[1];
    let n = gain * v[1];
    [
        n + m[0] * dr + m[2] * db,
        n + m[3] * dr + m[5] * db,
        n + m[6] * dr + m[8] * db,
    ]
}

/// Compressed cone responses to achromatic and opponent axes.
#[inline]
pub(crate) fn cone_to_aab(c: &F3) -> F3 {
    let [r, g, b] = *c;
    [
        RA * r + g + BA * b,
        (r - g) + (b - g) / 11.0,
        ((r - b) + (g - b)) / 9.0,
    ]
}

/// Achromatic and opponent axes back to compressed cone responses.
#[inline]
pub(crate) fn aab_to_cone(aab: &F3) -> F3 {
    let [a_c, a, b] = *aab;
    [
        (460.0 * a_c + 451.0 * a + 288.0 * b) / 1403.0,
        (460.0 * a_c - 891.0 * a - 261.0 * b) / 1403.0,
        (460.0 * a_c - 220.0 * a - 6300.0 * b) / 1403.0,
    ]
}

/// RGB to the intermediate `(A, a, b)` representation.
pub fn rgb_to_aab(rgb: &F3, p: &JMhParams) -> F3 {
    let m = mult_neutral_split(&p.matrix_rgb_to_cam16_c, p.neutral_gain, rgb);
    cone_to_aab(&[
        panlrc_forward(m[0], p.f_l),
        panlrc_forward(m[1], p.f_l),
        panlrc_forward(m[2], p.f_l),
    ])
}

/// `(A, a, b)` to JMh.
pub fn aab_to_jmh(aab: &F3, p: &JMhParams) -> F3 {
    let [a_c, a, b] = *aab;
    let j = 1.0f32.copysign(a_c) * 100.0 * (a_c.abs() / p.a_w).powf(p.cz);
    let m = if j == 0.0 { 0.0 } else { M_SCALE * a.hypot(b) };
    let h = wrap_to_360(b.atan2(a).to_degrees());
    [j, m, h]
}

/// JMh to `(A, a, b)`.
pub fn jmh_to_aab(jmh: &F3, p: &JMhParams) -> F3 {
    let [j, m, h] = *jmh;
    let scale = m / M_SCALE;
    let a_c = 1.0f32.copysign(j) * p.a_w * (j.abs() / 100.0).powf(1.0 / p.cz);
    let (sin_h, cos_h) = h.to_radians().sin_cos();
    [a_c, scale * cos_h, scale * sin_h]
}

/// `(A, a, b)` to RGB.
pub fn aab_to_rgb(aab: &F3, p: &JMhParams) -> F3 {
    let c = aab_to_cone(aab);
    let m = [
        panlrc_inverse(c[0], p.f_l),
        panlrc_inverse(c[1], p.f_l),
        panlrc_inverse(c[2], p.f_l),
    ];
    mult_neutral_split(&p.matrix_cam16_c_to_rgb, 1.0 / p.neutral_gain, &m)
}

/// RGB to JMh.
#[inline]
pub fn rgb_to_jmh(rgb: &F3, p: &JMhParams) -> F3 {
    aab_to_jmh(&rgb_to_aab(rgb, p), p)
}

/// JMh to RGB.
#[inline]
pub fn jmh_to_rgb(jmh: &F3, p: &JMhParams) -> F3 {
    aab_to_rgb(&jmh_to_aab(jmh, p), p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfx_math::primaries::{ACES_AP0, ACES_AP1, REC709};

    #[test]
    fn test_params_ap0() {
        let p = JMhParams::new(&ACES_AP0).unwrap();
        assert!((p.xyz_w[1] - 100.0).abs() < 1e-3);
        assert!((p.f_l - 0.7937).abs() < 1e-3, "F_L = {}", p.f_l);
        assert!((p.z - (1.48 + 0.2f32.sqrt())).abs() < 1e-5);
        assert!(p.a_w > 0.0 && p.a_w_j > 0.0);
    }

    #[test]
    fn test_degenerate_primaries() {
        let p = Primaries { r: (0.3, 0.3), g: (0.3, 0.3), b: (0.2, 0.1), w: (0.3127, 0.329) };
        assert!(matches!(JMhParams::new(&p), Err(ColorError::DegeneratePrimaries(_))));
    }

    #[test]
    fn test_white_is_j_100() {
        for prims in [ACES_AP0, ACES_AP1, REC709] {
            let p = JMhParams::new(&prims).unwrap();
            let jmh = rgb_to_jmh(&[1.0, 1.0, 1.0], &p);
            assert!((jmh[0] - 100.0).abs() < 1e-2, "J of white = {}", jmh[0]);
            assert!(jmh[1] < 1e-2, "M of white = {}", jmh[1]);
            assert!((y_to_j(100.0, &p) - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_rgb_jmh_roundtrip() {
        let p = JMhParams::new(&ACES_AP0).unwrap();
        let samples = [
            [0.5, 0.3, 0.2],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.18, 0.18, 0.18],
            [4.0, 2.0, 0.5],
            [-0.02, 0.1, 0.3],
        ];
        for rgb in samples {
            let jmh = rgb_to_jmh(&rgb, &p);
            let back = jmh_to_rgb(&jmh, &p);
            for i in 0..3 {
                assert!(
                    (rgb[i] - back[i]).abs() < 1e-4 * rgb[i].abs().max(1.0),
                    "roundtrip of {rgb:?} gave {back:?}"
                );
            }
        }
    }

    #[test]
    fn test_black() {
        let p = JMhParams::new(&ACES_AP1).unwrap();
        assert_eq!(rgb_to_jmh(&[0.0; 3], &p), [0.0, 0.0, 0.0]);
        assert_eq!(jmh_to_rgb(&[0.0, 0.0, 0.0], &p), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_equal_cones_have_no_chroma() {
        for x in [0.0f32, 1e-3, 0.7, 123.456] {
            let aab = cone_to_aab(&[x, x, x]);
            assert_eq!(aab[1], 0.0);
            assert_eq!(aab[2], 0.0);
        }
    }

    #[test]
    fn test_equal_rgb_stays_neutral() {
        let p = JMhParams::new(&ACES_AP0).unwrap();
        for x in [1e-3f32, 0.18, 1.0, 7.5] {
            let aab = rgb_to_aab(&[x, x, x], &p);
            assert_eq!(aab[1], 0.0);
            assert_eq!(aab[2], 0.0);
            let back = aab_to_rgb(&aab, &p);
            assert_eq!(back[0], back[1]);
            assert_eq!(back[1], back[2]);
        }
    }

    #[test]
    fn test_cone_aab_inverse() {
        let c = [12.0, -3.5, 40.0];
        let back = aab_to_cone(&cone_to_aab(&c));
        for i in 0..3 {
            assert!((c[i] - back[i]).abs() < 1e-3, "{c:?} -> {back:?}");
        }
    }

    #[test]
    fn test_luminance_path() {
        let p = JMhParams::new(&ACES_AP0).unwrap();
        for y in [0.01f32, 1.0, 18.0, 100.0, 1000.0] {
            let j = y_to_j(y, &p);
            let back = j_to_y(j, &p);
            assert!((back - y).abs() < 1e-3 * y.max(1.0), "{y} -> {j} -> {back}");
        }
        // Luminance-only path agrees with the full model on neutrals
        let jmh = rgb_to_jmh(&[0.18, 0.18, 0.18], &p);
        assert!((jmh[0] - y_to_j(18.0, &p)).abs() < 1e-2);
        assert_eq!(y_to_j(-18.0, &p), -y_to_j(18.0, &p));
    }

    #[test]
    fn test_panlrc_roundtrip() {
        let f_l = 0.7937;
        for v in [-250.0f32, -1.0, 0.5, 30.0, 5000.0] {
            let c = panlrc_forward(v, f_l);
            assert!(c.abs() < CAM_NL_SCALE);
            let back = panlrc_inverse(c, f_l);
            assert!((back - v).abs() < 1e-3 * v.abs().max(1.0), "{v} -> {back}");
        }
        assert_eq!(panlrc_forward(0.0, f_l), 0.0);
    }
}
