//! Shared constants, vector types and small helpers for the ACES 2 stages.

use vfx_math::glam::DMat3;
use vfx_math::primaries::to_rows_f32;

// ============================================================================
// Basic Types
// ============================================================================

/// 2D float array (J, M)
pub type F2 = [f32; 2];

/// 3D float array (RGB, JMh, Aab)
pub type F3 = [f32; 3];

/// 3x3 matrix in row-major order
pub type M33 = [f32; 9];

// ============================================================================
// Viewing Conditions
// ============================================================================

/// Reference luminance (cd/m²), the luminance of RGB 1.0
pub const REFERENCE_LUMINANCE: f32 = 100.0;

/// Adapting field luminance
pub const L_A: f32 = 100.0;

/// Background relative luminance
pub const Y_B: f32 = 20.0;

/// Dim surround `[F, c, Nc]`
pub const SURROUND: F3 = [0.9, 0.59, 0.9];

/// Weight of the red cone in the achromatic response
pub const RA: f32 = 2.0;

/// Weight of the blue cone in the achromatic response
pub const BA: f32 = 0.05;

/// Offset of the cone response compression
pub const CAM_NL_OFFSET: f32 = 27.13;

/// Scale of the cone response compression
pub const CAM_NL_SCALE: f32 = 400.0;

/// Exponent of the cone response compression
pub const CAM_NL_EXPONENT: f32 = 0.42;

/// Colorfulness scale `43 * Nc`
pub const M_SCALE: f32 = 43.0 * SURROUND[2];

// ============================================================================
// Chroma Compression Constants
// ============================================================================

/// Chroma compression strength at 100 nits
pub const CHROMA_COMPRESS: f32 = 2.4;

/// Growth of compression strength per decade of peak
pub const CHROMA_COMPRESS_FACT: f32 = 3.3;

/// Chroma expansion at 100 nits
pub const CHROMA_EXPAND: f32 = 1.3;

/// Reduction of expansion per decade of peak
pub const CHROMA_EXPAND_FACT: f32 = 0.69;

/// Expansion threshold, divided by the peak
pub const CHROMA_EXPAND_THR: f32 = 0.5;

// ============================================================================
// Gamut Compression Constants
// ============================================================================

/// Width of the smooth minimum blending the lower and upper hulls
pub const SMOOTH_CUSPS: f32 = 0.12;

/// Cusp colorfulness expansion paired with [`SMOOTH_CUSPS`]
pub const SMOOTH_M: f32 = 0.27;

/// Blend from cusp J toward mid J for the focus point
pub const CUSP_MID_BLEND: f32 = 1.3;

/// Blend from cusp J toward the J limit where the focus gain starts
pub const FOCUS_GAIN_BLEND: f32 = 0.3;

/// Exponent of the focus gain above the threshold
pub const FOCUS_ADJUST_GAIN: f32 = 0.55;

/// Focus distance at 100 nits
pub const FOCUS_DISTANCE: f32 = 1.35;

/// Growth of the focus distance per decade of peak
pub const FOCUS_DISTANCE_SCALING: f32 = 1.75;

/// Fraction of the gamut boundary below which colorfulness is untouched
pub const COMPRESSION_THRESHOLD: f32 = 0.75;

// ============================================================================
// Table Generation Constants
// ============================================================================

/// Lower end of the upper hull gamma search
pub const GAMMA_MINIMUM: f32 = 0.0;

/// Upper end of the upper hull gamma search
pub const GAMMA_MAXIMUM: f32 = 5.0;

/// Coarse step of the upper hull gamma search
pub const GAMMA_SEARCH_STEP: f32 = 0.4;

/// Bisection tolerance of the upper hull gamma search
pub const GAMMA_ACCURACY: f32 = 1e-5;

/// Relative J positions above the cusp used to fit the upper hull
pub const GAMMA_TEST_POSITIONS: [f32; 3] = [0.01, 0.5, 0.99];

/// Coarse step of the reach colorfulness search
pub const REACH_SEARCH_STEP: f32 = 50.0;

/// Largest colorfulness tried by the reach search
pub const REACH_SEARCH_LIMIT: f32 = 1300.0;

/// Bisection tolerance of the reach search
pub const REACH_ACCURACY: f32 = 1e-2;

/// Bisection tolerance along a cube edge when locating a cusp
pub const CUSP_EDGE_ACCURACY: f32 = 1e-7;

// ============================================================================
// Utility Functions
// ============================================================================

/// Wraps a hue in degrees to `[0, 360)`.
#[inline]
pub fn wrap_to_360(hue: f32) -> f32 {
    let y = hue % 360.0;
    if y < 0.0 { y + 360.0 } else { y }
}

/// Linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Linear interpolation for F3
#[inline]
pub fn lerp_f3(a: &F3, b: &F3, t: f32) -> F3 {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

/// Polynomial smooth minimum of width `s`.
#[inline]
pub fn smin(a: f32, b: f32, s: f32) -> f32 {
    let h = (s - (a - b).abs()).max(0.0) / s;
    a.min(b) - h * h * h * s * (1.0 / 6.0)
}

/// Multiplies F3 by a scalar.
#[inline]
pub fn mult_f_f3(v: f32, f: &F3) -> F3 {
    [v * f[0], v * f[1], v * f[2]]
}

/// `m * f` with `m` row-major.
#[inline]
pub fn mult_m33_f3(m: &M33, f: &F3) -> F3 {
    [
        m[0] * f[0] + m[1] * f[1] + m[2] * f[2],
        m[3] * f[0] + m[4] * f[1] + m[5] * f[2],
        m[6] * f[0] + m[7] * f[1] + m[8] * f[2],
    ]
}

/// Narrows a double precision matrix to row-major f32.
#[inline]
pub fn m33_from_dmat3(m: &DMat3) -> M33 {
    to_rows_f32(m)
}

/// True when any channel is negative.
#[inline]
pub fn any_below_zero(rgb: &F3) -> bool {
    rgb[0] < 0.0 || rgb[1] < 0.0 || rgb[2] < 0.0
}

/// True when any channel exceeds 1.
#[inline]
pub fn any_above_one(rgb: &F3) -> bool {
    rgb[0] > 1.0 || rgb[1] > 1.0 || rgb[2] > 1.0
}
