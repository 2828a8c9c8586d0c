//! Fast transcendentals on packed 4-lane floats.
//!
//! Polynomial approximations of `log2`, `exp2`, `pow`, `atan`, `atan2`,
//! `cos`, `sin` and `sincos`, each available three ways:
//!
//! - `sse_*` functions on raw `__m128` registers (x86/x86_64 only)
//! - `fast_*` scalar functions performing the same arithmetic lane by lane
//! - safe `*_x4` functions on `[f32; 4]` that use SSE2 when the target has
//!   it and the scalar path otherwise
//!
//! # Precision
//!
//! | function | method | mantissa bits |
//! |---|---|---|
//! | `log2` | degree-5 minimax on [1, 2) + exponent bits | ~15 |
//! | `exp2` | degree-4 minimax on [0, 1) + exponent bits | ~15 |
//! | `atan` | (5, 6) rational after reduction to [0, 1] | ~14 |
//! | `cos`  | degree-5 minimax in x² after reduction to [-π/2, π/2] | ~17 |
//!
//! # Special values
//!
//! These functions do not follow IEEE rules for NaN and ±Inf. `log2` of
//! zero or a negative number returns a finite garbage value, `pow` returns
//! 0 for any base `<= 0`, `exp2` returns 0 below -126 and +Inf at or above
//! 128. Callers that need IEEE semantics must branch around those inputs.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

// Chebyshev polynomial coefficients for log2() over [1.0, 2.0)
const PNLOG5: f32 = 4.487361286440374006195e-2;
const PNLOG4: f32 = -4.165637071209677112635e-1;
const PNLOG3: f32 = 1.631148826119436277100;
const PNLOG2: f32 = -3.550793018041176193407;
const PNLOG1: f32 = 5.091710879305474367557;
const PNLOG0: f32 = -2.800364054395965731506;

// Chebyshev polynomial coefficients for exp2() over [0.0, 1.0)
const PNEXP4: f32 = 1.353416792833547468620e-2;
const PNEXP3: f32 = 5.201146058412685018921e-2;
const PNEXP2: f32 = 2.414427569091865207710e-1;
const PNEXP1: f32 = 6.930038344665415134202e-1;
const PNEXP0: f32 = 1.000002593370603213644;

// Rational approximation of atan() over [0, 1]
const PN_ATAN_A1: f32 = 48.70107004404898384;
const PN_ATAN_A2: f32 = 49.5326263772254345;
const PN_ATAN_A3: f32 = 9.40604244231624;
const PN_ATAN_B1: f32 = 48.70107004404996166;
const PN_ATAN_B2: f32 = 65.7663163908956299;
const PN_ATAN_B3: f32 = 21.587934067020262;

// Chebyshev polynomial coefficients for cos() over [-pi/2, pi/2]
const PN_COS_C1: f32 = 0.999999953464;
const PN_COS_C2: f32 = -0.499999053455;
const PN_COS_C3: f32 = 0.0416635846769;
const PN_COS_C4: f32 = -0.0013853704264;
const PN_COS_C5: f32 = 0.00002315393167;

// 2^-14: below this squared reduced angle, sin(x) ~ x
const SINE_THRESHOLD_SQUARED: f32 = 0.00006103515625;

const EXP_MASK: u32 = 0x7F80_0000;
const EXP_BIAS: i32 = 127;
const EXP_SHIFT: i32 = 23;
const ONE_BITS: u32 = 0x3F80_0000;

const F_PI: f32 = std::f32::consts::PI;
const F_PI_2: f32 = std::f32::consts::FRAC_PI_2;
const F_1_PI: f32 = std::f32::consts::FRAC_1_PI;

/// Lowest argument for which `exp2` is not flushed to zero.
pub const EXP2_MIN_ARG: f32 = -126.0;
/// Argument at and above which `exp2` returns +Inf.
pub const EXP2_MAX_ARG: f32 = 128.0;

#[inline]
fn log2_poly(m: f32) -> f32 {
    ((((PNLOG5 * m + PNLOG4) * m + PNLOG3) * m + PNLOG2) * m + PNLOG1) * m + PNLOG0
}

#[inline]
fn exp2_poly(f: f32) -> f32 {
    (((PNEXP4 * f + PNEXP3) * f + PNEXP2) * f + PNEXP1) * f + PNEXP0
}

// ============================================================================
// Scalar versions
// ============================================================================

/// Fast log2 (scalar), same arithmetic as [`sse_log2`].
///
/// Only meaningful for positive finite inputs.
#[inline]
pub fn fast_log2(x: f32) -> f32 {
    let bits = x.to_bits();
    let mantissa = f32::from_bits((bits & !EXP_MASK) | ONE_BITS);
    let exponent = ((bits & EXP_MASK) >> EXP_SHIFT) as i32 - EXP_BIAS;
    log2_poly(mantissa) + exponent as f32
}

/// Fast exp2 (scalar), same arithmetic as [`sse_exp2`].
///
/// Integer arguments in `[-126, 127]` give exact powers of two.
#[inline]
pub fn fast_exp2(x: f32) -> f32 {
    if x < EXP2_MIN_ARG {
        return 0.0;
    }
    if x >= EXP2_MAX_ARG {
        return f32::INFINITY;
    }

    let floor_x = x.floor();
    let fraction = x - floor_x;
    let mexp = if fraction == 0.0 { 1.0 } else { exp2_poly(fraction) };

    let zf = f32::from_bits(((floor_x as i32 + EXP_BIAS) << EXP_SHIFT) as u32);
    zf * mexp
}

/// Fast power: `exp2(exp * log2(base))`, 0 for `base <= 0`.
#[inline]
pub fn fast_pow(base: f32, exp: f32) -> f32 {
    if !(base > 0.0) {
        return 0.0;
    }
    fast_exp2(exp * fast_log2(base))
}

/// Fast arc tangent (scalar), 14 bits of mantissa.
#[inline]
pub fn fast_atan(v: f32) -> f32 {
    let mut x = v;
    let neg = x < 0.0;
    if neg {
        x = -x;
    }
    let inv = x > 1.0;
    if inv {
        x = 1.0 / x;
    }

    let x2 = x * x;
    let num = x * (PN_ATAN_A1 + x2 * (PN_ATAN_A2 + x2 * PN_ATAN_A3));
    let denom = PN_ATAN_B1 + x2 * (PN_ATAN_B2 + x2 * (x2 + PN_ATAN_B3));
    let mut res = num / denom;

    if inv {
        res = F_PI_2 - res;
    }
    if neg {
        res = -res;
    }
    res
}

/// Fast two-argument arc tangent (scalar). `atan2(0, 0)` is 0.
#[inline]
pub fn fast_atan2(y: f32, x: f32) -> f32 {
    let res = if x == 0.0 && y == 0.0 { 0.0 } else { fast_atan(y / x) };
    if x.is_sign_negative() {
        if y.is_sign_negative() { res - F_PI } else { res + F_PI }
    } else {
        res
    }
}

/// Cosine plus the intermediate values shared with [`fast_sincos`]:
/// `(cos, reduced angle, reduced angle squared, sign flipped)`.
#[inline]
fn cos_reduce(x: f32) -> (f32, f32, f32, bool) {
    let cycles = (x * F_1_PI).round_ties_even() as i32;
    let xr = x - cycles as f32 * F_PI;
    let xr2 = xr * xr;
    let c = (((PN_COS_C5 * xr2 + PN_COS_C4) * xr2 + PN_COS_C3) * xr2 + PN_COS_C2) * xr2 + PN_COS_C1;
    let flip = cycles & 1 != 0;
    (if flip { -c } else { c }, xr, xr2, flip)
}

/// Fast cosine (scalar), 17 bits of mantissa.
#[inline]
pub fn fast_cos(x: f32) -> f32 {
    cos_reduce(x).0
}

/// Fast sine (scalar): `cos(pi/2 - x)`.
#[inline]
pub fn fast_sin(x: f32) -> f32 {
    fast_cos(F_PI_2 - x)
}

/// Fast sine and cosine from a single reduction. Returns `(sin, cos)`.
#[inline]
pub fn fast_sincos(x: f32) -> (f32, f32) {
    let (cos_x, xr, xr2, flip) = cos_reduce(x);
    let sin_x2 = if xr2 > SINE_THRESHOLD_SQUARED { 1.0 - cos_x * cos_x } else { xr2 };
    let sin_x = sin_x2.sqrt();
    let sin_x = if flip ^ xr.is_sign_negative() { -sin_x } else { sin_x };
    (sin_x, cos_x)
}

// ============================================================================
// SSE SIMD versions (x86/x86_64 only)
// ============================================================================

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod simd {
    use super::*;

    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn select(mask: __m128, if_true: __m128, if_false: __m128) -> __m128 {
        _mm_xor_ps(if_false, _mm_and_ps(mask, _mm_xor_ps(if_true, if_false)))
    }

    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn sign_mask() -> __m128 {
        _mm_castsi128_ps(_mm_set1_epi32(0x8000_0000u32 as i32))
    }

    /// SSE log2 - processes 4 floats at once.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sse_log2(x: __m128) -> __m128 {
        let emask = _mm_set1_epi32(EXP_MASK as i32);
        let ebias = _mm_set1_epi32(EXP_BIAS);
        let eone = _mm_set1_ps(1.0);

        // Mantissa in [1, 2)
        let m = _mm_or_ps(_mm_andnot_ps(_mm_castsi128_ps(emask), x), eone);

        let mut p = _mm_add_ps(_mm_mul_ps(_mm_set1_ps(PNLOG5), m), _mm_set1_ps(PNLOG4));
        p = _mm_add_ps(_mm_mul_ps(p, m), _mm_set1_ps(PNLOG3));
        p = _mm_add_ps(_mm_mul_ps(p, m), _mm_set1_ps(PNLOG2));
        p = _mm_add_ps(_mm_mul_ps(p, m), _mm_set1_ps(PNLOG1));
        p = _mm_add_ps(_mm_mul_ps(p, m), _mm_set1_ps(PNLOG0));

        let exponent = _mm_sub_epi32(
            _mm_srli_epi32(_mm_and_si128(_mm_castps_si128(x), emask), EXP_SHIFT),
            ebias,
        );

        _mm_add_ps(p, _mm_cvtepi32_ps(exponent))
    }

    /// SSE exp2 - processes 4 floats at once.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sse_exp2(x: __m128) -> __m128 {
        let ezero = _mm_setzero_ps();
        let eone = _mm_set1_ps(1.0);
        let ebias = _mm_set1_epi32(EXP_BIAS);

        // floor(x): truncation is one too high for negative non-integers
        let trunc = _mm_cvttps_epi32(x);
        let floor_x = _mm_add_epi32(
            trunc,
            _mm_castps_si128(_mm_cmplt_ps(x, _mm_cvtepi32_ps(trunc))),
        );

        let zf = _mm_castsi128_ps(_mm_slli_epi32(_mm_add_epi32(floor_x, ebias), EXP_SHIFT));

        let iexp = _mm_cvtepi32_ps(floor_x);
        let fraction = _mm_sub_ps(x, iexp);

        let mut p = _mm_add_ps(_mm_mul_ps(_mm_set1_ps(PNEXP4), fraction), _mm_set1_ps(PNEXP3));
        p = _mm_add_ps(_mm_mul_ps(p, fraction), _mm_set1_ps(PNEXP2));
        p = _mm_add_ps(_mm_mul_ps(p, fraction), _mm_set1_ps(PNEXP1));
        p = _mm_add_ps(_mm_mul_ps(p, fraction), _mm_set1_ps(PNEXP0));

        // SAFETY: sse2 is enabled on this function
        let mexp = unsafe { select(_mm_cmpeq_ps(fraction, ezero), eone, p) };
        let mut exp2 = _mm_mul_ps(zf, mexp);

        // Underflow
        exp2 = _mm_andnot_ps(_mm_cmplt_ps(x, _mm_set1_ps(EXP2_MIN_ARG)), exp2);

        // Overflow
        let overflow = _mm_cmpge_ps(x, _mm_set1_ps(EXP2_MAX_ARG));
        unsafe { select(overflow, _mm_set1_ps(f32::INFINITY), exp2) }
    }

    /// SSE power - processes 4 floats at once. Bases `<= 0` give 0.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sse_power(base: __m128, exp: __m128) -> __m128 {
        let ezero = _mm_setzero_ps();

        // SAFETY: calling sibling unsafe SSE functions within unsafe fn
        let values = unsafe { sse_log2(base) };
        let values = _mm_mul_ps(exp, values);
        let values = unsafe { sse_exp2(values) };

        _mm_and_ps(values, _mm_cmpgt_ps(base, ezero))
    }

    /// SSE arc tangent - processes 4 floats at once.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sse_atan(x: __m128) -> __m128 {
        let eone = _mm_set1_ps(1.0);
        // SAFETY: sse2 is enabled on this function
        let sign = unsafe { sign_mask() };

        let sign_x = _mm_and_ps(x, sign);
        let abs_x = _mm_andnot_ps(sign, x);

        // atan(x) = pi/2 - atan(1/x) reduces the domain to [0, 1]
        let inv_mask = _mm_cmpgt_ps(abs_x, eone);
        let inv_abs_x = _mm_div_ps(eone, abs_x);
        let norm_x = unsafe { select(inv_mask, inv_abs_x, abs_x) };
        let x2 = _mm_mul_ps(norm_x, norm_x);

        let mut num = _mm_add_ps(_mm_mul_ps(x2, _mm_set1_ps(PN_ATAN_A3)), _mm_set1_ps(PN_ATAN_A2));
        num = _mm_add_ps(_mm_mul_ps(num, x2), _mm_set1_ps(PN_ATAN_A1));
        num = _mm_mul_ps(num, norm_x);

        let mut denom = _mm_add_ps(x2, _mm_set1_ps(PN_ATAN_B3));
        denom = _mm_add_ps(_mm_mul_ps(denom, x2), _mm_set1_ps(PN_ATAN_B2));
        denom = _mm_add_ps(_mm_mul_ps(denom, x2), _mm_set1_ps(PN_ATAN_B1));

        let res = _mm_div_ps(num, denom);
        let res = unsafe { select(inv_mask, _mm_sub_ps(_mm_set1_ps(F_PI_2), res), res) };

        _mm_or_ps(sign_x, res)
    }

    /// SSE two-argument arc tangent. `atan2(0, 0)` is 0.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sse_atan2(y: __m128, x: __m128) -> __m128 {
        let ezero = _mm_setzero_ps();

        // SAFETY: calling sibling unsafe SSE functions within unsafe fn
        let res = unsafe { sse_atan(_mm_div_ps(y, x)) };

        let nonzero = _mm_or_ps(_mm_cmpneq_ps(x, ezero), _mm_cmpneq_ps(y, ezero));
        let res = _mm_and_ps(res, nonzero);

        // Quadrants 2 and 3: add pi carrying the sign of y
        let neg_x = _mm_castsi128_ps(_mm_srai_epi32(_mm_castps_si128(x), 31));
        let sign_y = _mm_and_ps(y, unsafe { sign_mask() });

        _mm_add_ps(res, _mm_and_ps(_mm_or_ps(sign_y, _mm_set1_ps(F_PI)), neg_x))
    }

    /// Cosine with the intermediates shared by [`sse_sincos`]:
    /// `(cos, reduced angle, reduced angle squared, flip mask)`.
    #[target_feature(enable = "sse2")]
    unsafe fn sse_cos_reduce(x: __m128) -> (__m128, __m128, __m128, __m128) {
        let cycles = _mm_cvtps_epi32(_mm_mul_ps(x, _mm_set1_ps(F_1_PI)));

        let xr = _mm_sub_ps(x, _mm_mul_ps(_mm_cvtepi32_ps(cycles), _mm_set1_ps(F_PI)));
        let xr2 = _mm_mul_ps(xr, xr);

        let mut c = _mm_add_ps(_mm_mul_ps(_mm_set1_ps(PN_COS_C5), xr2), _mm_set1_ps(PN_COS_C4));
        c = _mm_add_ps(_mm_mul_ps(c, xr2), _mm_set1_ps(PN_COS_C3));
        c = _mm_add_ps(_mm_mul_ps(c, xr2), _mm_set1_ps(PN_COS_C2));
        c = _mm_add_ps(_mm_mul_ps(c, xr2), _mm_set1_ps(PN_COS_C1));

        // Odd cycle count: angle in quadrant 2 or 3
        let flip = _mm_castsi128_ps(_mm_slli_epi32(cycles, 31));
        (_mm_xor_ps(c, flip), xr, xr2, flip)
    }

    /// SSE cosine - processes 4 floats at once.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sse_cos(x: __m128) -> __m128 {
        // SAFETY: calling sibling unsafe SSE functions within unsafe fn
        unsafe { sse_cos_reduce(x) }.0
    }

    /// SSE sine: `cos(pi/2 - x)`.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sse_sin(x: __m128) -> __m128 {
        // SAFETY: calling sibling unsafe SSE functions within unsafe fn
        unsafe { sse_cos(_mm_sub_ps(_mm_set1_ps(F_PI_2), x)) }
    }

    /// SSE sine and cosine from one reduction. Returns `(sin, cos)`.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sse_sincos(x: __m128) -> (__m128, __m128) {
        // SAFETY: calling sibling unsafe SSE functions within unsafe fn
        let (cos_x, xr, xr2, flip) = unsafe { sse_cos_reduce(x) };

        let sin_x2 = _mm_sub_ps(_mm_set1_ps(1.0), _mm_mul_ps(cos_x, cos_x));
        let use_cos = _mm_cmpgt_ps(xr2, _mm_set1_ps(SINE_THRESHOLD_SQUARED));
        let sin_x2 = unsafe { select(use_cos, sin_x2, xr2) };
        let sin_x = _mm_sqrt_ps(sin_x2);

        let xr_sign = _mm_and_ps(xr, unsafe { sign_mask() });
        let sin_x = _mm_xor_ps(sin_x, _mm_xor_ps(flip, xr_sign));
        (sin_x, cos_x)
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use simd::*;

// ============================================================================
// Safe 4-lane API
// ============================================================================

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
mod lanes {
    use super::*;

    #[inline]
    fn load(v: &[f32; 4]) -> __m128 {
        // SAFETY: sse2 is statically enabled and the array holds 4 floats
        unsafe { _mm_loadu_ps(v.as_ptr()) }
    }

    #[inline]
    fn store(v: __m128) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        // SAFETY: sse2 is statically enabled and `out` holds 4 floats
        unsafe { _mm_storeu_ps(out.as_mut_ptr(), v) };
        out
    }

    // SAFETY for every call below: sse2 is statically enabled for this target.

    #[inline]
    pub fn log2_x4(x: [f32; 4]) -> [f32; 4] {
        store(unsafe { sse_log2(load(&x)) })
    }

    #[inline]
    pub fn exp2_x4(x: [f32; 4]) -> [f32; 4] {
        store(unsafe { sse_exp2(load(&x)) })
    }

    #[inline]
    pub fn pow_x4(x: [f32; 4], y: [f32; 4]) -> [f32; 4] {
        store(unsafe { sse_power(load(&x), load(&y)) })
    }

    #[inline]
    pub fn atan_x4(x: [f32; 4]) -> [f32; 4] {
        store(unsafe { sse_atan(load(&x)) })
    }

    #[inline]
    pub fn atan2_x4(y: [f32; 4], x: [f32; 4]) -> [f32; 4] {
        store(unsafe { sse_atan2(load(&y), load(&x)) })
    }

    #[inline]
    pub fn cos_x4(x: [f32; 4]) -> [f32; 4] {
        store(unsafe { sse_cos(load(&x)) })
    }

    #[inline]
    pub fn sin_x4(x: [f32; 4]) -> [f32; 4] {
        store(unsafe { sse_sin(load(&x)) })
    }

    #[inline]
    pub fn sincos_x4(x: [f32; 4]) -> ([f32; 4], [f32; 4]) {
        let (s, c) = unsafe { sse_sincos(load(&x)) };
        (store(s), store(c))
    }
}

#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2")))]
mod lanes {
    use super::*;

    #[inline]
    pub fn log2_x4(x: [f32; 4]) -> [f32; 4] {
        x.map(fast_log2)
    }

    #[inline]
    pub fn exp2_x4(x: [f32; 4]) -> [f32; 4] {
        x.map(fast_exp2)
    }

    #[inline]
    pub fn pow_x4(x: [f32; 4], y: [f32; 4]) -> [f32; 4] {
        [
            fast_pow(x[0], y[0]),
            fast_pow(x[1], y[1]),
            fast_pow(x[2], y[2]),
            fast_pow(x[3], y[3]),
        ]
    }

    #[inline]
    pub fn atan_x4(x: [f32; 4]) -> [f32; 4] {
        x.map(fast_atan)
    }

    #[inline]
    pub fn atan2_x4(y: [f32; 4], x: [f32; 4]) -> [f32; 4] {
        [
            fast_atan2(y[0], x[0]),
            fast_atan2(y[1], x[1]),
            fast_atan2(y[2], x[2]),
            fast_atan2(y[3], x[3]),
        ]
    }

    #[inline]
    pub fn cos_x4(x: [f32; 4]) -> [f32; 4] {
        x.map(fast_cos)
    }

    #[inline]
    pub fn sin_x4(x: [f32; 4]) -> [f32; 4] {
        x.map(fast_sin)
    }

    #[inline]
    pub fn sincos_x4(x: [f32; 4]) -> ([f32; 4], [f32; 4]) {
        let mut s = [0.0f32; 4];
        let mut c = [0.0f32; 4];
        for i in 0..4 {
            (s[i], c[i]) = fast_sincos(x[i]);
        }
        (s, c)
    }
}

pub use lanes::{atan2_x4, atan_x4, cos_x4, exp2_x4, log2_x4, pow_x4, sin_x4, sincos_x4};

/// Applies `log2_x4` to the first three lanes, keeping lane 3.
#[inline]
pub fn log2_rgb(px: [f32; 4]) -> [f32; 4] {
    let r = log2_x4(px);
    [r[0], r[1], r[2], px[3]]
}

/// Applies `exp2_x4` to the first three lanes, keeping lane 3.
#[inline]
pub fn exp2_rgb(px: [f32; 4]) -> [f32; 4] {
    let r = exp2_x4(px);
    [r[0], r[1], r[2], px[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1.0 / 16384.0; // 2^-14

    fn rel_err(got: f32, want: f32) -> f32 {
        if want.abs() < 1.0 {
            (got - want).abs()
        } else {
            ((got - want) / want).abs()
        }
    }

    fn sweep(lo: f32, hi: f32, n: usize) -> impl Iterator<Item = f32> {
        (0..=n).map(move |i| lo + (hi - lo) * i as f32 / n as f32)
    }

    #[test]
    fn test_log2_precision() {
        let mut x = 1e-30f32;
        while x < 1e30 {
            let got = fast_log2(x);
            assert!(rel_err(got, x.log2()) < TOL, "log2({}) = {}", x, got);
            x *= 1.37;
        }
    }

    #[test]
    fn test_exp2_precision() {
        for x in sweep(-125.9, 127.9, 5000) {
            let got = fast_exp2(x);
            let want = x.exp2();
            assert!(((got - want) / want).abs() < TOL, "exp2({}) = {} vs {}", x, got, want);
        }
    }

    #[test]
    fn test_exp2_exact_integers() {
        for i in -126..=127 {
            assert_eq!(fast_exp2(i as f32), (i as f32).exp2(), "exp2({})", i);
        }
    }

    #[test]
    fn test_exp2_clamps() {
        assert_eq!(fast_exp2(EXP2_MAX_ARG), f32::INFINITY);
        assert!(fast_exp2(127.999).is_finite());
        assert_eq!(fast_exp2(-126.0001), 0.0);
        assert!(fast_exp2(-126.0) > 0.0);
        assert_eq!(fast_exp2(f32::NEG_INFINITY), 0.0);
        assert_eq!(fast_exp2(f32::INFINITY), f32::INFINITY);
    }

    #[test]
    fn test_fast_pow_basic() {
        let result = fast_pow(2.0, 3.0);
        assert!((result - 8.0).abs() < 0.01, "2^3 = {}", result);

        let result = fast_pow(0.757, 1.2);
        let expected = 0.757_f32.powf(1.2);
        let rel_error = (result - expected).abs() / expected;
        assert!(rel_error < 0.0001, "0.757^1.2: got {}, expected {}", result, expected);
    }

    #[test]
    fn test_fast_pow_edge_cases() {
        assert_eq!(fast_pow(0.0, 1.0), 0.0);
        assert_eq!(fast_pow(-1.0, 2.0), 0.0);
        assert_eq!(fast_pow(f32::NAN, 2.0), 0.0);
    }

    #[test]
    fn test_atan_precision() {
        for x in sweep(-50.0, 50.0, 4001) {
            let got = fast_atan(x);
            assert!((got - x.atan()).abs() < TOL, "atan({}) = {}", x, got);
        }
        assert!((fast_atan(f32::INFINITY) - F_PI_2).abs() < 1e-6);
        assert!((fast_atan(f32::NEG_INFINITY) + F_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_atan_monotonic() {
        let mut prev = fast_atan(-100.0);
        for x in sweep(-100.0, 100.0, 20000).skip(1) {
            let v = fast_atan(x);
            assert!(v >= prev, "atan not monotonic at {}", x);
            prev = v;
        }
    }

    #[test]
    fn test_atan2_quadrants() {
        assert_eq!(fast_atan2(0.0, 0.0), 0.0);
        for deg in (-179..=179).step_by(7) {
            let a = (deg as f32).to_radians();
            let (y, x) = (a.sin() * 3.0, a.cos() * 3.0);
            let got = fast_atan2(y, x);
            assert!((got - y.atan2(x)).abs() < TOL, "atan2 at {} deg: {}", deg, got);
        }
    }

    #[test]
    fn test_cos_sin_precision() {
        for x in sweep(-20.0, 20.0, 8001) {
            assert!((fast_cos(x) - x.cos()).abs() < TOL, "cos({})", x);
            assert!((fast_sin(x) - x.sin()).abs() < TOL, "sin({})", x);
        }
    }

    #[test]
    fn test_sincos_precision() {
        for x in sweep(-20.0, 20.0, 8001).chain([0.0, 1e-5, -1e-5, F_PI, -F_PI]) {
            let (s, c) = fast_sincos(x);
            assert!((s - x.sin()).abs() < 4.0 * TOL, "sincos sin({}) = {}", x, s);
            assert!((c - x.cos()).abs() < TOL, "sincos cos({}) = {}", x, c);
        }
    }

    #[test]
    fn test_lanes_match_scalar() {
        let inputs = [[0.01f32, 0.5, 1.0, 7.25], [123.0, 1e-20, 3.0e7, 0.999]];
        for x in inputs {
            let l = log2_x4(x);
            let e = exp2_x4(x.map(|v| v.min(100.0) - 20.0));
            for i in 0..4 {
                assert!(rel_err(l[i], fast_log2(x[i])) < TOL);
                let xe = x[i].min(100.0) - 20.0;
                assert!(rel_err(e[i], fast_exp2(xe)) < TOL);
            }
        }

        let angles = [-3.0f32, -0.25, 0.0001, 2.5];
        let (s, c) = sincos_x4(angles);
        let cs = cos_x4(angles);
        let ss = sin_x4(angles);
        let at = atan_x4(angles);
        let at2 = atan2_x4(angles, [-1.0, 2.0, 0.0, -0.5]);
        for i in 0..4 {
            let (fs, fc) = fast_sincos(angles[i]);
            assert!((s[i] - fs).abs() < TOL && (c[i] - fc).abs() < TOL);
            assert!((cs[i] - fast_cos(angles[i])).abs() < TOL);
            assert!((ss[i] - fast_sin(angles[i])).abs() < TOL);
            assert!((at[i] - fast_atan(angles[i])).abs() < TOL);
        }
        assert!((at2[0] - (-3.0f32).atan2(-1.0)).abs() < TOL);
        assert!((at2[2] - F_PI_2).abs() < TOL);
        assert_eq!(atan2_x4([0.0; 4], [0.0; 4]), [0.0; 4]);
    }

    #[test]
    fn test_lanes_exp2_boundaries() {
        let r = exp2_x4([EXP2_MAX_ARG, 127.5, -126.0, -126.5]);
        assert_eq!(r[0], f32::INFINITY);
        assert!(r[1].is_finite());
        assert!(r[2] > 0.0);
        assert_eq!(r[3], 0.0);
        let p = pow_x4([-1.0, 0.0, 4.0, 9.0], [2.0, 2.0, 0.5, 0.5]);
        assert_eq!(p[0], 0.0);
        assert_eq!(p[1], 0.0);
        assert!((p[2] - 2.0).abs() < 1e-3 && (p[3] - 3.0).abs() < 1e-3);
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[test]
    fn test_sse_power() {
        if !is_x86_feature_detected!("sse2") {
            return;
        }

        unsafe {
            let base = _mm_setr_ps(0.5, 0.75, 0.9, 1.0);
            let exp = _mm_set1_ps(1.2);
            let result = sse_power(base, exp);

            let mut out = [0.0f32; 4];
            _mm_storeu_ps(out.as_mut_ptr(), result);

            for i in 0..4 {
                let base_val: f32 = [0.5, 0.75, 0.9, 1.0][i];
                let expected = base_val.powf(1.2);
                let rel_error = (out[i] - expected).abs() / expected;
                assert!(rel_error < 0.001, "SSE power {}^1.2: got {}", base_val, out[i]);
            }
        }
    }
}
