//! Per-channel transfer curves: SMPTE ST 2084 (PQ), gamma-log and
//! double-log.
//!
//! All three are applied to each of R, G and B independently. PQ takes
//! linear values with 1.0 at 100 cd/m² and is mirrored around zero.

use crate::shader::{float_literal, ShaderText};

/// Smallest value fed to a logarithm in shader code.
const MIN_LOG_ARG: f32 = f32::MIN_POSITIVE;

// ============================================================================
// PQ
// ============================================================================

mod st2084 {
    pub const M1: f32 = 0.159_301_76;
    pub const M2: f32 = 78.843_75;
    pub const C1: f32 = 0.835_937_5;
    pub const C2: f32 = 18.851_562;
    pub const C3: f32 = 18.6875;
}

/// Linear (1.0 = 100 cd/m²) to PQ.
#[inline]
pub fn lin_to_pq(v: f32) -> f32 {
    use st2084::*;
    let y = (v * 0.01).abs().powf(M1);
    ((C1 + C2 * y) / (1.0 + C3 * y)).powf(M2).copysign(v)
}

/// PQ to linear (1.0 = 100 cd/m²).
#[inline]
pub fn pq_to_lin(v: f32) -> f32 {
    use st2084::*;
    let x = v.abs().powf(1.0 / M2);
    (100.0 * ((x - C1).max(0.0) / (C2 - C3 * x)).powf(1.0 / M1)).copysign(v)
}

pub(super) fn emit_pq(ss: &mut ShaderText, px: &str, forward: bool) {
    use st2084::*;
    let f3 = ss.float3_type();
    let rgb = format!("{px}.rgb");
    if forward {
        ss.line(format!("{f3} L = abs({rgb} * 0.01);"));
        ss.line(format!("{f3} y = pow(L, {});", ss.float3_splat(M1)));
        ss.line(format!(
            "{f3} ratpoly = ({} + {} * y) / (1. + {} * y);",
            float_literal(C1),
            float_literal(C2),
            float_literal(C3)
        ));
        ss.line(format!("{rgb} = sign({rgb}) * pow(ratpoly, {});", ss.float3_splat(M2)));
    } else {
        ss.line(format!("{f3} x = pow(abs({rgb}), {});", ss.float3_splat(1.0 / M2)));
        ss.line(format!(
            "x = max({}, x - {}) / ({} - {} * x);",
            ss.float3_splat(0.0f32),
            float_literal(C1),
            float_literal(C2),
            float_literal(C3)
        ));
        ss.line(format!("{rgb} = sign({rgb}) * 100. * pow(x, {});", ss.float3_splat(1.0 / M1)));
    }
}

// ============================================================================
// Gamma Log
// ============================================================================

/// Mirrored two segment curve: a power function below the break and a
/// logarithm above it.
///
/// ```text
/// E  = |in - mirror| + mirror
/// E' = E < break ? slope * (E + off)^power
///                : log_slope * log_base(lin_slope * E + lin_off) + log_off
/// out = copysign(E', in - mirror)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaLog {
    mirror: f32,
    break_point: f32,
    power: f32,
    slope: f32,
    off: f32,
    log_slope: f32,
    log_off: f32,
    lin_slope: f32,
    lin_off: f32,
    prime_break: f32,
    prime_mirror: f32,
}

impl GammaLog {
    /// From `[mirror, break, power, slope, off, base, log_slope, log_off,
    /// lin_slope, lin_off]`. The parameters must have been validated.
    pub fn new(params: &[f64]) -> Self {
        let p = |i: usize| params.get(i).copied().unwrap_or(1.0);
        let (mirror, break_point, power, slope, off) = (p(0), p(1), p(2), p(3), p(4));
        Self {
            mirror: mirror as f32,
            break_point: break_point as f32,
            power: power as f32,
            slope: slope as f32,
            off: off as f32,
            // slope against the natural logarithm
            log_slope: (p(6) / p(5).ln()) as f32,
            log_off: p(7) as f32,
            lin_slope: p(8) as f32,
            lin_off: p(9) as f32,
            prime_break: (slope * (break_point + off).powf(power)) as f32,
            prime_mirror: (slope * (mirror + off).powf(power)) as f32,
        }
    }

    /// Linear to gamma-log.
    #[inline]
    pub fn fwd(&self, v: f32) -> f32 {
        let mirror_in = v - self.mirror;
        let e = mirror_in.abs() + self.mirror;
        let e_prime = if e < self.break_point {
            self.slope * (e + self.off).powf(self.power)
        } else {
            self.log_slope * (self.lin_slope * e + self.lin_off).ln() + self.log_off
        };
        e_prime.copysign(mirror_in)
    }

    /// Gamma-log to linear.
    #[inline]
    pub fn inv(&self, v: f32) -> f32 {
        let mirror_in = v - self.prime_mirror;
        let e_prime = mirror_in.abs() + self.prime_mirror;
        let e = if e_prime < self.prime_break {
            (e_prime / self.slope).powf(1.0 / self.power) - self.off
        } else {
            (((e_prime - self.log_off) / self.log_slope).exp() - self.lin_off) / self.lin_slope
        };
        e.copysign(mirror_in)
    }

    pub(super) fn emit(&self, ss: &mut ShaderText, px: &str, forward: bool) {
        let f3 = ss.float3_type();
        let rgb = format!("{px}.rgb");
        let splat = |ss: &ShaderText, v: f32| ss.float3_splat(v);

        if forward {
            ss.line(format!("{f3} mirrorIn = {rgb} - {};", splat(ss, self.mirror)));
            ss.line(format!("{f3} E = abs(mirrorIn) + {};", splat(ss, self.mirror)));
            ss.line(format!(
                "{f3} gammaSeg = {} * pow(max({}, E + {}), {});",
                float_literal(self.slope),
                splat(ss, 0.0),
                float_literal(self.off),
                splat(ss, self.power)
            ));
            ss.line(format!(
                "{f3} logSeg = {} * log(max({}, {} * E + {})) + {};",
                float_literal(self.log_slope),
                splat(ss, MIN_LOG_ARG),
                float_literal(self.lin_slope),
                float_literal(self.lin_off),
                float_literal(self.log_off)
            ));
            let below = ss.float3_greater_than(splat(ss, self.break_point), "E");
            ss.line(format!("{rgb} = sign(mirrorIn) * {};", ss.lerp("logSeg", "gammaSeg", below)));
        } else {
            ss.line(format!("{f3} mirrorIn = {rgb} - {};", splat(ss, self.prime_mirror)));
            ss.line(format!("{f3} Eprime = abs(mirrorIn) + {};", splat(ss, self.prime_mirror)));
            ss.line(format!(
                "{f3} gammaSeg = pow(max({}, Eprime * {}), {}) - {};",
                splat(ss, 0.0),
                float_literal(1.0 / self.slope),
                splat(ss, 1.0 / self.power),
                float_literal(self.off)
            ));
            ss.line(format!(
                "{f3} logSeg = (exp((Eprime - {}) * {}) - {}) * {};",
                float_literal(self.log_off),
                float_literal(1.0 / self.log_slope),
                float_literal(self.lin_off),
                float_literal(1.0 / self.lin_slope)
            ));
            let below = ss.float3_greater_than(splat(ss, self.prime_break), "Eprime");
            ss.line(format!("{rgb} = sign(mirrorIn) * {};", ss.lerp("logSeg", "gammaSeg", below)));
        }
    }
}

// ============================================================================
// Double Log
// ============================================================================

/// `log_slope * log_base(lin_slope * x + lin_off) + log_off`, slope already
/// divided by `ln(base)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LogSegment {
    log_slope: f32,
    log_off: f32,
    lin_slope: f32,
    lin_off: f32,
}

impl LogSegment {
    fn new(ln_base: f64, p: [f64; 4]) -> Self {
        Self {
            log_slope: (p[0] / ln_base) as f32,
            log_off: p[1] as f32,
            lin_slope: p[2] as f32,
            lin_off: p[3] as f32,
        }
    }

    #[inline]
    fn fwd(&self, v: f32) -> f32 {
        self.log_slope * (self.lin_slope * v + self.lin_off).ln() + self.log_off
    }

    #[inline]
    fn inv(&self, v: f32) -> f32 {
        (((v - self.log_off) / self.log_slope).exp() - self.lin_off) / self.lin_slope
    }

    fn fwd_text(&self, ss: &ShaderText, x: &str) -> String {
        format!(
            "{} * log(max({}, {} * {x} + {})) + {}",
            float_literal(self.log_slope),
            ss.float3_splat(MIN_LOG_ARG),
            float_literal(self.lin_slope),
            float_literal(self.lin_off),
            float_literal(self.log_off)
        )
    }

    fn inv_text(&self, x: &str) -> String {
        format!(
            "(exp(({x} - {}) * {}) - {}) * {}",
            float_literal(self.log_off),
            float_literal(1.0 / self.log_slope),
            float_literal(self.lin_off),
            float_literal(1.0 / self.lin_slope)
        )
    }
}

/// Three segment curve: log below `break1`, linear up to `break2`, log
/// above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleLog {
    break1: f32,
    break2: f32,
    log1: LogSegment,
    log2: LogSegment,
    lin_slope: f32,
    lin_off: f32,
    prime_break1: f32,
    prime_break2: f32,
}

impl DoubleLog {
    /// From `[base, break1, break2, log1_slope, log1_off, log1_lin_slope,
    /// log1_lin_off, log2_slope, log2_off, log2_lin_slope, log2_lin_off,
    /// lin_slope, lin_off]`. The parameters must have been validated.
    pub fn new(params: &[f64]) -> Self {
        let p = |i: usize| params.get(i).copied().unwrap_or(1.0);
        let ln_base = p(0).ln();
        let log1 = LogSegment::new(ln_base, [p(3), p(4), p(5), p(6)]);
        let log2 = LogSegment::new(ln_base, [p(7), p(8), p(9), p(10)]);
        let (break1, break2) = (p(1) as f32, p(2) as f32);
        Self {
            break1,
            break2,
            log1,
            log2,
            lin_slope: p(11) as f32,
            lin_off: p(12) as f32,
            prime_break1: log1.fwd(break1),
            prime_break2: log2.fwd(break2),
        }
    }

    /// Linear to double-log.
    #[inline]
    pub fn fwd(&self, v: f32) -> f32 {
        if v < self.break1 {
            self.log1.fwd(v)
        } else if v < self.break2 {
            self.lin_slope * v + self.lin_off
        } else {
            self.log2.fwd(v)
        }
    }

    /// Double-log to linear.
    #[inline]
    pub fn inv(&self, v: f32) -> f32 {
        if v < self.prime_break1 {
            self.log1.inv(v)
        } else if v < self.prime_break2 {
            (v - self.lin_off) / self.lin_slope
        } else {
            self.log2.inv(v)
        }
    }

    pub(super) fn emit(&self, ss: &mut ShaderText, px: &str, forward: bool) {
        let f3 = ss.float3_type();
        let rgb = format!("{px}.rgb");
        ss.line(format!("{f3} v = {rgb};"));
        let (brk1, brk2) = if forward {
            ss.line(format!("{f3} seg1 = {};", self.log1.fwd_text(ss, "v")));
            ss.line(format!(
                "{f3} segLin = {} * v + {};",
                float_literal(self.lin_slope),
                float_literal(self.lin_off)
            ));
            ss.line(format!("{f3} seg2 = {};", self.log2.fwd_text(ss, "v")));
            (self.break1, self.break2)
        } else {
            ss.line(format!("{f3} seg1 = {};", self.log1.inv_text("v")));
            ss.line(format!(
                "{f3} segLin = (v - {}) * {};",
                float_literal(self.lin_off),
                float_literal(1.0 / self.lin_slope)
            ));
            ss.line(format!("{f3} seg2 = {};", self.log2.inv_text("v")));
            (self.prime_break1, self.prime_break2)
        };
        let below2 = ss.float3_greater_than(ss.float3_splat(brk2), "v");
        let below1 = ss.float3_greater_than(ss.float3_splat(brk1), "v");
        ss.line(format!("{rgb} = {};", ss.lerp("seg2", "segLin", below2)));
        ss.line(format!("{rgb} = {};", ss.lerp(&rgb, "seg1", below1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const GAMMA_LOG: [f64; 10] = [0.0, 0.25, 0.5, 1.0, 0.0, 10.0, 1.0, 1.102_06, 1.0, 0.0];
    const DOUBLE_LOG: [f64; 13] =
        [10.0, 0.25, 0.5, -1.0, 0.0, -1.0, 1.25, 1.0, 1.0, 1.0, 0.5, 1.0, 0.0];

    #[test]
    fn test_pq_reference_points() {
        // 10000 cd/m² is code 1, 100 cd/m² is about 0.508
        assert_abs_diff_eq!(lin_to_pq(100.0), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(lin_to_pq(1.0), 0.508_078, epsilon = 1e-4);
        assert_abs_diff_eq!(pq_to_lin(1.0), 100.0, epsilon = 1e-2);
        assert_eq!(lin_to_pq(-1.0), -lin_to_pq(1.0));
    }

    #[test]
    fn test_pq_roundtrip() {
        for v in [0.0f32, 1e-3, 0.01, 0.18, 1.0, 5.0, 40.0, 100.0, -0.5] {
            let back = pq_to_lin(lin_to_pq(v));
            assert!((back - v).abs() < 1e-4 * v.abs() + 1e-5, "{v} -> {back}");
        }
    }

    #[test]
    fn test_gamma_log() {
        let gl = GammaLog::new(&GAMMA_LOG);
        assert_abs_diff_eq!(gl.fwd(0.16), 0.4, epsilon = 1e-6);
        // segments meet at the break
        assert_abs_diff_eq!(gl.fwd(0.25), 0.5, epsilon = 1e-5);
        assert!(gl.fwd(1.0) > gl.fwd(0.5));
        // mirrored below zero
        assert_eq!(gl.fwd(-0.16), -gl.fwd(0.16));

        for v in [-0.4f32, -0.01, 0.0, 0.01, 0.1, 0.24, 0.3, 1.0, 8.0] {
            let back = gl.inv(gl.fwd(v));
            assert!((back - v).abs() < 1e-4 * v.abs() + 1e-5, "{v} -> {back}");
        }
    }

    #[test]
    fn test_double_log() {
        let dl = DoubleLog::new(&DOUBLE_LOG);
        assert_abs_diff_eq!(dl.fwd(0.3), 0.3, epsilon = 1e-7);
        assert_abs_diff_eq!(dl.fwd(0.5), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dl.fwd(0.0), -(1.25f32).log10(), epsilon = 1e-6);

        for v in [-1.0f32, 0.0, 0.1, 0.2, 0.3, 0.45, 0.5, 2.0, 50.0] {
            let back = dl.inv(dl.fwd(v));
            assert!((back - v).abs() < 1e-4 * v.abs() + 1e-5, "{v} -> {back}");
        }
    }
}
