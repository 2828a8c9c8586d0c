//! ACES look modifiers: red modifier, glow, surround and the reference
//! gamut compressor.
//!
//! ```text
//! RedMod03 / RedMod10   red pushed toward a pivot, weighted by a B-spline
//!                       hue window around red and by saturation
//! Glow03 / Glow10       saturation weighted gain below a mid level
//! DarkToDim10           rgb * Y^(gamma - 1), AP1 luminance weights
//! Rec2100Surround       rgb * Y^(gamma - 1), Rec.2100 luminance weights
//! GamutComp13           per-channel distance from max(rgb), compressed
//!                       between a threshold and a limit
//! ```

use crate::shader::ShaderText;

type Rgb = [f32; 3];

// ============================================================================
// Shared Weights
// ============================================================================

/// Cubic B-spline basis, one row per knot interval, highest power first.
const HUE_BSPLINE: [[f32; 4]; 4] = [
    [0.25, 0.00, 0.00, 0.00],
    [-0.75, 0.75, 0.75, 0.25],
    [0.75, -1.50, 0.00, 1.00],
    [-0.25, 0.75, -0.75, 0.25],
];

const NOISE_LIMIT: f32 = 1e-2;

/// `(max - min) / max`, protected against tiny and negative values.
#[inline]
fn sat_weight(rgb: Rgb) -> f32 {
    let min = rgb[0].min(rgb[1]).min(rgb[2]);
    let max = rgb[0].max(rgb[1]).max(rgb[2]);
    (max.max(1e-10) - min.max(1e-10)) / max.max(NOISE_LIMIT)
}

/// B-spline window centered on red, zero outside `inv_width`.
#[inline]
fn hue_weight(rgb: Rgb, inv_width: f32) -> f32 {
    let a = 2.0 * rgb[0] - (rgb[1] + rgb[2]);
    let b = 1.732_050_807_568_877_2 * (rgb[1] - rgb[2]);
    let knot = b.atan2(a) * inv_width + 2.0;
    let j = knot as i32;
    if (0..4).contains(&j) {
        let t = knot - j as f32;
        let c = &HUE_BSPLINE[j as usize];
        c[3] + t * (c[2] + t * (c[1] + t * c[0]))
    } else {
        0.0
    }
}

// ============================================================================
// Red Modifier
// ============================================================================

/// Red modifier constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedMod {
    one_minus_scale: f32,
    pivot: f32,
    inv_width: f32,
    restore_hue: bool,
}

impl RedMod {
    /// ACES 0.3 to 0.7: 120 degree window, hue restored afterwards.
    pub const V03: Self = Self {
        one_minus_scale: 0.15,
        pivot: 0.03,
        inv_width: 1.909_859_317_102_744_3,
        restore_hue: true,
    };

    /// ACES 1.0: 135 degree window.
    pub const V10: Self = Self {
        one_minus_scale: 0.18,
        pivot: 0.03,
        inv_width: 1.697_652_726_313_550_4,
        restore_hue: false,
    };

    /// Keeps the ratio of the middle channel between min and max.
    #[inline]
    fn restore(rgb: Rgb, new_red: f32) -> Rgb {
        let [red, grn, blu] = rgb;
        if grn >= blu {
            let hue_fac = (grn - blu) / (red - blu).max(1e-10);
            [new_red, hue_fac * (new_red - blu) + blu, blu]
        } else {
            let hue_fac = (blu - grn) / (red - grn).max(1e-10);
            [new_red, grn, hue_fac * (new_red - grn) + grn]
        }
    }

    /// Forward modifier.
    #[inline]
    pub fn fwd(&self, rgb: Rgb) -> Rgb {
        let f_h = hue_weight(rgb, self.inv_width);
        if f_h <= 0.0 {
            return rgb;
        }
        let f_s = sat_weight(rgb);
        let new_red = rgb[0] + f_h * f_s * (self.pivot - rgb[0]) * self.one_minus_scale;
        if self.restore_hue {
            Self::restore(rgb, new_red)
        } else {
            [new_red, rgb[1], rgb[2]]
        }
    }

    /// Inverse modifier. The forward is a quadratic in red when the
    /// saturation weight is expanded, this takes its lower root.
    #[inline]
    pub fn inv(&self, rgb: Rgb) -> Rgb {
        let f_h = hue_weight(rgb, self.inv_width);
        if f_h <= 0.0 {
            return rgb;
        }
        let s = self.one_minus_scale;
        let min_chan = rgb[1].min(rgb[2]);
        let a = f_h * s - 1.0;
        let b = rgb[0] - f_h * (self.pivot + min_chan) * s;
        let c = f_h * self.pivot * min_chan * s;
        let new_red = (-b - (b * b - 4.0 * a * c).max(0.0).sqrt()) / (2.0 * a);
        if self.restore_hue {
            Self::restore(rgb, new_red)
        } else {
            [new_red, rgb[1], rgb[2]]
        }
    }

    pub(super) fn emit(&self, ss: &mut ShaderText, px: &str, forward: bool) {
        let f4 = ss.float4_type();
        let f3 = ss.float3_type();

        ss.line(format!("float a = 2.0 * {px}.r - ({px}.g + {px}.b);"));
        ss.line(format!("float b = 1.7320508075688772 * ({px}.g - {px}.b);"));
        ss.line(format!("float hue = {};", ss.atan2("b", "a")));
        ss.line(format!(
            "float knot_coord = clamp(2. + hue * {}, 0., 4.);",
            crate::shader::float_literal(self.inv_width)
        ));
        ss.line("int j = int(min(knot_coord, 3.));");
        ss.line("float t = knot_coord - float(j);");
        ss.line(format!("{f4} monomials = {f4}(t*t*t, t*t, t, 1.);"));
        for (i, row) in HUE_BSPLINE.iter().enumerate() {
            ss.line(format!("{f4} m{i} = {};", ss.float4_const(row[0], row[1], row[2], row[3])));
        }
        ss.line(format!("{f4} coefs = {};", ss.lerp("m0", "m1", "float(j == 1)")));
        ss.line(format!("coefs = {};", ss.lerp("coefs", "m2", "float(j == 2)")));
        ss.line(format!("coefs = {};", ss.lerp("coefs", "m3", "float(j == 3)")));
        ss.line("float f_H = dot(coefs, monomials);");
        ss.blank();

        let pivot = crate::shader::float_literal(self.pivot);
        let oms = crate::shader::float_literal(self.one_minus_scale);
        let rgb = format!("{px}.rgb");

        if forward {
            ss.line(format!("{f3} maxval = max({rgb}, max({px}.gbr, {px}.brg));"));
            ss.line(format!("{f3} minval = min({rgb}, min({px}.gbr, {px}.brg));"));
            if self.restore_hue {
                ss.line("float oldChroma = max(1e-10, maxval.r - minval.r);");
                ss.line(format!("{f3} delta = {rgb} - minval;"));
            }
            ss.line("float f_S = ( max(1e-10, maxval.r) - max(1e-10, minval.r) ) / max(1e-2, maxval.r);");
            ss.line(format!("{px}.r = {px}.r + f_H * f_S * ({pivot} - {px}.r) * {oms};"));
            if self.restore_hue {
                ss.line(format!("{f3} maxval2 = max({rgb}, max({px}.gbr, {px}.brg));"));
                ss.line("float newChroma = maxval2.r - minval.r;");
                ss.line(format!("{rgb} = minval.r + delta * newChroma / oldChroma;"));
            }
        } else {
            ss.line("if (f_H > 0.)");
            ss.line("{");
            ss.indent();
            ss.line(format!("{f3} minval = min({rgb}, min({px}.gbr, {px}.brg));"));
            if self.restore_hue {
                ss.line(format!("{f3} maxval = max({rgb}, max({px}.gbr, {px}.brg));"));
                ss.line("float oldChroma = max(1e-10, maxval.r - minval.r);");
                ss.line(format!("{f3} delta = {rgb} - minval;"));
            }
            ss.line(format!("float ka = f_H * {oms} - 1.;"));
            ss.line(format!("float kb = {px}.r - f_H * ({pivot} + minval.r) * {oms};"));
            ss.line(format!("float kc = f_H * {pivot} * minval.r * {oms};"));
            ss.line(format!("{px}.r = ( -kb - sqrt( max(0., kb * kb - 4. * ka * kc) ) ) / ( 2. * ka );"));
            if self.restore_hue {
                ss.line(format!("{f3} maxval2 = max({rgb}, max({px}.gbr, {px}.brg));"));
                ss.line("float newChroma = maxval2.r - minval.r;");
                ss.line(format!("{rgb} = minval.r + delta * newChroma / oldChroma;"));
            }
            ss.dedent();
            ss.line("}");
        }
    }
}

// ============================================================================
// Glow
// ============================================================================

/// Glow gain and mid level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    /// Gain applied to saturated dark colors
    pub gain: f32,
    /// Luminance where the glow fades out
    pub mid: f32,
}

impl Glow {
    /// ACES 0.3 to 0.7 defaults.
    pub const V03: Self = Self { gain: 0.075, mid: 0.1 };

    /// ACES 1.0 defaults.
    pub const V10: Self = Self { gain: 0.05, mid: 0.08 };

    /// Overrides the defaults when `[gain, mid]` is given.
    pub fn with_params(self, params: &[f64]) -> Self {
        match params {
            [gain, mid] => Self { gain: *gain as f32, mid: *mid as f32 },
            _ => self,
        }
    }

    #[inline]
    fn yc(rgb: Rgb) -> f32 {
        let [r, g, b] = rgb;
        let chroma = (b * (b - g) + g * (g - r) + r * (r - b)).max(0.0).sqrt();
        (b + g + r + 1.75 * chroma) / 3.0
    }

    #[inline]
    fn gain_at(&self, rgb: Rgb) -> f32 {
        let x = (sat_weight(rgb) - 0.4) * 5.0;
        let t = (1.0 - 0.5 * x.abs()).max(0.0);
        let s = (1.0 + x.signum() * (1.0 - t * t)) * 0.5;
        self.gain * s
    }

    /// Forward glow.
    #[inline]
    pub fn fwd(&self, rgb: Rgb) -> Rgb {
        let yc = Self::yc(rgb);
        let gain = self.gain_at(rgb);
        let out = if yc >= self.mid * 2.0 {
            0.0
        } else if yc <= self.mid * 2.0 / 3.0 {
            gain
        } else {
            gain * (self.mid / yc - 0.5)
        };
        rgb.map(|v| v * (1.0 + out))
    }

    /// Inverse glow.
    #[inline]
    pub fn inv(&self, rgb: Rgb) -> Rgb {
        let yc = Self::yc(rgb);
        let gain = self.gain_at(rgb);
        let out = if yc >= self.mid * 2.0 {
            0.0
        } else if yc <= (1.0 + gain) * self.mid * 2.0 / 3.0 {
            -gain / (1.0 + gain)
        } else {
            gain * (self.mid / yc - 0.5) / (gain * 0.5 - 1.0)
        };
        rgb.map(|v| v * (1.0 + out))
    }

    pub(super) fn emit(&self, ss: &mut ShaderText, px: &str, forward: bool) {
        let f3 = ss.float3_type();
        let rgb = format!("{px}.rgb");
        ss.line(format!(
            "float chroma = sqrt( max(0., {px}.b * ({px}.b - {px}.g) + {px}.g * ({px}.g - {px}.r) + {px}.r * ({px}.r - {px}.b)) );"
        ));
        ss.line(format!("float YC = ({px}.b + {px}.g + {px}.r + 1.75 * chroma) / 3.;"));
        ss.line(format!("{f3} maxval = max({rgb}, max({px}.gbr, {px}.brg));"));
        ss.line(format!("{f3} minval = min({rgb}, min({px}.gbr, {px}.brg));"));
        ss.line("float sat = ( max(1e-10, maxval.r) - max(1e-10, minval.r) ) / max(1e-2, maxval.r);");
        ss.line("float x = (sat - 0.4) * 5.;");
        ss.line("float t = max( 0., 1. - 0.5 * abs(x) );");
        ss.line("float s = 0.5 * (1. + sign(x) * (1. - t * t));");
        ss.line(format!("float GlowGain = {} * s;", crate::shader::float_literal(self.gain)));
        ss.line(format!("float GlowMid = {};", crate::shader::float_literal(self.mid)));
        let out = if forward {
            ss.lerp("GlowGain", "GlowGain * (GlowMid / YC - 0.5)", "float( YC > GlowMid * 2. / 3. )")
        } else {
            ss.lerp(
                "-GlowGain / (1. + GlowGain)",
                "GlowGain * (GlowMid / YC - 0.5) / (GlowGain * 0.5 - 1.)",
                "float( YC > (1. + GlowGain) * GlowMid * 2. / 3. )",
            )
        };
        ss.line(format!("float glowGainOut = {out};"));
        ss.line(format!("glowGainOut = {};", ss.lerp("glowGainOut", "0.", "float( YC > GlowMid * 2. )")));
        ss.line(format!("{rgb} = {rgb} * glowGainOut + {rgb};"));
    }
}

// ============================================================================
// Surround
// ============================================================================

/// `rgb * Y^(gamma - 1)` with `Y` a weighted sum floored at `min_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surround {
    weights: Rgb,
    min_y: f32,
    gamma: f32,
}

impl Surround {
    const AP1_WEIGHTS: Rgb = [0.272_228_716_780_914_54, 0.674_081_765_811_148_3, 0.053_689_517_407_937_05];
    const REC2100_WEIGHTS: Rgb = [0.2627, 0.6780, 0.0593];

    /// ACES 1.0 dark to dim.
    pub fn dark_to_dim(forward: bool) -> Self {
        let gamma = if forward { 0.9811 } else { 1.019_264_091_326_062_7 };
        Self { weights: Self::AP1_WEIGHTS, min_y: 1e-10, gamma }
    }

    /// Rec.2100 surround with exponent `gamma`, or `1 / gamma` inverted.
    pub fn rec2100(gamma: f64, forward: bool) -> Self {
        let gamma = if forward { gamma } else { 1.0 / gamma };
        Self { weights: Self::REC2100_WEIGHTS, min_y: 1e-4, gamma: gamma as f32 }
    }

    /// Applies the surround factor.
    #[inline]
    pub fn apply(&self, rgb: Rgb) -> Rgb {
        let w = self.weights;
        let y = (w[0] * rgb[0] + w[1] * rgb[1] + w[2] * rgb[2]).max(self.min_y);
        let f = y.powf(self.gamma - 1.0);
        rgb.map(|v| v * f)
    }

    pub(super) fn emit(&self, ss: &mut ShaderText, px: &str) {
        let [wr, wg, wb] = self.weights.map(crate::shader::float_literal);
        ss.line(format!(
            "float Y = max( {}, {wr} * {px}.r + {wg} * {px}.g + {wb} * {px}.b );",
            crate::shader::float_literal(self.min_y)
        ));
        ss.line(format!(
            "float Ypow_over_Y = pow( Y, {} );",
            crate::shader::float_literal(self.gamma - 1.0)
        ));
        ss.line(format!("{px}.rgb = {px}.rgb * Ypow_over_Y;"));
    }
}

// ============================================================================
// Gamut Compression 1.3
// ============================================================================

/// Reference gamut compressor. Limits, thresholds and scales are per
/// channel: red is the cyan axis, green magenta, blue yellow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamutComp13 {
    thr: Rgb,
    scale: Rgb,
    power: f32,
}

impl GamutComp13 {
    /// From `[lim_cyan, lim_magenta, lim_yellow, thr_cyan, thr_magenta,
    /// thr_yellow, power]`. The parameters must have been validated.
    pub fn new(params: &[f64]) -> Self {
        let p = |i: usize| params.get(i).copied().unwrap_or(1.0) as f32;
        let power = p(6);
        // scale that puts the compressed limit at distance 1
        let scale = |lim: f32, thr: f32| {
            let span = lim - thr;
            span / (((1.0 - thr) / span).powf(-power) - 1.0).powf(1.0 / power)
        };
        let lim = [p(0), p(1), p(2)];
        let thr = [p(3), p(4), p(5)];
        Self {
            thr,
            scale: [scale(lim[0], thr[0]), scale(lim[1], thr[1]), scale(lim[2], thr[2])],
            power,
        }
    }

    #[inline]
    fn compress(&self, dist: f32, c: usize) -> f32 {
        let (thr, scale) = (self.thr[c], self.scale[c]);
        let nd = (dist - thr) / scale;
        let p = nd.powf(self.power);
        thr + scale * nd / (1.0 + p).powf(1.0 / self.power)
    }

    #[inline]
    fn uncompress(&self, dist: f32, c: usize) -> f32 {
        let (thr, scale) = (self.thr[c], self.scale[c]);
        if dist >= thr + scale {
            return dist;
        }
        let nd = (dist - thr) / scale;
        let p = nd.powf(self.power);
        thr + scale * (-(p / (p - 1.0))).powf(1.0 / self.power)
    }

    #[inline]
    fn run(&self, rgb: Rgb, f: impl Fn(f32, usize) -> f32) -> Rgb {
        let ach = rgb[0].max(rgb[1]).max(rgb[2]);
        if ach == 0.0 {
            return [0.0; 3];
        }
        let mut out = rgb;
        for (c, v) in out.iter_mut().enumerate() {
            let dist = (ach - *v) / ach.abs();
            if dist >= self.thr[c] {
                *v = ach - f(dist, c) * ach.abs();
            }
        }
        out
    }

    /// Compresses toward the achromatic axis.
    #[inline]
    pub fn fwd(&self, rgb: Rgb) -> Rgb {
        self.run(rgb, |d, c| self.compress(d, c))
    }

    /// Inverse of [`GamutComp13::fwd`].
    #[inline]
    pub fn inv(&self, rgb: Rgb) -> Rgb {
        self.run(rgb, |d, c| self.uncompress(d, c))
    }

    pub(super) fn emit(&self, ss: &mut ShaderText, px: &str, forward: bool) {
        let pwr = crate::shader::float_literal(self.power);
        let inv_pwr = crate::shader::float_literal(1.0 / self.power);
        ss.line(format!("float ach = max({px}.r, max({px}.g, {px}.b));"));
        ss.line("if (ach == 0.)");
        ss.line("{");
        ss.indent();
        ss.line(format!("{px}.rgb = {};", ss.float3_splat(0.0f32)));
        ss.dedent();
        ss.line("}");
        ss.line("else");
        ss.line("{");
        ss.indent();
        for (c, ch) in ["r", "g", "b"].iter().enumerate() {
            let thr = crate::shader::float_literal(self.thr[c]);
            let scl = crate::shader::float_literal(self.scale[c]);
            ss.line("{");
            ss.indent();
            ss.line(format!("float dist = (ach - {px}.{ch}) / abs(ach);"));
            ss.line(format!("float nd = max(0., dist - {thr}) / {scl};"));
            ss.line(format!("float p = pow(nd, {pwr});"));
            if forward {
                ss.line(format!(
                    "float cdist = (dist < {thr}) ? dist : {thr} + {scl} * nd / pow(1. + p, {inv_pwr});"
                ));
            } else {
                ss.line(format!(
                    "float cdist = (dist < {thr} || dist >= {thr} + {scl}) ? dist : {thr} + {scl} * pow(-(p / (p - 1.)), {inv_pwr});"
                ));
            }
            ss.line(format!("{px}.{ch} = ach - cdist * abs(ach);"));
            ss.dedent();
            ss.line("}");
        }
        ss.dedent();
        ss.line("}");
    }
}
