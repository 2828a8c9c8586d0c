//! Color space conversions: HSV, CIE xyY, CIE uvY and CIE L*u*v*.
//!
//! ```text
//! RGB_TO_HSV   hue on [0, 1), sat on [0, 2), val may be negative
//! XYZ_TO_xyY   x = X / (X + Y + Z), y = Y / (X + Y + Z), Y
//! XYZ_TO_uvY   u' = 4X / (X + 15Y + 3Z), v' = 9Y / (X + 15Y + 3Z), Y
//! XYZ_TO_LUV   L* on [0, 1] for Y on [0, 1], D65 white
//! ```
//!
//! Zero divisors give zero instead of NaN.

use crate::shader::ShaderText;

// ============================================================================
// HSV
// ============================================================================

/// Largest saturation accepted by [`hsv_to_rgb`]. Close to 2 the RGB
/// result grows without bound.
const MAX_SAT: f32 = 1.999;

/// RGB to HSV, extended to negative values.
///
/// For non-negative (or all negative) RGB the saturation is on `[0, 1]`,
/// a mix of signs puts it on `[1, 2]`. Hue is on `[0, 1)` with 1 meaning
/// 360 degrees. On `[0, 1]` this is the classic formula.
#[inline]
pub fn rgb_to_hsv(rgb: [f32; 3]) -> [f32; 3] {
    let [red, grn, blu] = rgb;
    let rgb_min = red.min(grn).min(blu);
    let rgb_max = red.max(grn).max(blu);

    let mut val = rgb_max;
    let mut sat = 0.0;
    let mut hue = 0.0;

    if rgb_min != rgb_max {
        let delta = rgb_max - rgb_min;
        if rgb_max != 0.0 {
            sat = delta / rgb_max;
        }
        hue = if red == rgb_max {
            (grn - blu) / delta
        } else if grn == rgb_max {
            2.0 + (blu - red) / delta
        } else {
            4.0 + (red - grn) / delta
        };
        if hue < 0.0 {
            hue += 6.0;
        }
        hue *= 1.0 / 6.0;
    }

    if rgb_min < 0.0 {
        val += rgb_min;
    }
    if -rgb_min > rgb_max {
        sat = (rgb_max - rgb_min) / -rgb_min;
    }
    [hue, sat, val]
}

/// HSV to RGB. Hue wraps, saturation is clamped to `[0, 1.999]`.
#[inline]
pub fn hsv_to_rgb(hsv: [f32; 3]) -> [f32; 3] {
    let hue = (hsv[0] - hsv[0].floor()) * 6.0;
    let sat = hsv[1].clamp(0.0, MAX_SAT);
    let val = hsv[2];

    let red = ((hue - 3.0).abs() - 1.0).clamp(0.0, 1.0);
    let grn = (2.0 - (hue - 2.0).abs()).clamp(0.0, 1.0);
    let blu = (2.0 - (hue - 4.0).abs()).clamp(0.0, 1.0);

    let mut rgb_max = val;
    let mut rgb_min = val * (1.0 - sat);
    if sat > 1.0 {
        rgb_min = val * (1.0 - sat) / (2.0 - sat);
        rgb_max = val - rgb_min;
    }
    if val < 0.0 {
        rgb_min = val / (2.0 - sat);
        rgb_max = val - rgb_min;
    }

    let delta = rgb_max - rgb_min;
    [red * delta + rgb_min, grn * delta + rgb_min, blu * delta + rgb_min]
}

// ============================================================================
// xyY / uvY
// ============================================================================

/// CIE XYZ to xyY.
#[inline]
pub fn xyz_to_xyy(xyz: [f32; 3]) -> [f32; 3] {
    let [x, y, z] = xyz;
    let d = x + y + z;
    let d = if d == 0.0 { 0.0 } else { 1.0 / d };
    [x * d, y * d, y]
}

/// xyY to CIE XYZ.
#[inline]
pub fn xyy_to_xyz(xyy: [f32; 3]) -> [f32; 3] {
    let [x, y, big_y] = xyy;
    let d = if y == 0.0 { 0.0 } else { 1.0 / y };
    [big_y * x * d, big_y, big_y * (1.0 - x - y) * d]
}

/// CIE XYZ to u'v'Y.
#[inline]
pub fn xyz_to_uvy(xyz: [f32; 3]) -> [f32; 3] {
    let [x, y, z] = xyz;
    let d = x + 15.0 * y + 3.0 * z;
    let d = if d == 0.0 { 0.0 } else { 1.0 / d };
    [4.0 * x * d, 9.0 * y * d, y]
}

/// u'v'Y to CIE XYZ.
#[inline]
pub fn uvy_to_xyz(uvy: [f32; 3]) -> [f32; 3] {
    let [u, v, y] = uvy;
    let d = if v == 0.0 { 0.0 } else { 1.0 / v };
    [
        (9.0 / 4.0) * y * u * d,
        y,
        (3.0 / 4.0) * y * (4.0 - u - 6.666_666_666_666_667 * v) * d,
    ]
}

// ============================================================================
// L*u*v*
// ============================================================================

/// D65 white point and L* segment constants.
mod luv_d65 {
    pub const U_N: f32 = 0.197_830_01;
    pub const V_N: f32 = 0.468_319_99;
    pub const Y_BREAK: f32 = 0.008_856_451_679;
    pub const L_BREAK: f32 = 0.08;
    pub const KAPPA: f32 = 9.032_962_962_962_961;
    pub const INV_KAPPA: f32 = 0.110_705_645_987_945_39;
    pub const INV_L_SCALE: f32 = 0.862_068_965_517_241_4;
    pub const INV_13: f32 = 0.076_923_076_923_076_93;
}

/// CIE XYZ to L*u*v* with L* scaled to `[0, 1]`.
#[inline]
pub fn xyz_to_luv(xyz: [f32; 3]) -> [f32; 3] {
    use luv_d65::*;

    let [x, y, z] = xyz;
    let d = x + 15.0 * y + 3.0 * z;
    let d = if d == 0.0 { 0.0 } else { 1.0 / d };
    let u = 4.0 * x * d;
    let v = 9.0 * y * d;

    let l_star = if y <= Y_BREAK { KAPPA * y } else { 1.16 * y.powf(1.0 / 3.0) - 0.16 };
    [l_star, 13.0 * l_star * (u - U_N), 13.0 * l_star * (v - V_N)]
}

/// L*u*v* to CIE XYZ.
#[inline]
pub fn luv_to_xyz(luv: [f32; 3]) -> [f32; 3] {
    use luv_d65::*;

    let [l_star, u_star, v_star] = luv;
    let d = if l_star == 0.0 { 0.0 } else { INV_13 / l_star };
    let u = u_star * d + U_N;
    let v = v_star * d + V_N;

    let y = if l_star <= L_BREAK {
        INV_KAPPA * l_star
    } else {
        let tmp = (l_star + 0.16) * INV_L_SCALE;
        tmp * tmp * tmp
    };

    let dd = if v == 0.0 { 0.0 } else { 0.25 / v };
    [9.0 * y * u * dd, y, y * (12.0 - 3.0 * u - 20.0 * v) * dd]
}

// ============================================================================
// Shader
// ============================================================================

pub(super) fn emit_rgb_to_hsv(ss: &mut ShaderText, px: &str) {
    ss.line(format!("float minRGB = min( {px}.r, min( {px}.g, {px}.b ) );"));
    ss.line(format!("float maxRGB = max( {px}.r, max( {px}.g, {px}.b ) );"));
    ss.line("float val = maxRGB;");
    ss.line("float sat = 0.0, hue = 0.0;");
    ss.line("if (minRGB != maxRGB)");
    ss.line("{");
    ss.indent();
    ss.line("if (val != 0.0) sat = (maxRGB - minRGB) / val;");
    ss.line("float OneOverMaxMinusMin = 1.0 / (maxRGB - minRGB);");
    ss.line(format!("if ( maxRGB == {px}.r ) hue = ({px}.g - {px}.b) * OneOverMaxMinusMin;"));
    ss.line(format!(
        "else if ( maxRGB == {px}.g ) hue = 2.0 + ({px}.b - {px}.r) * OneOverMaxMinusMin;"
    ));
    ss.line(format!("else hue = 4.0 + ({px}.r - {px}.g) * OneOverMaxMinusMin;"));
    ss.line("if ( hue < 0.0 ) hue += 6.0;");
    ss.dedent();
    ss.line("}");
    ss.line("if ( minRGB < 0.0 ) val += minRGB;");
    ss.line("if ( -minRGB > maxRGB ) sat = (maxRGB - minRGB) / -minRGB;");
    ss.line(format!("{px}.r = hue * 1./6.; {px}.g = sat; {px}.b = val;"));
}

pub(super) fn emit_hsv_to_rgb(ss: &mut ShaderText, px: &str) {
    ss.line(format!("float Hue = ( {px}.r - floor( {px}.r ) ) * 6.0;"));
    ss.line(format!("float Sat = clamp( {px}.g, 0., {} );", MAX_SAT));
    ss.line(format!("float Val = {px}.b;"));
    ss.line("float R = abs(Hue - 3.0) - 1.0;");
    ss.line("float G = 2.0 - abs(Hue - 2.0);");
    ss.line("float B = 2.0 - abs(Hue - 4.0);");
    ss.line(format!("{} = {};", ss.float3_decl("RGB"), ss.float3_const("R", "G", "B")));
    ss.line("RGB = clamp( RGB, 0., 1. );");
    ss.line("float rgbMax = Val;");
    ss.line("float rgbMin = Val * (1.0 - Sat);");
    ss.line("if ( Sat > 1.0 )");
    ss.line("{");
    ss.indent();
    ss.line("rgbMin = Val * (1.0 - Sat) / (2.0 - Sat);");
    ss.line("rgbMax = Val - rgbMin;");
    ss.dedent();
    ss.line("}");
    ss.line("if ( Val < 0.0 )");
    ss.line("{");
    ss.indent();
    ss.line("rgbMin = Val / (2.0 - Sat);");
    ss.line("rgbMax = Val - rgbMin;");
    ss.dedent();
    ss.line("}");
    ss.line("RGB = RGB * (rgbMax - rgbMin) + rgbMin;");
    ss.line(format!("{px}.rgb = RGB;"));
}

pub(super) fn emit_xyz_to_xyy(ss: &mut ShaderText, px: &str) {
    ss.line(format!("float d = {px}.r + {px}.g + {px}.b;"));
    ss.line("d = (d == 0.) ? 0. : 1. / d;");
    ss.line(format!("{px}.b = {px}.g;"));
    ss.line(format!("{px}.r *= d;"));
    ss.line(format!("{px}.g *= d;"));
}

pub(super) fn emit_xyy_to_xyz(ss: &mut ShaderText, px: &str) {
    ss.line(format!("float d = ({px}.g == 0.) ? 0. : 1. / {px}.g;"));
    ss.line(format!("float Y = {px}.b;"));
    ss.line(format!("{px}.b = Y * (1. - {px}.r - {px}.g) * d;"));
    ss.line(format!("{px}.r *= Y * d;"));
    ss.line(format!("{px}.g = Y;"));
}

pub(super) fn emit_xyz_to_uvy(ss: &mut ShaderText, px: &str) {
    ss.line(format!("float d = {px}.r + 15. * {px}.g + 3. * {px}.b;"));
    ss.line("d = (d == 0.) ? 0. : 1. / d;");
    ss.line(format!("{px}.b = {px}.g;"));
    ss.line(format!("{px}.r *= 4. * d;"));
    ss.line(format!("{px}.g *= 9. * d;"));
}

pub(super) fn emit_uvy_to_xyz(ss: &mut ShaderText, px: &str) {
    ss.line(format!("float d = ({px}.g == 0.) ? 0. : 1. / {px}.g;"));
    ss.line(format!("float Y = {px}.b;"));
    ss.line(format!("{px}.b = (3./4.) * Y * (4. - {px}.r - 6.6666666666666667 * {px}.g) * d;"));
    ss.line(format!("{px}.r *= (9./4.) * Y * d;"));
    ss.line(format!("{px}.g = Y;"));
}

pub(super) fn emit_xyz_to_luv(ss: &mut ShaderText, px: &str) {
    ss.line(format!("float d = {px}.r + 15. * {px}.g + 3. * {px}.b;"));
    ss.line("d = (d == 0.) ? 0. : 1. / d;");
    ss.line(format!("float u = {px}.r * 4. * d;"));
    ss.line(format!("float v = {px}.g * 9. * d;"));
    ss.line(format!("float Y = {px}.g;"));
    let lstar = ss.lerp(
        "1.16 * pow( max(0., Y), 1./3. ) - 0.16",
        "9.0329629629629608 * Y",
        "float(Y <= 0.008856451679)",
    );
    ss.line(format!("float Lstar = {lstar};"));
    ss.line("float ustar = 13. * Lstar * (u - 0.19783001);");
    ss.line("float vstar = 13. * Lstar * (v - 0.46831999);");
    ss.line(format!("{px}.r = Lstar; {px}.g = ustar; {px}.b = vstar;"));
}

pub(super) fn emit_luv_to_xyz(ss: &mut ShaderText, px: &str) {
    ss.line(format!("float Lstar = {px}.r;"));
    ss.line("float d = (Lstar == 0.) ? 0. : 0.076923076923076927 / Lstar;");
    ss.line(format!("float u = {px}.g * d + 0.19783001;"));
    ss.line(format!("float v = {px}.b * d + 0.46831999;"));
    ss.line("float tmp = (Lstar + 0.16) * 0.86206896551724144;");
    let y = ss.lerp("tmp*tmp*tmp", "0.11070564598794539 * Lstar", "float(Lstar <= 0.08)");
    ss.line(format!("float Y = {y};"));
    ss.line("float dd = (v == 0.) ? 0. : 0.25 / v;");
    ss.line(format!("{px}.r = 9. * Y * u * dd;"));
    ss.line(format!("{px}.b = Y * (12. - 3. * u - 20. * v) * dd;"));
    ss.line(format!("{px}.g = Y;"));
}
