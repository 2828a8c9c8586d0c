//! ACES 2 output transform stages.
//!
//! The CPU path calls straight into [`vfx_color::aces2`]. The GPU path emits
//! one helper function per model stage, specialized with the baked
//! constants, and uploads the hue tables as textures:
//!
//! ```text
//! texture            channels  texel i
//! <prefix>_reach_m   R         reach M at limit J, hue i - 1
//! <prefix>_cusp      RGB       cusp J, cusp M, upper hull gamma, hue i - 1
//! ```
//!
//! Both are 362 texels wide and sampled with linear filtering at
//! `(h + 1.5) / 362`, which reproduces the CPU table interpolation.

use vfx_color::aces2::{
    gamut_compress_fwd, gamut_compress_inv, jmh_to_rgb, limiting_primaries, rgb_to_jmh,
    tonescale_chroma_compress_fwd, tonescale_chroma_compress_inv, Aces2Params,
    ChromaCompressParams, JMhParams, OutputTransform, SharedCompressionParams, Table1D, Table3D,
    ToneScaleParams, CAM_NL_EXPONENT, CAM_NL_OFFSET, CAM_NL_SCALE, COMPRESSION_THRESHOLD,
    CUSP_MID_BLEND, F3, FOCUS_ADJUST_GAIN, FOCUS_GAIN_BLEND, M_SCALE, REFERENCE_LUMINANCE,
    SMOOTH_CUSPS, SMOOTH_M, TABLE_TOTAL_SIZE,
};
use vfx_math::primaries::{ACES_AP0, ACES_AP1};

use crate::shader::{
    float_literal, resource_name, Interpolation, ShaderBuilder, ShaderText, TextureChannels,
    TextureDesc,
};
use crate::OpsResult;

const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;
const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;
const LOG10_E: f32 = std::f32::consts::LOG10_E;

/// Tonescale and chroma compression state for one peak.
#[derive(Debug, Clone)]
pub struct ToneScaleCompress {
    input: JMhParams,
    tonescale: ToneScaleParams,
    shared: SharedCompressionParams,
    chroma: ChromaCompressParams,
}

impl ToneScaleCompress {
    /// AP0 input, AP1 reach gamut.
    pub fn new(peak_luminance: f32) -> OpsResult<Self> {
        let input = JMhParams::new(&ACES_AP0)?;
        let reach = JMhParams::new(&ACES_AP1)?;
        let tonescale = ToneScaleParams::new(peak_luminance)?;
        let shared = SharedCompressionParams::new(peak_luminance, &input, &reach);
        let chroma = ChromaCompressParams::new(&tonescale);
        Ok(Self { input, tonescale, shared, chroma })
    }

    #[inline]
    fn fwd(&self, jmh: F3) -> F3 {
        tonescale_chroma_compress_fwd(&jmh, &self.input, &self.tonescale, &self.shared, &self.chroma)
    }

    #[inline]
    fn inv(&self, jmh: F3) -> F3 {
        tonescale_chroma_compress_inv(&jmh, &self.input, &self.tonescale, &self.shared, &self.chroma)
    }
}

/// One ACES 2 stage in one direction.
#[derive(Debug, Clone)]
pub enum Aces2Kernel {
    /// RGB to JMh
    RgbToJmh(Box<JMhParams>),
    /// JMh to RGB
    JmhToRgb(Box<JMhParams>),
    /// Tonescale and chroma compression on JMh
    ToneScaleCompress {
        /// Stage state
        stage: Box<ToneScaleCompress>,
        /// Direction
        forward: bool,
    },
    /// Gamut compression on JMh
    GamutCompress {
        /// Stage state
        params: Box<Aces2Params>,
        /// Direction
        forward: bool,
    },
    /// Full output transform on RGB
    OutputTransform {
        /// Transform state
        transform: Box<OutputTransform>,
        /// Direction
        forward: bool,
    },
}

impl Aces2Kernel {
    /// From eight primaries coordinates.
    pub fn rgb_to_jmh(params: &[f64]) -> OpsResult<Self> {
        let primaries = limiting_primaries(params)?;
        Ok(Self::RgbToJmh(Box::new(JMhParams::new(&primaries)?)))
    }

    /// From eight primaries coordinates.
    pub fn jmh_to_rgb(params: &[f64]) -> OpsResult<Self> {
        let primaries = limiting_primaries(params)?;
        Ok(Self::JmhToRgb(Box::new(JMhParams::new(&primaries)?)))
    }

    /// From `[peak]`.
    pub fn tonescale_compress(params: &[f64], forward: bool) -> OpsResult<Self> {
        let peak = params.first().copied().unwrap_or(100.0) as f32;
        Ok(Self::ToneScaleCompress { stage: Box::new(ToneScaleCompress::new(peak)?), forward })
    }

    /// From `[peak, rx, ry, gx, gy, bx, by, wx, wy]`.
    pub fn gamut_compress(params: &[f64], forward: bool) -> OpsResult<Self> {
        Ok(Self::GamutCompress { params: Box::new(Aces2Params::from_params(params)?), forward })
    }

    /// From `[peak, rx, ry, gx, gy, bx, by, wx, wy]`.
    pub fn output_transform(params: &[f64], forward: bool) -> OpsResult<Self> {
        let transform = OutputTransform::new(Aces2Params::from_params(params)?);
        Ok(Self::OutputTransform { transform: Box::new(transform), forward })
    }

    /// Applies the stage to one pixel.
    #[inline]
    pub fn apply(&self, rgb: F3) -> F3 {
        match self {
            Self::RgbToJmh(p) => rgb_to_jmh(&rgb, p),
            Self::JmhToRgb(p) => jmh_to_rgb(&rgb, p),
            Self::ToneScaleCompress { stage, forward: true } => stage.fwd(rgb),
            Self::ToneScaleCompress { stage, forward: false } => stage.inv(rgb),
            Self::GamutCompress { params, forward: true } => {
                gamut_compress_fwd(&rgb, &params.gamut, &params.shared)
            }
            Self::GamutCompress { params, forward: false } => {
                gamut_compress_inv(&rgb, &params.gamut, &params.shared)
            }
            Self::OutputTransform { transform, forward: true } => transform.forward(rgb),
            Self::OutputTransform { transform, forward: false } => transform.inverse(rgb),
        }
    }

    /// Writes the helpers and tables to `builder` and the per-pixel call
    /// to `ss`.
    pub(super) fn emit(
        &self,
        builder: &mut dyn ShaderBuilder,
        ss: &mut ShaderText,
        px: &str,
    ) -> OpsResult<()> {
        let index = builder.next_resource_index();
        let base = resource_name(builder.resource_prefix(), "aces2", index);
        let mut hs = ShaderText::new(builder.language());
        hs.dedent();

        let call = match self {
            Self::RgbToJmh(p) => {
                emit_cam(&mut hs, &base, p);
                format!("{base}_to_jmh({px}.rgb)")
            }
            Self::JmhToRgb(p) => {
                emit_cam(&mut hs, &base, p);
                format!("{base}_to_rgb({px}.rgb)")
            }
            Self::ToneScaleCompress { stage, forward } => {
                let reach = add_reach_table(builder, &mut hs, &base, &stage.shared.reach_m_table)?;
                emit_cam(&mut hs, &base, &stage.input);
                emit_tonescale_compress(&mut hs, &base, &base, &reach, stage, *forward);
                format!("{base}_tonescale_compress({px}.rgb)")
            }
            Self::GamutCompress { params, forward } => {
                let reach = add_reach_table(builder, &mut hs, &base, &params.shared.reach_m_table)?;
                let cusp = add_cusp_table(builder, &mut hs, &base, &params.gamut.gamut_cusp_table)?;
                emit_gamut_compress(&mut hs, &base, &reach, &cusp, params, *forward);
                format!("{base}_gamut_compress({px}.rgb)")
            }
            Self::OutputTransform { transform, forward } => {
                let p = transform.params();
                let reach = add_reach_table(builder, &mut hs, &base, &p.shared.reach_m_table)?;
                let cusp = add_cusp_table(builder, &mut hs, &base, &p.gamut.gamut_cusp_table)?;
                let input = format!("{base}_in");
                let limit = format!("{base}_lim");
                emit_cam(&mut hs, &input, &p.input);
                emit_cam(&mut hs, &limit, &p.limit);
                let stage = ToneScaleCompress {
                    input: p.input.clone(),
                    tonescale: p.tonescale,
                    shared: p.shared.clone(),
                    chroma: p.chroma,
                };
                emit_tonescale_compress(&mut hs, &base, &input, &reach, &stage, *forward);
                emit_gamut_compress(&mut hs, &base, &reach, &cusp, p, *forward);

                let f3 = ss.float3_type();
                if *forward {
                    ss.line(format!("{f3} JMh = {input}_to_jmh({px}.rgb);"));
                    ss.line(format!("JMh = {base}_tonescale_compress(JMh);"));
                    ss.line(format!("JMh = {base}_gamut_compress(JMh);"));
                    format!("{limit}_to_rgb(JMh)")
                } else {
                    ss.line(format!("{f3} JMh = {limit}_to_jmh({px}.rgb);"));
                    ss.line(format!("JMh = {base}_gamut_compress(JMh);"));
                    ss.line(format!("JMh = {base}_tonescale_compress(JMh);"));
                    format!("{input}_to_rgb(JMh)")
                }
            }
        };

        builder.add_to_helper_code(hs.as_str());
        ss.line(format!("{px}.rgb = {call};"));
        Ok(())
    }
}

// ============================================================================
// Shader Helpers
// ============================================================================

/// Writes `signature { body }` followed by a blank line.
fn function(hs: &mut ShaderText, signature: String, body: impl FnOnce(&mut ShaderText)) {
    hs.line(signature);
    hs.line("{");
    hs.indent();
    body(hs);
    hs.dedent();
    hs.line("}");
    hs.blank();
}

fn lit(v: f32) -> String {
    float_literal(v)
}

/// Texture coordinate of a hue in degrees.
fn hue_coord(h: &str) -> String {
    format!(
        "(({h} - 360. * floor({h} / 360.)) + 1.5) * {}",
        lit(1.0 / TABLE_TOTAL_SIZE as f32)
    )
}

/// Uploads the reach table and writes `<base>_reach_m(h)`. Returns the
/// function name.
fn add_reach_table(
    builder: &mut dyn ShaderBuilder,
    hs: &mut ShaderText,
    base: &str,
    table: &Table1D,
) -> OpsResult<String> {
    let tex = format!("{base}_reach_m");
    let sampler = format!("{tex}_sampler");
    builder.add_texture(TextureDesc {
        name: tex.clone(),
        sampler_name: sampler.clone(),
        width: TABLE_TOTAL_SIZE as u32,
        height: 1,
        channels: TextureChannels::Red,
        interpolation: Interpolation::Linear,
        values: table.data.clone(),
    })?;
    builder.add_to_declare_code(&hs.declare_tex1d(&tex, &sampler));

    let name = format!("{base}_lookup_reach_m");
    let sample = hs.sample_tex1d(&tex, &sampler, hue_coord("h"));
    function(hs, format!("float {name}(float h)"), |hs| {
        hs.line(format!("return {sample}.r;"));
    });
    Ok(name)
}

/// Uploads the cusp table and writes `<base>_lookup_cusp(h)`. Returns the
/// function name.
fn add_cusp_table(
    builder: &mut dyn ShaderBuilder,
    hs: &mut ShaderText,
    base: &str,
    table: &Table3D,
) -> OpsResult<String> {
    let tex = format!("{base}_cusp");
    let sampler = format!("{tex}_sampler");
    builder.add_texture(TextureDesc {
        name: tex.clone(),
        sampler_name: sampler.clone(),
        width: TABLE_TOTAL_SIZE as u32,
        height: 1,
        channels: TextureChannels::Rgb,
        interpolation: Interpolation::Linear,
        values: table.data.iter().flatten().copied().collect(),
    })?;
    builder.add_to_declare_code(&hs.declare_tex1d(&tex, &sampler));

    let name = format!("{base}_lookup_cusp");
    let f3 = hs.float3_type();
    let sample = hs.sample_tex1d(&tex, &sampler, hue_coord("h"));
    function(hs, format!("{f3} {name}(float h)"), |hs| {
        hs.line(format!("return {sample}.rgb;"));
    });
    Ok(name)
}

/// Writes `<name>_to_jmh(rgb)`, `<name>_to_rgb(jmh)`, `<name>_j_to_y(J)`
/// and `<name>_y_to_j(Y)` for one set of primaries.
fn emit_cam(hs: &mut ShaderText, name: &str, p: &JMhParams) {
    let f3 = hs.float3_type();
    let m = &p.matrix_rgb_to_cam16_c;
    let mi = &p.matrix_cam16_c_to_rgb;

    function(hs, format!("{f3} {name}_to_jmh({f3} rgb)"), |hs| {
        hs.line("float dr = rgb.r - rgb.g;");
        hs.line("float db = rgb.b - rgb.g;");
        hs.line(format!("float n = {} * rgb.g;", lit(p.neutral_gain)));
        hs.line(format!(
            "{f3} c = {f3}(n + {} * dr + {} * db, n + {} * dr + {} * db, n + {} * dr + {} * db);",
            lit(m[0]),
            lit(m[2]),
            lit(m[3]),
            lit(m[5]),
            lit(m[6]),
            lit(m[8])
        ));
        hs.line(format!(
            "{f3} fl = pow(abs(c) * {}, {});",
            lit(p.f_l / REFERENCE_LUMINANCE),
            hs.float3_splat(CAM_NL_EXPONENT)
        ));
        hs.line(format!("c = {} * sign(c) * fl / ({} + fl);", lit(CAM_NL_SCALE), lit(CAM_NL_OFFSET)));
        hs.line("float A = 2. * c.r + c.g + 0.05 * c.b;");
        hs.line("float a = c.r - c.g + (c.b - c.g) / 11.;");
        hs.line("float b = (c.r + c.g - 2. * c.b) / 9.;");
        hs.line(format!("float J = sign(A) * 100. * pow(abs(A) * {}, {});", lit(1.0 / p.a_w), lit(p.cz)));
        hs.line(format!("float M = (J == 0.) ? 0. : {} * sqrt(a * a + b * b);", lit(M_SCALE)));
        hs.line(format!("float h = {} * {};", hs.atan2("b", "a"), lit(RAD_TO_DEG)));
        hs.line("h = (h < 0.) ? h + 360. : h;");
        hs.line(format!("return {f3}(J, M, h);"));
    });

    function(hs, format!("{f3} {name}_to_rgb({f3} JMh)"), |hs| {
        hs.line(format!("float hr = JMh.z * {};", lit(DEG_TO_RAD)));
        hs.line(format!("float scale = JMh.y * {};", lit(1.0 / M_SCALE)));
        hs.line(format!(
            "float A = sign(JMh.x) * {} * pow(abs(JMh.x) * 0.01, {});",
            lit(p.a_w),
            lit(1.0 / p.cz)
        ));
        hs.line("float a = scale * cos(hr);");
        hs.line("float b = scale * sin(hr);");
        hs.line(format!(
            "{f3} c = {f3}(460. * A + 451. * a + 288. * b, 460. * A - 891. * a - 261. * b, 460. * A - 220. * a - 6300. * b) / 1403.;"
        ));
        hs.line(format!("{f3} ac = abs(c);"));
        hs.line(format!(
            "c = sign(c) * {} * pow({} * ac / ({} - ac), {});",
            lit(REFERENCE_LUMINANCE / p.f_l),
            lit(CAM_NL_OFFSET),
            hs.float3_splat(CAM_NL_SCALE),
            hs.float3_splat(1.0 / CAM_NL_EXPONENT)
        ));
        hs.line("float dr = c.r - c.g;");
        hs.line("float db = c.b - c.g;");
        hs.line(format!("float n = {} * c.g;", lit(1.0 / p.neutral_gain)));
        hs.line(format!(
            "return {f3}(n + {} * dr + {} * db, n + {} * dr + {} * db, n + {} * dr + {} * db);",
            lit(mi[0]),
            lit(mi[2]),
            lit(mi[3]),
            lit(mi[5]),
            lit(mi[6]),
            lit(mi[8])
        ));
    });

    function(hs, format!("float {name}_j_to_y(float J)"), |hs| {
        hs.line(format!("float A = {} * pow(abs(J) * 0.01, {});", lit(p.a_w_j), lit(1.0 / p.cz)));
        hs.line(format!(
            "return sign(J) * {} * pow({} * A / ({} - A), {});",
            lit(REFERENCE_LUMINANCE / p.f_l),
            lit(CAM_NL_OFFSET),
            lit(CAM_NL_SCALE),
            lit(1.0 / CAM_NL_EXPONENT)
        ));
    });

    function(hs, format!("float {name}_y_to_j(float Y)"), |hs| {
        hs.line(format!(
            "float f = pow(abs(Y) * {}, {});",
            lit(p.f_l / REFERENCE_LUMINANCE),
            lit(CAM_NL_EXPONENT)
        ));
        hs.line(format!("float A = {} * f / ({} + f);", lit(CAM_NL_SCALE), lit(CAM_NL_OFFSET)));
        hs.line(format!("return sign(Y) * 100. * pow(A * {}, {});", lit(1.0 / p.a_w_j), lit(p.cz)));
    });
}

/// Writes the toe, the hue normalization, the tonescale and
/// `<base>_tonescale_compress(JMh)` in one direction. `cam` names the
/// luminance helpers written by [`emit_cam`].
fn emit_tonescale_compress(
    hs: &mut ShaderText,
    base: &str,
    cam: &str,
    reach: &str,
    stage: &ToneScaleCompress,
    forward: bool,
) {
    let f3 = hs.float3_type();
    let ts = &stage.tonescale;
    let pc = &stage.chroma;
    let limit_j_max = lit(stage.shared.limit_j_max);
    let gamma = lit(stage.shared.model_gamma);

    let toe = format!("{base}_toe");
    function(hs, format!("float {toe}(float x, float limit, float k1_in, float k2_in)"), |hs| {
        hs.line("if (x > limit) return x;");
        hs.line("float k2 = max(k2_in, 0.001);");
        hs.line("float k1 = sqrt(k1_in * k1_in + k2 * k2);");
        hs.line("float k3 = (limit + k1) / (limit + k2);");
        if forward {
            hs.line("float minus_b = k3 * x - k1;");
            hs.line("return 0.5 * (minus_b + sqrt(minus_b * minus_b + 4. * k2 * k3 * x));");
        } else {
            hs.line("return (x * x + k1 * x) / (k3 * (x + k2));");
        }
    });

    let norm = format!("{base}_chroma_norm");
    function(hs, format!("float {norm}(float h)"), |hs| {
        hs.line(format!("float hr = h * {};", lit(DEG_TO_RAD)));
        hs.line("float a = cos(hr);");
        hs.line("float b = sin(hr);");
        hs.line("float cos_hr2 = a * a - b * b;");
        hs.line("float sin_hr2 = 2. * a * b;");
        hs.line("float cos_hr3 = 4. * a * a * a - 3. * a;");
        hs.line("float sin_hr3 = 3. * b - 4. * b * b * b;");
        hs.line(
            "float M = 11.34072 * a + 16.46899 * cos_hr2 + 7.88380 * cos_hr3 + 14.66441 * b - 6.37224 * sin_hr2 + 9.19364 * sin_hr3 + 77.12896;",
        );
        hs.line(format!("return M * {};", lit(pc.chroma_compress_scale)));
    });

    let tonescale = format!("{base}_tonescale");
    function(hs, format!("float {tonescale}(float Y)"), |hs| {
        if forward {
            hs.line(format!(
                "float f = {} * pow(max(0., Y) / (Y + {}), {});",
                lit(ts.m_2),
                lit(ts.s_2),
                lit(ts.g)
            ));
            hs.line(format!("return max(0., f * f / (f + {})) * {};", lit(ts.t_1), lit(ts.n_r)));
        } else {
            hs.line(format!("float Z = max(0., min({}, Y));", lit(ts.n / (ts.u_2 * ts.n_r))));
            hs.line(format!("float ht = 0.5 * (Z + sqrt(Z * ({} + Z)));", lit(4.0 * ts.t_1)));
            hs.line(format!(
                "return {} / (pow({} / ht, {}) - 1.) * {};",
                lit(ts.s_2),
                lit(ts.m_2),
                lit(1.0 / ts.g),
                lit(ts.n_r)
            ));
        }
    });

    let sat = lit(pc.sat);
    let sat_thr = lit(pc.sat_thr);
    let compr = lit(pc.compr);
    function(hs, format!("{f3} {base}_tonescale_compress({f3} JMh)"), |hs| {
        if forward {
            hs.line("float J = JMh.x;");
            hs.line(format!("float Jts = {cam}_y_to_j({tonescale}({cam}_j_to_y(J) * 0.01));"));
        } else {
            hs.line("float Jts = JMh.x;");
            hs.line(format!("float J = {cam}_y_to_j({tonescale}({cam}_j_to_y(Jts) * 0.01));"));
        }
        hs.line("float M = JMh.y;");
        hs.line("float h = JMh.z;");
        let out_j = if forward { "Jts" } else { "J" };
        hs.line(format!("if (M == 0. || J == 0.) return {f3}({out_j}, M, h);"));
        hs.line(format!("float nJ = Jts / {limit_j_max};"));
        hs.line("float snJ = max(0., 1. - nJ);");
        hs.line(format!("float Mnorm = {norm}(h);"));
        hs.line(format!("float limit = pow(nJ, {gamma}) * {reach}(h) / Mnorm;"));
        if forward {
            hs.line(format!("M = M * pow(Jts / J, {gamma}) / Mnorm;"));
            hs.line(format!(
                "M = limit - {toe}(limit - M, limit - 0.001, snJ * {sat}, sqrt(nJ * nJ + {sat_thr}));"
            ));
            hs.line(format!("M = {toe}(M, limit, nJ * {compr}, snJ) * Mnorm;"));
        } else {
            hs.line("M = M / Mnorm;");
            hs.line(format!("M = {toe}(M, limit, nJ * {compr}, snJ);"));
            hs.line(format!(
                "M = limit - {toe}(limit - M, limit - 0.001, snJ * {sat}, sqrt(nJ * nJ + {sat_thr}));"
            ));
            hs.line(format!("M = M * Mnorm * pow(Jts / J, -{gamma});"));
        }
        hs.line(format!("return {f3}({out_j}, M, h);"));
    });
}

/// Writes the boundary geometry and `<base>_gamut_compress(JMh)` in one
/// direction.
fn emit_gamut_compress(
    hs: &mut ShaderText,
    base: &str,
    reach: &str,
    cusp: &str,
    p: &Aces2Params,
    forward: bool,
) {
    let f3 = hs.float3_type();
    let j_max = lit(p.shared.limit_j_max);
    let gamma = lit(p.shared.model_gamma);
    let focus_dist = lit(p.gamut.focus_dist);

    let focus_gain = format!("{base}_focus_gain");
    let gain_blend = hs.lerp("cuspJ", &j_max, lit(FOCUS_GAIN_BLEND));
    function(hs, format!("float {focus_gain}(float J, float cuspJ)"), |hs| {
        hs.line(format!("float thr = {gain_blend};"));
        hs.line("if (J <= thr) return 1.;");
        hs.line(format!("float gain = ({j_max} - thr) / max(0.0001, {j_max} - min({j_max}, J));"));
        hs.line(format!("return pow(log(gain) * {}, {}) + 1.;", lit(LOG10_E), lit(1.0 / FOCUS_ADJUST_GAIN)));
    });

    let solve = format!("{base}_solve_j_intersect");
    function(hs, format!("float {solve}(float J, float M, float focusJ, float slope_gain)"), |hs| {
        hs.line("float a = M / (focusJ * slope_gain);");
        hs.line("if (J < focusJ)");
        hs.line("{");
        hs.indent();
        hs.line("float b = 1. - M / slope_gain;");
        hs.line("float c = -J;");
        hs.line("return 2. * c / (-b - sqrt(b * b - 4. * a * c));");
        hs.dedent();
        hs.line("}");
        hs.line("else");
        hs.line("{");
        hs.indent();
        hs.line(format!("float b = -(1. + M / slope_gain + {j_max} * M / (focusJ * slope_gain));"));
        hs.line(format!("float c = {j_max} * M / slope_gain + J;"));
        hs.line("return 2. * c / (-b + sqrt(b * b - 4. * a * c));");
        hs.dedent();
        hs.line("}");
    });

    let slope = format!("{base}_compression_slope");
    function(hs, format!("float {slope}(float Ji, float focusJ, float slope_gain)"), |hs| {
        hs.line(format!("float d = (Ji < focusJ) ? Ji : ({j_max} - Ji);"));
        hs.line("return d * (Ji - focusJ) / (focusJ * slope_gain);");
    });

    let boundary = format!("{base}_gamut_boundary");
    let s = SMOOTH_CUSPS.max(0.000001);
    function(
        hs,
        format!("{f3} {boundary}({f3} JMh, {f3} cusp, float focusJ, float slope_gain)"),
        |hs| {
            hs.line("float cuspJ = cusp.x;");
            hs.line(format!("float cuspM = cusp.y * {};", lit(1.0 + SMOOTH_M * s)));
            hs.line(format!("float Ji = {solve}(JMh.x, JMh.y, focusJ, slope_gain);"));
            hs.line(format!("float Jc = {solve}(cuspJ, cuspM, focusJ, slope_gain);"));
            hs.line(format!("float slope = {slope}(Ji, focusJ, slope_gain);"));
            hs.line(format!(
                "float lower = Jc * pow(Ji / Jc, {}) / (cuspJ / cuspM - slope);",
                lit(p.gamut.lower_hull_gamma_inv)
            ));
            hs.line(format!(
                "float upper = cuspM * ({j_max} - Jc) * pow(({j_max} - Ji) / ({j_max} - Jc), cusp.z) / (slope * cuspM + {j_max} - cuspJ);"
            ));
            hs.line("float lo = lower / cuspM;");
            hs.line("float hi = upper / cuspM;");
            hs.line(format!("float k = max({s_lit} - abs(lo - hi), 0.) / {s_lit};", s_lit = lit(s)));
            hs.line(format!("float Mb = cuspM * (min(lo, hi) - k * k * k * {});", lit(s / 6.0)));
            hs.line(format!("return {f3}(Ji + slope * Mb, Mb, Ji);"));
        },
    );

    let reach_boundary = format!("{base}_reach_boundary");
    function(
        hs,
        format!("float {reach_boundary}(float J, float M, float h, float cuspJ, float focusJ)"),
        |hs| {
            hs.line(format!("float reachM = {reach}(h);"));
            hs.line(format!("float slope_gain = {j_max} * {focus_dist} * {focus_gain}(J, cuspJ);"));
            hs.line(format!("float Ji = {solve}(J, M, focusJ, slope_gain);"));
            hs.line(format!("float slope = {slope}(Ji, focusJ, slope_gain);"));
            hs.line(format!(
                "return {j_max} * pow(Ji / {j_max}, {gamma}) * reachM / ({j_max} - slope * reachM);"
            ));
        },
    );

    let compress = format!("{base}_compress");
    function(hs, format!("float {compress}(float v, float thr, float lim)"), |hs| {
        hs.line("float s = (lim - thr) * (1. - thr) / (lim - 1.);");
        hs.line("float nd = (v - thr) / s;");
        if forward {
            hs.line("if (v < thr || lim <= 1.0001) return v;");
            hs.line("return thr + s * nd / (1. + nd);");
        } else {
            hs.line("if (v < thr || lim <= 1.0001 || v > thr + s) return v;");
            hs.line("return thr + s * (-nd / (nd - 1.));");
        }
    });

    let compress_gamut = format!("{base}_compress_gamut");
    let mid_blend = hs.lerp("cusp.x", lit(p.gamut.mid_j), format!("min(1., {} - cusp.x / {j_max})", lit(CUSP_MID_BLEND)));
    function(hs, format!("{f3} {compress_gamut}({f3} JMh, float Jx)"), |hs| {
        hs.line(format!("if (JMh.y < 0.0001 || JMh.x > {j_max}) return {f3}(JMh.x, 0., JMh.z);"));
        hs.line(format!("{f3} cusp = {cusp}(JMh.z);"));
        hs.line(format!("float focusJ = {mid_blend};"));
        hs.line(format!("float slope_gain = {j_max} * {focus_dist} * {focus_gain}(Jx, cusp.x);"));
        hs.line(format!("{f3} bound = {boundary}(JMh, cusp, focusJ, slope_gain);"));
        hs.line(format!("if (bound.y <= 0.) return {f3}(JMh.x, 0., JMh.z);"));
        hs.line(format!("float reachM = {reach_boundary}(bound.x, bound.y, JMh.z, cusp.x, focusJ);"));
        hs.line("float diff = max(1.0001, reachM / bound.y);");
        hs.line(format!("float thr = max({}, 1. / diff);", lit(COMPRESSION_THRESHOLD)));
        hs.line(format!("float v = {compress}(JMh.y / bound.y, thr, diff);"));
        hs.line(format!("return {f3}(bound.z + v * (bound.x - bound.z), v * bound.y, JMh.z);"));
    });

    let second_pass = hs.lerp("cusp.x", &j_max, lit(FOCUS_GAIN_BLEND));
    function(hs, format!("{f3} {base}_gamut_compress({f3} JMh)"), |hs| {
        if forward {
            hs.line(format!("return {compress_gamut}(JMh, JMh.x);"));
        } else {
            hs.line(format!("{f3} cusp = {cusp}(JMh.z);"));
            hs.line("float Jx = JMh.x;");
            hs.line(format!("if (Jx > {second_pass}) Jx = {compress_gamut}(JMh, Jx).x;"));
            hs.line(format!("return {compress_gamut}(JMh, Jx);"));
        }
    });
}
