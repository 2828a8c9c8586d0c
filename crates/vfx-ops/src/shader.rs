//! Shader text emission.
//!
//! Evaluators that have a GPU form write their code into a [`ShaderBuilder`].
//! The builder collects four kinds of output:
//!
//! - **declarations** (textures, samplers, uniforms) placed at global scope
//! - **helpers** (free functions) placed after the declarations
//! - **function code** appended to the body of the color function, operating
//!   on the pixel variable named by [`ShaderBuilder::pixel_name`]
//! - **resources** (texture data and uniform values) that the host uploads
//!
//! [`GpuShaderDesc`] is the in-memory builder; [`ShaderText`] is a small
//! line writer that spells types and intrinsics for the target language.
//!
//! # Example
//!
//! ```rust
//! use vfx_ops::shader::{GpuLanguage, GpuShaderDesc, ShaderBuilder, ShaderText};
//!
//! let mut desc = GpuShaderDesc::new(GpuLanguage::Hlsl50);
//! let mut ss = ShaderText::new(desc.language());
//! ss.line(format!("{} = {};", ss.float3_decl("k"), ss.float3_const(1.0, 2.0, 3.0)));
//! desc.add_to_function_code(&ss.into_string());
//!
//! assert!(desc.shader_text().contains("float3 k = float3(1.0, 2.0, 3.0);"));
//! ```

use std::fmt::Display;

use crate::{OpsError, OpsResult};

// ============================================================================
// Language
// ============================================================================

/// Target shader language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GpuLanguage {
    /// GLSL 1.20 (OpenGL 2.1)
    Glsl120,
    /// GLSL 3.30 (OpenGL 3.3)
    #[default]
    Glsl330,
    /// GLSL 4.00 (OpenGL 4.0)
    Glsl400,
    /// GLSL ES 3.00 (WebGL 2.0)
    GlslEs300,
    /// HLSL Shader Model 5.0
    Hlsl50,
    /// Metal Shading Language 2.0
    Metal,
}

impl GpuLanguage {
    /// Version directive placed at the top of a standalone shader.
    pub fn version_directive(&self) -> &'static str {
        match self {
            Self::Glsl120 => "#version 120",
            Self::Glsl330 => "#version 330 core",
            Self::Glsl400 => "#version 400 core",
            Self::GlslEs300 => "#version 300 es\nprecision highp float;",
            Self::Hlsl50 => "",
            Self::Metal => "#include <metal_stdlib>\nusing namespace metal;",
        }
    }

    /// Whether this is a GLSL variant.
    pub fn is_glsl(&self) -> bool {
        matches!(self, Self::Glsl120 | Self::Glsl330 | Self::Glsl400 | Self::GlslEs300)
    }

    /// Whether the language has one-dimensional textures.
    ///
    /// GLSL ES has none; 1D data is stored in a texture of height 1.
    pub fn has_1d_textures(&self) -> bool {
        !matches!(self, Self::GlslEs300)
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Channel layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureChannels {
    /// One float per texel.
    Red,
    /// Three floats per texel.
    Rgb,
}

impl TextureChannels {
    /// Floats per texel.
    pub fn count(&self) -> usize {
        match self {
            Self::Red => 1,
            Self::Rgb => 3,
        }
    }
}

/// Texture sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Nearest texel.
    Nearest,
    /// Linear filtering.
    #[default]
    Linear,
}

/// A texture the host has to upload before running the shader.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    /// Texture symbol in the shader.
    pub name: String,
    /// Sampler symbol in the shader.
    pub sampler_name: String,
    /// Width in texels.
    pub width: u32,
    /// Height in texels (1 for 1D data).
    pub height: u32,
    /// Channel layout.
    pub channels: TextureChannels,
    /// Sampling mode.
    pub interpolation: Interpolation,
    /// Texel data, `width * height * channels` floats.
    pub values: Vec<f32>,
}

/// Value of a uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `vec3` / `float3`
    Float3([f32; 3]),
}

/// A uniform the host has to bind before running the shader.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDesc {
    /// Uniform symbol in the shader.
    pub name: String,
    /// Initial value.
    pub value: UniformValue,
}

/// Builds a global symbol name `<prefix>_<op>_<index>`.
///
/// Runs of underscores collapse to one, since double underscores are
/// reserved in GLSL.
pub fn resource_name(prefix: &str, op: &str, index: u32) -> String {
    let mut name = format!("{prefix}_{op}_{index}");
    while name.contains("__") {
        name = name.replace("__", "_");
    }
    name
}

// ============================================================================
// Builder
// ============================================================================

/// Sink for emitted shader code and resources.
pub trait ShaderBuilder {
    /// Target language.
    fn language(&self) -> GpuLanguage;

    /// Name of the RGBA variable the function code transforms.
    fn pixel_name(&self) -> &str;

    /// Prefix for every global symbol.
    fn resource_prefix(&self) -> &str;

    /// Returns a fresh index for naming resources, then advances it.
    fn next_resource_index(&mut self) -> u32;

    /// Registers a texture.
    fn add_texture(&mut self, texture: TextureDesc) -> OpsResult<()>;

    /// Registers a uniform.
    fn add_uniform(&mut self, uniform: UniformDesc) -> OpsResult<()>;

    /// Appends global declarations.
    fn add_to_declare_code(&mut self, code: &str);

    /// Appends helper functions.
    fn add_to_helper_code(&mut self, code: &str);

    /// Appends code to the color function body.
    fn add_to_function_code(&mut self, code: &str);
}

/// In-memory [`ShaderBuilder`].
#[derive(Debug, Clone)]
pub struct GpuShaderDesc {
    language: GpuLanguage,
    pixel_name: String,
    resource_prefix: String,
    function_name: String,
    next_index: u32,
    declare: String,
    helper: String,
    function: String,
    textures: Vec<TextureDesc>,
    uniforms: Vec<UniformDesc>,
}

impl GpuShaderDesc {
    /// Creates an empty builder with pixel `outColor`, prefix `vfx` and
    /// function `vfx_transform`.
    pub fn new(language: GpuLanguage) -> Self {
        Self {
            language,
            pixel_name: "outColor".into(),
            resource_prefix: "vfx".into(),
            function_name: "vfx_transform".into(),
            next_index: 0,
            declare: String::new(),
            helper: String::new(),
            function: String::new(),
            textures: Vec::new(),
            uniforms: Vec::new(),
        }
    }

    /// Sets the pixel variable name.
    pub fn with_pixel_name(mut self, name: impl Into<String>) -> Self {
        self.pixel_name = name.into();
        self
    }

    /// Sets the global symbol prefix.
    pub fn with_resource_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.resource_prefix = prefix.into();
        self
    }

    /// Sets the name of the generated color function.
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    /// Registered textures.
    pub fn textures(&self) -> &[TextureDesc] {
        &self.textures
    }

    /// Registered uniforms.
    pub fn uniforms(&self) -> &[UniformDesc] {
        &self.uniforms
    }

    /// Collected declarations.
    pub fn declare_code(&self) -> &str {
        &self.declare
    }

    /// Collected helpers.
    pub fn helper_code(&self) -> &str {
        &self.helper
    }

    /// Collected function body.
    pub fn function_code(&self) -> &str {
        &self.function
    }

    fn check_unique(&self, name: &str) -> OpsResult<()> {
        let taken = self.textures.iter().any(|t| t.name == name || t.sampler_name == name)
            || self.uniforms.iter().any(|u| u.name == name);
        if taken {
            return Err(OpsError::Shader(format!("resource '{name}' is already declared")));
        }
        Ok(())
    }

    /// Assembles a complete shader: declarations, helpers and the color
    /// function wrapping the collected body.
    pub fn shader_text(&self) -> String {
        let ss = ShaderText::new(self.language);
        let f4 = ss.float4_type();
        let px = &self.pixel_name;

        let mut out = String::new();
        let version = self.language.version_directive();
        if !version.is_empty() {
            out.push_str(version);
            out.push_str("\n\n");
        }
        out.push_str("// Declarations\n");
        out.push_str(&self.declare);
        out.push_str("\n// Helpers\n");
        out.push_str(&self.helper);
        out.push_str(&format!("\n{f4} {}({f4} inPixel)\n{{\n", self.function_name));
        out.push_str(&format!("  {f4} {px} = inPixel;\n"));
        out.push_str(&self.function);
        out.push_str(&format!("\n  return {px};\n}}\n"));
        out
    }
}

impl ShaderBuilder for GpuShaderDesc {
    fn language(&self) -> GpuLanguage {
        self.language
    }

    fn pixel_name(&self) -> &str {
        &self.pixel_name
    }

    fn resource_prefix(&self) -> &str {
        &self.resource_prefix
    }

    fn next_resource_index(&mut self) -> u32 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn add_texture(&mut self, texture: TextureDesc) -> OpsResult<()> {
        let expected = texture.width as usize * texture.height as usize * texture.channels.count();
        if texture.width == 0 || texture.height == 0 || texture.values.len() != expected {
            return Err(OpsError::Shader(format!(
                "texture '{}' is {}x{} with {} values",
                texture.name,
                texture.width,
                texture.height,
                texture.values.len()
            )));
        }
        self.check_unique(&texture.name)?;
        self.check_unique(&texture.sampler_name)?;
        self.textures.push(texture);
        Ok(())
    }

    fn add_uniform(&mut self, uniform: UniformDesc) -> OpsResult<()> {
        self.check_unique(&uniform.name)?;
        self.uniforms.push(uniform);
        Ok(())
    }

    fn add_to_declare_code(&mut self, code: &str) {
        self.declare.push_str(code);
    }

    fn add_to_helper_code(&mut self, code: &str) {
        self.helper.push_str(code);
    }

    fn add_to_function_code(&mut self, code: &str) {
        self.function.push_str(code);
    }
}

// ============================================================================
// Text Writer
// ============================================================================

/// Formats an `f32` as a shader literal that round-trips.
pub fn float_literal(v: f32) -> String {
    let s = format!("{v:?}");
    if s.contains(['.', 'e', 'E']) || !v.is_finite() {
        s
    } else {
        format!("{s}.0")
    }
}

/// Indented line writer with language-aware spellings.
#[derive(Debug, Clone)]
pub struct ShaderText {
    language: GpuLanguage,
    indent: usize,
    text: String,
}

impl ShaderText {
    /// An empty writer for `language`, indented one level.
    pub fn new(language: GpuLanguage) -> Self {
        Self { language, indent: 1, text: String::new() }
    }

    /// Target language.
    pub fn language(&self) -> GpuLanguage {
        self.language
    }

    /// Increases the indentation.
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decreases the indentation.
    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Appends one indented line.
    pub fn line(&mut self, s: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.text.push_str("  ");
        }
        self.text.push_str(s.as_ref());
        self.text.push('\n');
    }

    /// Appends an empty line.
    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    /// Text written so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the writer.
    pub fn into_string(self) -> String {
        self.text
    }

    /// `vec3` or `float3`.
    pub fn float3_type(&self) -> &'static str {
        if self.language.is_glsl() { "vec3" } else { "float3" }
    }

    /// `vec4` or `float4`.
    pub fn float4_type(&self) -> &'static str {
        if self.language.is_glsl() { "vec4" } else { "float4" }
    }

    /// `vec3 name`.
    pub fn float3_decl(&self, name: &str) -> String {
        format!("{} {name}", self.float3_type())
    }

    /// `vec4 name`.
    pub fn float4_decl(&self, name: &str) -> String {
        format!("{} {name}", self.float4_type())
    }

    /// Three-component constructor.
    pub fn float3_const(&self, x: impl Lit, y: impl Lit, z: impl Lit) -> String {
        format!("{}({}, {}, {})", self.float3_type(), x.lit(), y.lit(), z.lit())
    }

    /// Four-component constructor.
    pub fn float4_const(&self, x: impl Lit, y: impl Lit, z: impl Lit, w: impl Lit) -> String {
        format!("{}({}, {}, {}, {})", self.float4_type(), x.lit(), y.lit(), z.lit(), w.lit())
    }

    /// Splat of one value into three components.
    pub fn float3_splat(&self, v: impl Lit) -> String {
        format!("{}({})", self.float3_type(), v.lit())
    }

    /// `vec3 name = vec3(x, y, z);` as one line.
    pub fn declare_float3(&mut self, name: &str, v: [f32; 3]) {
        let decl = format!("{} = {};", self.float3_decl(name), self.float3_const(v[0], v[1], v[2]));
        self.line(decl);
    }

    /// Lane-wise `a > b` as 0.0/1.0 components.
    pub fn float3_greater_than(&self, a: impl Display, b: impl Display) -> String {
        if self.language.is_glsl() {
            format!("vec3(greaterThan({a}, {b}))")
        } else {
            format!("float3({a} > {b})")
        }
    }

    /// Linear blend, `a` at `t = 0`.
    pub fn lerp(&self, a: impl Display, b: impl Display, t: impl Display) -> String {
        match self.language {
            GpuLanguage::Hlsl50 => format!("lerp({a}, {b}, {t})"),
            _ => format!("mix({a}, {b}, {t})"),
        }
    }

    /// Two-argument arc tangent.
    pub fn atan2(&self, y: impl Display, x: impl Display) -> String {
        if self.language.is_glsl() {
            format!("atan({y}, {x})")
        } else {
            format!("atan2({y}, {x})")
        }
    }

    /// Floating-point remainder with the sign of `x` (truncated).
    pub fn fmod(&self, x: impl Display, y: impl Display) -> String {
        match self.language {
            GpuLanguage::Hlsl50 => format!("fmod({x}, {y})"),
            GpuLanguage::Metal => format!("fmod({x}, {y})"),
            _ => format!("(({x}) - ({y}) * trunc(({x}) / ({y})))"),
        }
    }

    /// Declaration of a 1D texture and its sampler.
    pub fn declare_tex1d(&self, tex: &str, sampler: &str) -> String {
        match self.language {
            GpuLanguage::Glsl120 | GpuLanguage::Glsl330 | GpuLanguage::Glsl400 => {
                format!("uniform sampler1D {tex};\n")
            }
            GpuLanguage::GlslEs300 => format!("uniform highp sampler2D {tex};\n"),
            GpuLanguage::Hlsl50 => format!("Texture1D<float4> {tex};\nSamplerState {sampler};\n"),
            GpuLanguage::Metal => {
                format!("constant texture1d<float> {tex};\nconstant sampler {sampler};\n")
            }
        }
    }

    /// Sample of a 1D texture at normalized coordinate `coord`.
    pub fn sample_tex1d(&self, tex: &str, sampler: &str, coord: impl Display) -> String {
        match self.language {
            GpuLanguage::Glsl120 => format!("texture1D({tex}, {coord})"),
            GpuLanguage::Glsl330 | GpuLanguage::Glsl400 => format!("texture({tex}, {coord})"),
            GpuLanguage::GlslEs300 => format!("texture({tex}, vec2({coord}, 0.5))"),
            GpuLanguage::Hlsl50 => format!("{tex}.Sample({sampler}, {coord})"),
            GpuLanguage::Metal => format!("{tex}.sample({sampler}, {coord})"),
        }
    }
}

/// Values usable as shader literals.
pub trait Lit {
    /// Literal text.
    fn lit(&self) -> String;
}

impl Lit for f32 {
    fn lit(&self) -> String {
        float_literal(*self)
    }
}

impl Lit for f64 {
    fn lit(&self) -> String {
        float_literal(*self as f32)
    }
}

impl Lit for &str {
    fn lit(&self) -> String {
        (*self).to_string()
    }
}

impl Lit for String {
    fn lit(&self) -> String {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language() {
        assert!(GpuLanguage::Glsl330.version_directive().contains("330"));
        assert!(GpuLanguage::GlslEs300.is_glsl());
        assert!(!GpuLanguage::Hlsl50.is_glsl());
        assert!(!GpuLanguage::GlslEs300.has_1d_textures());
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(resource_name("vfx", "reach", 3), "vfx_reach_3");
        assert_eq!(resource_name("vfx_", "_reach", 0), "vfx_reach_0");
        assert_eq!(resource_name("a___", "b", 1), "a_b_1");
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(0.9811), "0.9811");
        assert_eq!(float_literal(-2.0), "-2.0");
        assert_eq!(float_literal(1e-10), "1e-10");
    }

    #[test]
    fn test_spellings() {
        let glsl = ShaderText::new(GpuLanguage::Glsl400);
        let hlsl = ShaderText::new(GpuLanguage::Hlsl50);
        assert_eq!(glsl.lerp("a", "b", "t"), "mix(a, b, t)");
        assert_eq!(hlsl.lerp("a", "b", "t"), "lerp(a, b, t)");
        assert_eq!(glsl.atan2("y", "x"), "atan(y, x)");
        assert_eq!(hlsl.atan2("y", "x"), "atan2(y, x)");
        assert_eq!(glsl.float3_const(1.0f32, "g", 0.5f32), "vec3(1.0, g, 0.5)");
        assert_eq!(
            ShaderText::new(GpuLanguage::GlslEs300).sample_tex1d("t", "s", "0.25"),
            "texture(t, vec2(0.25, 0.5))"
        );
    }

    #[test]
    fn test_indentation() {
        let mut ss = ShaderText::new(GpuLanguage::Glsl330);
        ss.line("{");
        ss.indent();
        ss.line("x = 1.0;");
        ss.dedent();
        ss.line("}");
        assert_eq!(ss.as_str(), "  {\n    x = 1.0;\n  }\n");
    }

    #[test]
    fn test_desc_resources() {
        let mut desc = GpuShaderDesc::new(GpuLanguage::Glsl330).with_resource_prefix("ocio");
        assert_eq!(desc.next_resource_index(), 0);
        assert_eq!(desc.next_resource_index(), 1);

        let tex = TextureDesc {
            name: "ocio_t_0".into(),
            sampler_name: "ocio_t_0Sampler".into(),
            width: 4,
            height: 1,
            channels: TextureChannels::Red,
            interpolation: Interpolation::Nearest,
            values: vec![0.0; 4],
        };
        desc.add_texture(tex.clone()).unwrap();
        assert!(matches!(desc.add_texture(tex.clone()), Err(OpsError::Shader(_))));

        let bad = TextureDesc { name: "other".into(), sampler_name: "otherS".into(), values: vec![0.0; 3], ..tex };
        assert!(matches!(desc.add_texture(bad), Err(OpsError::Shader(_))));

        desc.add_uniform(UniformDesc { name: "ocio_gain".into(), value: UniformValue::Float(2.0) }).unwrap();
        assert_eq!(desc.textures().len(), 1);
        assert_eq!(desc.uniforms().len(), 1);
    }

    #[test]
    fn test_shader_text_layout() {
        let mut desc = GpuShaderDesc::new(GpuLanguage::Glsl330).with_function_name("apply_color");
        desc.add_to_declare_code("uniform float gain;\n");
        desc.add_to_function_code("  outColor.rgb *= gain;\n");
        let text = desc.shader_text();
        assert!(text.starts_with("#version 330 core"));
        assert!(text.contains("vec4 apply_color(vec4 inPixel)"));
        assert!(text.contains("vec4 outColor = inPixel;"));
        assert!(text.contains("outColor.rgb *= gain;"));
        assert!(text.trim_end().ends_with('}'));
    }
}
