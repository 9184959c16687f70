//! Vendor, version and extension report for the current context

use crate::backend::GlBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
    pub major: i32,
    pub minor: i32,
    pub glsl_version: String,
    pub extensions: Vec<String>,
}

impl ContextInfo {
    pub fn query<B: GlBackend>(backend: &B) -> Self {
        let count = backend.get_integer(glow::NUM_EXTENSIONS).max(0) as u32;
        let extensions = (0..count)
            .map(|i| backend.get_indexed_string(glow::EXTENSIONS, i))
            .collect();

        Self {
            vendor: backend.get_string(glow::VENDOR),
            renderer: backend.get_string(glow::RENDERER),
            version: backend.get_string(glow::VERSION),
            major: backend.get_integer(glow::MAJOR_VERSION),
            minor: backend.get_integer(glow::MINOR_VERSION),
            glsl_version: backend.get_string(glow::SHADING_LANGUAGE_VERSION),
            extensions,
        }
    }

    /// GLSL version as a `#version` number, e.g. "4.60 NVIDIA" -> 460
    pub fn glsl_version(&self) -> Option<u32> {
        parse_glsl_version(&self.glsl_version)
    }

    pub fn supports_glsl(&self, min_version: u32) -> bool {
        self.glsl_version().is_some_and(|v| v >= min_version)
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e == name)
    }

    pub fn log(&self) {
        tracing::info!("GL Vendor : {}", self.vendor);
        tracing::info!("GL Renderer : {}", self.renderer);
        tracing::info!("GL Version (string) : {}", self.version);
        tracing::info!("GL Version (integer) : {}.{}", self.major, self.minor);
        tracing::info!("GLSL Version : {}", self.glsl_version);
        tracing::debug!(count = self.extensions.len(), "extensions: {}", self.extensions.join(" "));
    }
}

/// Parses the leading `major.minor` of a `GL_SHADING_LANGUAGE_VERSION`
/// string. GLES strings carry a prefix ("OpenGL ES GLSL ES 3.00").
fn parse_glsl_version(raw: &str) -> Option<u32> {
    let token = raw
        .split_whitespace()
        .find(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()))?;
    let (major, minor) = token.split_once('.')?;
    let major: u32 = major.parse().ok()?;
    let minor_digits: String = minor.chars().take_while(|c| c.is_ascii_digit()).collect();
    let minor: u32 = match minor_digits.len() {
        0 => return None,
        1 => minor_digits.parse::<u32>().ok()? * 10,
        _ => minor_digits[..2].parse().ok()?,
    };
    Some(major * 100 + minor)
}
