//! GL context wrapper that picks the trail buffer format.
//!
//! Trails fade by repeated multiplication, so 8-bit alpha quantizes long
//! tails into visible steps. Half-float targets avoid that but need
//! `EXT_color_buffer_float`; without it the renderer falls back to RGBA8.

use std::fmt;

/// Storage format for the two trail buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailFormat {
    Rgba16f,
    Rgba8,
}

impl TrailFormat {
    /// Half-float when float color attachments are renderable.
    pub fn select(color_buffer_float: bool) -> Self {
        if color_buffer_float {
            TrailFormat::Rgba16f
        } else {
            TrailFormat::Rgba8
        }
    }

    pub fn internal_format(self) -> u32 {
        match self {
            TrailFormat::Rgba16f => glow::RGBA16F,
            TrailFormat::Rgba8 => glow::RGBA8,
        }
    }

    /// Upload type matching [`internal_format`](Self::internal_format).
    pub fn pixel_type(self) -> u32 {
        match self {
            TrailFormat::Rgba16f => glow::HALF_FLOAT,
            TrailFormat::Rgba8 => glow::UNSIGNED_BYTE,
        }
    }
}

impl fmt::Display for TrailFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailFormat::Rgba16f => write!(f, "RGBA16F"),
            TrailFormat::Rgba8 => write!(f, "RGBA8"),
        }
    }
}

/// True if an extension list advertises renderable float color buffers.
///
/// WebGL reports the bare name, desktop GL the `GL_`-prefixed one.
pub fn has_color_buffer_float<'a>(mut extensions: impl Iterator<Item = &'a str>) -> bool {
    extensions.any(|e| e == "EXT_color_buffer_float" || e == "GL_EXT_color_buffer_float")
}

/// Owns the `glow::Context` plus the trail format chosen for it.
pub struct GpuContext {
    gl: glow::Context,
    trail_format: TrailFormat,
}

impl GpuContext {
    /// Wraps `gl`, probing extensions once.
    pub fn new(gl: glow::Context) -> Self {
        use glow::HasContext;

        let float = has_color_buffer_float(gl.supported_extensions().iter().map(String::as_str));
        let trail_format = TrailFormat::select(float);
        if float {
            log::debug!("trail buffers use {trail_format}");
        } else {
            log::warn!("EXT_color_buffer_float unavailable, trail buffers fall back to {trail_format}");
        }
        Self { gl, trail_format }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    pub fn trail_format(&self) -> TrailFormat {
        self.trail_format
    }

    pub fn into_gl(self) -> glow::Context {
        self.gl
    }
}
