//! OpenGL / WebGL2 trail renderer (feature `render`).
//!
//! - [`context`]: context wrapper and trail format selection.
//! - [`shader`]: program compilation with annotated error reports.
//! - [`shaders`]: GLSL sources for the fade, points and present passes.
//! - [`target`]: framebuffer + texture trail buffers.
//! - [`trail_renderer`]: the per-frame pass sequence.

pub mod context;
pub mod shader;
pub mod shaders;
pub mod target;
pub mod trail_renderer;

pub use context::{GpuContext, TrailFormat};
pub use shader::{annotate_source, build_program, ShaderError, ShaderStage};
pub use target::TrailTarget;
pub use trail_renderer::{GlTrailRenderer, RenderError};
