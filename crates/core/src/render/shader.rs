//! GLSL program building with readable failure reports.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_type(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{report}")]
    Compile { stage: ShaderStage, report: String },
    #[error("program failed to link:\n{0}")]
    Link(String),
    #[error("could not allocate GL object: {0}")]
    Allocate(String),
}

/// Source listing with line numbers followed by the driver log.
///
/// Driver logs cite `0:LINE`, so the listing makes them easy to match up.
/// Numbers are right-aligned to the widest one.
pub fn annotate_source(source: &str, log: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().max(1).to_string().len();
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{:>width$}: {line}", i + 1));
    }
    let log = log.trim_end();
    if !log.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(log);
    }
    out
}

/// Compiles one stage, deleting the shader object again on failure.
#[allow(unsafe_code)]
pub fn compile_stage(
    gl: &glow::Context,
    stage: ShaderStage,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    use glow::HasContext;

    // SAFETY: every handle used below was just created by this context and
    // is deleted on the failure path before returning.
    unsafe {
        let shader = gl.create_shader(stage.gl_type()).map_err(ShaderError::Allocate)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if gl.get_shader_compile_status(shader) {
            return Ok(shader);
        }
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        Err(ShaderError::Compile {
            stage,
            report: annotate_source(source, &log),
        })
    }
}

/// Compiles both stages and links them. Stage objects never outlive the call.
#[allow(unsafe_code)]
pub fn build_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, ShaderError> {
    use glow::HasContext;

    let vertex = compile_stage(gl, ShaderStage::Vertex, vertex_src)?;
    let fragment = match compile_stage(gl, ShaderStage::Fragment, fragment_src) {
        Ok(f) => f,
        Err(e) => {
            // SAFETY: `vertex` compiled successfully on this context.
            unsafe { gl.delete_shader(vertex) };
            return Err(e);
        }
    };

    // SAFETY: both shaders are live handles from this context; they are
    // detached and deleted whatever the link outcome.
    unsafe {
        let linked = gl.create_program().map_err(ShaderError::Allocate).map(|program| {
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            program
        });
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);

        let program = linked?;
        if gl.get_program_link_status(program) {
            Ok(program)
        } else {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            Err(ShaderError::Link(log))
        }
    }
}
