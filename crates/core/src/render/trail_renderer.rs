//! GPU implementation of the trail compositor.
//!
//! Same four steps as [`TrailCompositor`](crate::trail::TrailCompositor):
//! swap roles, fade the previous buffer into the current one, draw points
//! over it, present the result to the default framebuffer.

use super::context::GpuContext;
use super::shader::{build_program, ShaderError};
use super::shaders::{
    COLOR_ATTRIB, FADE_FRAGMENT, FULLSCREEN_VERTEX, POINTS_FRAGMENT, POINTS_VERTEX,
    POSITION_ATTRIB, PRESENT_FRAGMENT,
};
use super::target::TrailTarget;
use crate::particles::Particle;
use crate::ping_pong::{BufferSlot, PingPong};
use crate::trail::TrailParams;
use crate::viewport::Viewport;
use thiserror::Error;

/// Floats per particle in the vertex buffer: position xy, color rgb.
pub const FLOATS_PER_POINT: usize = 5;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("GL error: {0}")]
    Gl(String),
}

impl From<String> for RenderError {
    fn from(msg: String) -> Self {
        RenderError::Gl(msg)
    }
}

/// Interleaves particles as `[x, y, r, g, b]` native-endian `f32` bytes.
pub fn pack_points(particles: &[Particle]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(particles.len() * FLOATS_PER_POINT * 4);
    for p in particles {
        let c = p.color;
        for v in [p.position.x, p.position.y, c.r, c.g, c.b] {
            bytes.extend_from_slice(&(v as f32).to_ne_bytes());
        }
    }
    bytes
}

struct FadeProgram {
    program: glow::Program,
    previous: Option<glow::UniformLocation>,
    persistence: Option<glow::UniformLocation>,
    fade_edges: Option<glow::UniformLocation>,
}

struct PointsProgram {
    program: glow::Program,
    half_extent: Option<glow::UniformLocation>,
    point_size: Option<glow::UniformLocation>,
    opacity: Option<glow::UniformLocation>,
}

struct PresentProgram {
    program: glow::Program,
    frame: Option<glow::UniformLocation>,
}

pub struct GlTrailRenderer {
    targets: [TrailTarget; 2],
    roles: PingPong,
    params: TrailParams,
    fade: FadeProgram,
    points: PointsProgram,
    present: PresentProgram,
    fullscreen_vao: glow::VertexArray,
    points_vao: glow::VertexArray,
    points_vbo: glow::Buffer,
    screen_size: (u32, u32),
}

/// Fixed-function blend for the points pass over premultiplied targets.
pub const POINT_BLEND: (u32, u32) = (glow::ONE, glow::ONE_MINUS_SRC_ALPHA);

/// Deletes whatever a failed [`GlTrailRenderer::new`] had already created.
#[allow(unsafe_code)]
fn release(gl: &glow::Context, targets: &[TrailTarget], programs: &[glow::Program]) {
    use glow::HasContext;

    for target in targets {
        target.destroy(gl);
    }
    // SAFETY: the programs were linked on `gl` and never handed out.
    unsafe {
        for &program in programs {
            gl.delete_program(program);
        }
    }
}

/// Creates the empty fullscreen VAO plus the points VAO and its buffer.
#[allow(unsafe_code)]
fn create_vertex_objects(
    gl: &glow::Context,
) -> Result<(glow::VertexArray, glow::VertexArray, glow::Buffer), String> {
    use glow::HasContext;

    // SAFETY: every object is created here; on failure the ones that exist
    // are deleted before returning.
    unsafe {
        let fullscreen_vao = gl.create_vertex_array()?;
        let points_vao = match gl.create_vertex_array() {
            Ok(vao) => vao,
            Err(e) => {
                gl.delete_vertex_array(fullscreen_vao);
                return Err(e);
            }
        };
        let points_vbo = match gl.create_buffer() {
            Ok(vbo) => vbo,
            Err(e) => {
                gl.delete_vertex_array(points_vao);
                gl.delete_vertex_array(fullscreen_vao);
                return Err(e);
            }
        };

        gl.bind_vertex_array(Some(points_vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(points_vbo));
        let stride = (FLOATS_PER_POINT * 4) as i32;
        gl.enable_vertex_attrib_array(POSITION_ATTRIB);
        gl.vertex_attrib_pointer_f32(POSITION_ATTRIB, 2, glow::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(COLOR_ATTRIB);
        gl.vertex_attrib_pointer_f32(COLOR_ATTRIB, 3, glow::FLOAT, false, stride, 8);
        gl.bind_vertex_array(None);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        Ok((fullscreen_vao, points_vao, points_vbo))
    }
}

impl GlTrailRenderer {
    /// Compiles the programs and allocates both trail targets, cleared.
    ///
    /// On failure every GL object created so far is deleted.
    #[allow(unsafe_code)]
    pub fn new(
        ctx: &GpuContext,
        width: u32,
        height: u32,
        params: TrailParams,
    ) -> Result<Self, RenderError> {
        use glow::HasContext;
        let gl = ctx.gl();
        let format = ctx.trail_format();

        let first = TrailTarget::new(gl, format, width, height)?;
        let second = match TrailTarget::new(gl, format, width, height) {
            Ok(target) => target,
            Err(e) => {
                release(gl, &[first], &[]);
                return Err(e.into());
            }
        };
        let targets = [first, second];

        let mut programs = Vec::with_capacity(3);
        for (vertex, fragment) in [
            (FULLSCREEN_VERTEX, FADE_FRAGMENT),
            (POINTS_VERTEX, POINTS_FRAGMENT),
            (FULLSCREEN_VERTEX, PRESENT_FRAGMENT),
        ] {
            match build_program(gl, vertex, fragment) {
                Ok(program) => programs.push(program),
                Err(e) => {
                    release(gl, &targets, &programs);
                    return Err(e.into());
                }
            }
        }
        let (fade_program, points_program, present_program) =
            (programs[0], programs[1], programs[2]);

        let (fullscreen_vao, points_vao, points_vbo) = match create_vertex_objects(gl) {
            Ok(objects) => objects,
            Err(e) => {
                release(gl, &targets, &programs);
                return Err(e.into());
            }
        };

        // SAFETY: programs were linked on this context and are owned by the
        // renderer until destroy().
        let (fade, points, present) = unsafe {
            (
                FadeProgram {
                    program: fade_program,
                    previous: gl.get_uniform_location(fade_program, "u_previous"),
                    persistence: gl.get_uniform_location(fade_program, "u_persistence"),
                    fade_edges: gl.get_uniform_location(fade_program, "u_fade_edges"),
                },
                PointsProgram {
                    program: points_program,
                    half_extent: gl.get_uniform_location(points_program, "u_half_extent"),
                    point_size: gl.get_uniform_location(points_program, "u_point_size"),
                    opacity: gl.get_uniform_location(points_program, "u_opacity"),
                },
                PresentProgram {
                    program: present_program,
                    frame: gl.get_uniform_location(present_program, "u_frame"),
                },
            )
        };

        // SAFETY: plain state toggle on a live context.
        unsafe {
            #[cfg(not(target_arch = "wasm32"))]
            gl.enable(glow::PROGRAM_POINT_SIZE);
        }

        log::debug!("GL trail renderer ready at {width}x{height} ({format})");

        Ok(Self {
            targets,
            roles: PingPong::new(),
            params,
            fade,
            points,
            present,
            fullscreen_vao,
            points_vao,
            points_vbo,
            screen_size: (width, height),
        })
    }

    pub fn current_slot(&self) -> BufferSlot {
        self.roles.current()
    }

    pub fn params(&self) -> &TrailParams {
        &self.params
    }

    /// Renders one frame and presents it to the default framebuffer.
    #[allow(unsafe_code)]
    pub fn render_frame(&mut self, gl: &glow::Context, particles: &[Particle], viewport: &Viewport) {
        use glow::HasContext;

        self.roles.swap();
        let current = &self.targets[self.roles.current().index()];
        let previous = &self.targets[self.roles.previous().index()];
        let half = viewport.half_extent();
        let vertices = pack_points(particles);

        // SAFETY: every handle is owned by this renderer and was created on
        // `gl`; state changed here is restored to defaults at the end.
        unsafe {
            // Fade: replace the current buffer with the decayed previous one.
            // Targets hold premultiplied color, so every channel decays.
            current.bind(gl);
            gl.disable(glow::BLEND);
            gl.use_program(Some(self.fade.program));
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(previous.texture()));
            gl.uniform_1_i32(self.fade.previous.as_ref(), 0);
            gl.uniform_1_f32(self.fade.persistence.as_ref(), self.params.persistence as f32);
            gl.uniform_1_f32(self.fade.fade_edges.as_ref(), self.params.fade_edges as f32);
            gl.bind_vertex_array(Some(self.fullscreen_vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);

            // Points: premultiplied "over" the faded background.
            if !particles.is_empty() {
                gl.enable(glow::BLEND);
                let (src, dst) = POINT_BLEND;
                gl.blend_func(src, dst);
                gl.use_program(Some(self.points.program));
                gl.uniform_2_f32(self.points.half_extent.as_ref(), half.x as f32, half.y as f32);
                gl.uniform_1_f32(self.points.point_size.as_ref(), self.params.point_size as f32);
                gl.uniform_1_f32(self.points.opacity.as_ref(), self.params.point_opacity as f32);
                gl.bind_vertex_array(Some(self.points_vao));
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.points_vbo));
                gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, &vertices, glow::DYNAMIC_DRAW);
                gl.draw_arrays(glow::POINTS, 0, particles.len() as i32);
                gl.bind_buffer(glow::ARRAY_BUFFER, None);
                gl.disable(glow::BLEND);
            }

            // Present: same composite to the screen.
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            let (w, h) = self.screen_size;
            gl.viewport(0, 0, w as i32, h as i32);
            gl.use_program(Some(self.present.program));
            gl.bind_texture(glow::TEXTURE_2D, Some(current.texture()));
            gl.uniform_1_i32(self.present.frame.as_ref(), 0);
            gl.bind_vertex_array(Some(self.fullscreen_vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);

            gl.bind_vertex_array(None);
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.use_program(None);
        }
    }

    /// Reallocates and clears both targets. Call between frames only.
    pub fn resize(&mut self, gl: &glow::Context, width: u32, height: u32) -> Result<(), RenderError> {
        for target in &mut self.targets {
            target.resize(gl, width, height)?;
        }
        self.screen_size = (width, height);
        log::debug!(
            "GL trail targets resized to {width}x{height} ({})",
            self.targets[0].format()
        );
        Ok(())
    }

    #[allow(unsafe_code)]
    pub fn destroy(&self, gl: &glow::Context) {
        use glow::HasContext;

        for target in &self.targets {
            target.destroy(gl);
        }
        // SAFETY: handles are owned by this renderer and unused after this.
        unsafe {
            gl.delete_program(self.fade.program);
            gl.delete_program(self.points.program);
            gl.delete_program(self.present.program);
            gl.delete_vertex_array(self.fullscreen_vao);
            gl.delete_vertex_array(self.points_vao);
            gl.delete_buffer(self.points_vbo);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Srgb;
    use crate::trail::ColorBuffer;
    use glam::DVec2;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn pack_points_interleaves_position_and_color() {
        let particles = [
            Particle {
                position: DVec2::new(-3.0, 4.5),
                color: Srgb::new(0.25, 0.5, 1.0),
            },
            Particle {
                position: DVec2::new(10.0, 0.0),
                color: Srgb::WHITE,
            },
        ];
        let bytes = pack_points(&particles);
        assert_eq!(bytes.len(), 2 * FLOATS_PER_POINT * 4);
        assert_eq!(
            floats(&bytes),
            vec![-3.0, 4.5, 0.25, 0.5, 1.0, 10.0, 0.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn pack_points_of_nothing_is_empty() {
        assert!(pack_points(&[]).is_empty());
    }

    /// Evaluates the fixed-function blend equation `src * sf + dst * df`.
    fn gl_blend(factors: (u32, u32), src: [f64; 4], dst: [f64; 4]) -> [f64; 4] {
        let weight = |f: u32| match f {
            glow::ONE => 1.0,
            glow::ZERO => 0.0,
            glow::SRC_ALPHA => src[3],
            glow::ONE_MINUS_SRC_ALPHA => 1.0 - src[3],
            other => panic!("unexpected blend factor 0x{other:04X}"),
        };
        let (sf, df) = (weight(factors.0), weight(factors.1));
        std::array::from_fn(|i| src[i] * sf + dst[i] * df)
    }

    /// What `POINTS_FRAGMENT` emits for a particle color.
    fn point_fragment(color: Srgb, opacity: f64) -> [f64; 4] {
        [color.r * opacity, color.g * opacity, color.b * opacity, opacity]
    }

    fn unpremultiply(p: [f64; 4]) -> [f64; 4] {
        if p[3] <= 0.0 {
            return [0.0; 4];
        }
        [p[0] / p[3], p[1] / p[3], p[2] / p[3], p[3]]
    }

    #[test]
    fn point_blend_matches_cpu_over_operator() {
        let strokes = [
            (Srgb::new(1.0, 0.0, 0.0), 0.01),
            (Srgb::new(0.0, 0.0, 1.0), 0.8),
            (Srgb::new(0.2, 0.9, 0.4), 0.35),
            (Srgb::WHITE, 0.8),
        ];
        let mut cpu = ColorBuffer::new(1, 1);
        let mut gpu = [0.0; 4];
        for (color, opacity) in strokes {
            cpu.blend(0, 0, color, opacity);
            gpu = gl_blend(POINT_BLEND, point_fragment(color, opacity), gpu);

            let expected = cpu.get(0, 0).unwrap();
            let got = unpremultiply(gpu);
            for (e, g) in expected.iter().zip(got) {
                assert!((e - g).abs() < 1e-12, "cpu {expected:?} gpu {got:?}");
            }
        }
    }

    #[test]
    fn faint_trail_under_opaque_point_barely_tints() {
        let trail = point_fragment(Srgb::new(1.0, 0.0, 0.0), 0.01);
        let out = unpremultiply(gl_blend(
            POINT_BLEND,
            point_fragment(Srgb::new(0.0, 0.0, 1.0), 0.8),
            trail,
        ));
        assert!((out[0] - 0.002 / 0.802).abs() < 1e-12, "{out:?}");
        assert!((out[2] - 0.8 / 0.802).abs() < 1e-12, "{out:?}");
        assert!((out[3] - 0.802).abs() < 1e-12);
    }

    #[test]
    fn string_errors_become_gl_errors() {
        let err: RenderError = String::from("out of memory").into();
        assert_eq!(err.to_string(), "GL error: out of memory");
    }

    #[test]
    #[ignore = "requires GL context"]
    fn render_frame_alternates_targets() {}

    #[test]
    #[ignore = "requires GL context"]
    fn resize_clears_both_targets() {}

    #[test]
    #[ignore = "requires GL context"]
    fn failed_setup_deletes_created_objects() {}
}
