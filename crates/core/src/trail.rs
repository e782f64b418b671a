//! Software trail compositor.
//!
//! Trails come from buffer persistence, not per-particle history. Every
//! frame the previous buffer is copied into the current one with its alpha
//! scaled by `persistence` and an edge vignette, fresh particles are drawn
//! on top, and the same composite is presented to the screen buffer. Old
//! positions therefore fade geometrically frame after frame.
//!
//! Buffers hold straight (non-premultiplied) RGBA in `f64`. Row 0 is the
//! top of the screen; world `(x, y)` maps to pixel `(x + w/2, h/2 - y)`.

use crate::color::Srgb;
use crate::params::{number_schema, param_f64_clamped};
use crate::particles::Particle;
use crate::ping_pong::{BufferSlot, PingPong};
use crate::viewport::Viewport;
use glam::DVec2;
use serde_json::{json, Value};

const DEFAULT_PERSISTENCE: f64 = 0.97;
const DEFAULT_FADE_EDGES: f64 = 0.05;
const DEFAULT_POINT_SIZE: f64 = 1.5;
const DEFAULT_POINT_OPACITY: f64 = 0.8;

/// Tunables for the fade and point passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailParams {
    /// Alpha multiplier applied to the previous frame. Higher = longer trails.
    pub persistence: f64,
    /// Width of the vignette band, in units of the centre-to-corner distance.
    pub fade_edges: f64,
    /// Point diameter in pixels.
    pub point_size: f64,
    pub point_opacity: f64,
}

impl Default for TrailParams {
    fn default() -> Self {
        Self {
            persistence: DEFAULT_PERSISTENCE,
            fade_edges: DEFAULT_FADE_EDGES,
            point_size: DEFAULT_POINT_SIZE,
            point_opacity: DEFAULT_POINT_OPACITY,
        }
    }
}

impl TrailParams {
    pub fn from_json(params: &Value) -> Self {
        Self {
            persistence: param_f64_clamped(params, "persistence", DEFAULT_PERSISTENCE, 0.0, 1.0),
            fade_edges: param_f64_clamped(params, "fade_edges", DEFAULT_FADE_EDGES, 0.0, 1.0),
            point_size: param_f64_clamped(params, "point_size", DEFAULT_POINT_SIZE, 0.5, 64.0),
            point_opacity: param_f64_clamped(
                params,
                "point_opacity",
                DEFAULT_POINT_OPACITY,
                0.0,
                1.0,
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "persistence": self.persistence,
            "fade_edges": self.fade_edges,
            "point_size": self.point_size,
            "point_opacity": self.point_opacity,
        })
    }

    pub fn schema() -> Value {
        json!({
            "persistence": number_schema(DEFAULT_PERSISTENCE, 0.0, 1.0, "Fraction of trail alpha kept each frame"),
            "fade_edges": number_schema(DEFAULT_FADE_EDGES, 0.0, 1.0, "Width of the vignette that erases trails near the border"),
            "point_size": number_schema(DEFAULT_POINT_SIZE, 0.5, 64.0, "Particle point diameter in pixels"),
            "point_opacity": number_schema(DEFAULT_POINT_OPACITY, 0.0, 1.0, "Alpha of freshly drawn particles"),
        })
    }
}

/// GLSL-style `smoothstep`. A zero-width edge degrades to a hard step.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge1 <= edge0 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Vignette strength at texture coordinate `uv` in [0, 1]^2.
///
/// `smoothstep(1 - fade_edges, 1, |uv - 0.5| * 2)`: 0 in the interior,
/// rising to 1 at the inscribed circle's rim and beyond.
pub fn edge_fade(uv: DVec2, fade_edges: f64) -> f64 {
    let dist = (uv - DVec2::splat(0.5)).length() * 2.0;
    smoothstep(1.0 - fade_edges, 1.0, dist)
}

/// An RGBA surface with straight alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBuffer {
    width: usize,
    height: usize,
    pixels: Vec<[f64; 4]>,
}

impl ColorBuffer {
    /// Allocates a fully transparent black buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[[f64; 4]] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<[f64; 4]> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
    }

    /// Composites `color` at `alpha` over pixel `(x, y)` ("over" operator).
    pub(crate) fn blend(&mut self, x: usize, y: usize, color: Srgb, alpha: f64) {
        let dst = &mut self.pixels[y * self.width + x];
        let keep = dst[3] * (1.0 - alpha);
        let out_a = alpha + keep;
        if out_a <= 0.0 {
            *dst = [0.0; 4];
            return;
        }
        let mix = |s: f64, d: f64| (s * alpha + d * keep) / out_a;
        *dst = [
            mix(color.r, dst[0]),
            mix(color.g, dst[1]),
            mix(color.b, dst[2]),
            out_a,
        ];
    }
}

/// Pixel dimensions for a viewport (at least 1x1).
fn buffer_size(viewport: &Viewport) -> (usize, usize) {
    let px = |v: f64| (v.round() as usize).max(1);
    (px(viewport.width()), px(viewport.height()))
}

/// Double-buffered trail renderer with a presented screen buffer.
#[derive(Debug, Clone)]
pub struct TrailCompositor {
    buffers: [ColorBuffer; 2],
    screen: ColorBuffer,
    roles: PingPong,
    params: TrailParams,
    frames: u64,
}

impl TrailCompositor {
    /// Allocates both trail buffers and the screen, all cleared.
    pub fn new(viewport: &Viewport, params: TrailParams) -> Self {
        let (w, h) = buffer_size(viewport);
        Self {
            buffers: [ColorBuffer::new(w, h), ColorBuffer::new(w, h)],
            screen: ColorBuffer::new(w, h),
            roles: PingPong::new(),
            params,
            frames: 0,
        }
    }

    pub fn params(&self) -> &TrailParams {
        &self.params
    }

    /// Buffer currently designated as the render target.
    pub fn current_slot(&self) -> BufferSlot {
        self.roles.current()
    }

    pub fn buffer(&self, slot: BufferSlot) -> &ColorBuffer {
        &self.buffers[slot.index()]
    }

    /// The last presented frame.
    pub fn screen(&self) -> &ColorBuffer {
        &self.screen
    }

    /// Frames rendered since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Renders one frame: swap, fade, draw points, present.
    pub fn render_frame(&mut self, particles: &[Particle], viewport: &Viewport) {
        self.roles.swap();
        let [a, b] = &mut self.buffers;
        let (current, previous) = match self.roles.current() {
            BufferSlot::A => (a, &*b),
            BufferSlot::B => (b, &*a),
        };

        fade_pass(previous, current, &self.params);
        draw_points(current, particles, viewport, &self.params);

        // Second render of the same scene, to the screen.
        self.screen.pixels.copy_from_slice(&current.pixels);
        self.frames += 1;
    }

    /// Reallocates and clears both trail buffers and the screen.
    ///
    /// Takes `&mut self`, so it can only run between frames.
    pub fn resize(&mut self, viewport: &Viewport) {
        let (w, h) = buffer_size(viewport);
        self.buffers = [ColorBuffer::new(w, h), ColorBuffer::new(w, h)];
        self.screen = ColorBuffer::new(w, h);
        log::debug!("trail buffers reallocated at {w}x{h}");
    }
}

/// Writes `previous` into `current` with alpha decayed by persistence and vignette.
fn fade_pass(previous: &ColorBuffer, current: &mut ColorBuffer, params: &TrailParams) {
    let (w, h) = (current.width, current.height);
    for y in 0..h {
        let v = (y as f64 + 0.5) / h as f64;
        for x in 0..w {
            let u = (x as f64 + 0.5) / w as f64;
            let i = y * w + x;
            let texel = previous.pixels[i];
            let vignette = 1.0 - edge_fade(DVec2::new(u, v), params.fade_edges);
            let alpha = texel[3] * params.persistence * vignette;
            current.pixels[i] = [texel[0], texel[1], texel[2], alpha];
        }
    }
}

/// Pixel range `[start, end)` whose centres fall inside a point of `size` at `c`.
///
/// Always covers at least the pixel containing `c`.
fn footprint(c: f64, size: f64, limit: usize) -> std::ops::Range<usize> {
    let half = size * 0.5;
    let mut start = (c - half - 0.5).ceil();
    let mut end = (c + half - 0.5).ceil();
    if end <= start {
        start = c.floor();
        end = start + 1.0;
    }
    let clamp = |v: f64| v.clamp(0.0, limit as f64) as usize;
    clamp(start)..clamp(end)
}

fn draw_points(
    target: &mut ColorBuffer,
    particles: &[Particle],
    viewport: &Viewport,
    params: &TrailParams,
) {
    let half = viewport.half_extent();
    let sx = target.width as f64 / viewport.width();
    let sy = target.height as f64 / viewport.height();
    for p in particles {
        let cx = (p.position.x + half.x) * sx;
        let cy = (half.y - p.position.y) * sy;
        for y in footprint(cy, params.point_size, target.height) {
            for x in footprint(cx, params.point_size, target.width) {
                target.blend(x, y, p.color, params.point_opacity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(w: f64, h: f64) -> Viewport {
        Viewport::new(w, h).unwrap()
    }

    fn particle(x: f64, y: f64, color: Srgb) -> Particle {
        Particle {
            position: DVec2::new(x, y),
            color,
        }
    }

    /// Alpha of a pixel in the most recently written buffer.
    fn alpha_at(c: &TrailCompositor, x: usize, y: usize) -> f64 {
        c.buffer(c.current_slot()).get(x, y).unwrap()[3]
    }

    #[test]
    fn smoothstep_matches_glsl() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(1.0, 1.0, 0.99), 0.0);
        assert_eq!(smoothstep(1.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn edge_fade_is_zero_in_centre_and_one_past_rim() {
        assert_eq!(edge_fade(DVec2::splat(0.5), 0.05), 0.0);
        assert_eq!(edge_fade(DVec2::new(0.7, 0.5), 0.05), 0.0);
        assert_eq!(edge_fade(DVec2::new(0.0, 0.0), 0.05), 1.0);
        let band = edge_fade(DVec2::new(0.99, 0.5), 0.05);
        assert!(band > 0.0 && band < 1.0, "band = {band}");
    }

    #[test]
    fn new_buffers_are_cleared_and_sized_to_viewport() {
        let c = TrailCompositor::new(&vp(64.0, 32.0), TrailParams::default());
        for slot in [BufferSlot::A, BufferSlot::B] {
            let b = c.buffer(slot);
            assert_eq!((b.width(), b.height()), (64, 32));
            assert!(b.pixels().iter().all(|p| *p == [0.0; 4]));
        }
        assert_eq!(c.current_slot(), BufferSlot::A);
    }

    #[test]
    fn roles_alternate_with_frame_parity() {
        let v = vp(16.0, 16.0);
        let mut c = TrailCompositor::new(&v, TrailParams::default());
        for n in 1..=10u64 {
            c.render_frame(&[], &v);
            let expected = if n % 2 == 0 { BufferSlot::A } else { BufferSlot::B };
            assert_eq!(c.current_slot(), expected, "frame {n}");
            assert_eq!(c.frames(), n);
        }
    }

    #[test]
    fn point_is_drawn_at_mapped_pixel() {
        let v = vp(100.0, 50.0);
        let mut c = TrailCompositor::new(&v, TrailParams::default());
        // World (0, 0) sits at pixel (50, 25); +y is up so (10, 10) is row 15.
        c.render_frame(&[particle(10.2, 10.2, Srgb::new(1.0, 0.0, 0.0))], &v);
        let px = c.screen().get(60, 14).unwrap();
        assert!((px[3] - 0.8).abs() < 1e-12, "alpha = {}", px[3]);
        assert_eq!(&px[..3], &[1.0, 0.0, 0.0]);
        assert_eq!(c.screen().get(10, 10).unwrap(), [0.0; 4]);
    }

    #[test]
    fn screen_matches_current_buffer() {
        let v = vp(40.0, 40.0);
        let mut c = TrailCompositor::new(&v, TrailParams::default());
        c.render_frame(&[particle(0.0, 0.0, Srgb::WHITE)], &v);
        c.render_frame(&[particle(5.0, 5.0, Srgb::WHITE)], &v);
        assert_eq!(c.screen(), c.buffer(c.current_slot()));
    }

    #[test]
    fn untouched_pixel_decays_by_persistence_each_frame() {
        let v = vp(100.0, 100.0);
        let params = TrailParams {
            point_size: 1.0,
            ..TrailParams::default()
        };
        let mut c = TrailCompositor::new(&v, params);
        c.render_frame(&[particle(0.5, -0.5, Srgb::WHITE)], &v);
        let mut alpha = alpha_at(&c, 50, 50);
        assert!((alpha - 0.8).abs() < 1e-12);

        for _ in 0..200 {
            c.render_frame(&[], &v);
            let next = alpha_at(&c, 50, 50);
            assert!((next - alpha * 0.97).abs() < 1e-12, "{next} vs {alpha}");
            assert!(next >= 0.0);
            alpha = next;
        }
        assert!(alpha < 0.8 * 0.97f64.powi(199));
    }

    #[test]
    fn trail_color_survives_decay() {
        let v = vp(20.0, 20.0);
        let mut c = TrailCompositor::new(&v, TrailParams::default());
        let red = Srgb::new(1.0, 0.0, 0.0);
        c.render_frame(&[particle(0.5, -0.5, red)], &v);
        c.render_frame(&[], &v);
        let px = c.screen().get(10, 10).unwrap();
        assert_eq!(&px[..3], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn vignette_erases_trails_in_corners() {
        let v = vp(50.0, 50.0);
        let mut c = TrailCompositor::new(&v, TrailParams::default());
        c.render_frame(&[particle(-24.5, 24.5, Srgb::WHITE)], &v);
        assert!(alpha_at(&c, 0, 0) > 0.0);
        c.render_frame(&[], &v);
        assert_eq!(alpha_at(&c, 0, 0), 0.0);
    }

    #[test]
    fn overlapping_points_accumulate_alpha() {
        let v = vp(10.0, 10.0);
        let mut c = TrailCompositor::new(&v, TrailParams::default());
        let p = particle(0.5, -0.5, Srgb::WHITE);
        c.render_frame(&[p, p], &v);
        let a = alpha_at(&c, 5, 5);
        assert!((a - (0.8 + 0.8 * 0.2)).abs() < 1e-12, "alpha = {a}");
    }

    #[test]
    fn large_points_cover_square_footprint() {
        let v = vp(20.0, 20.0);
        let params = TrailParams {
            point_size: 3.0,
            ..TrailParams::default()
        };
        let mut c = TrailCompositor::new(&v, params);
        c.render_frame(&[particle(0.5, -0.5, Srgb::WHITE)], &v);
        let covered = c.screen().pixels().iter().filter(|p| p[3] > 0.0).count();
        assert_eq!(covered, 9);
    }

    #[test]
    fn points_on_the_border_are_clipped_not_wrapped() {
        let v = vp(10.0, 10.0);
        let mut c = TrailCompositor::new(&v, TrailParams::default());
        c.render_frame(&[particle(5.0, 5.0, Srgb::WHITE)], &v);
        let covered = c.screen().pixels().iter().filter(|p| p[3] > 0.0).count();
        assert!(covered >= 1);
        assert!(c.screen().get(9, 0).unwrap()[3] > 0.0);
    }

    #[test]
    fn resize_reallocates_and_clears_everything() {
        let v = vp(30.0, 30.0);
        let mut c = TrailCompositor::new(&v, TrailParams::default());
        c.render_frame(&[particle(0.0, 0.0, Srgb::WHITE)], &v);
        let bigger = vp(60.0, 45.0);
        c.resize(&bigger);
        for slot in [BufferSlot::A, BufferSlot::B] {
            let b = c.buffer(slot);
            assert_eq!((b.width(), b.height()), (60, 45));
            assert!(b.pixels().iter().all(|p| *p == [0.0; 4]));
        }
        assert_eq!(c.screen().width(), 60);
        c.render_frame(&[], &bigger);
        assert!(c.screen().pixels().iter().all(|p| p[3] == 0.0));
    }

    #[test]
    fn params_from_json_clamps_persistence() {
        let p = TrailParams::from_json(&json!({"persistence": 1.5, "point_size": 2}));
        assert_eq!(p.persistence, 1.0);
        assert_eq!(p.point_size, 2.0);
        assert_eq!(p.fade_edges, DEFAULT_FADE_EDGES);
        assert_eq!(TrailParams::from_json(&p.to_json()), p);
    }
}
