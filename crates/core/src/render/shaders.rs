//! GLSL ES 3.0 sources for the trail passes.
//!
//! Trail targets hold premultiplied color, so the fade scales all four
//! channels and points blend with `(ONE, ONE_MINUS_SRC_ALPHA)`. This is the
//! same straight-alpha "over" the CPU compositor computes.
//!
//! The fade and present passes draw a single oversized triangle generated
//! from `gl_VertexID` (bind an empty VAO, draw 3 vertices). Points read an
//! interleaved `[x, y, r, g, b]` float buffer in world units.

/// Fullscreen triangle emitting `v_uv` in [0, 1]^2.
pub const FULLSCREEN_VERTEX: &str = r#"#version 300 es
out vec2 v_uv;
void main() {
    v_uv = vec2((gl_VertexID << 1) & 2, gl_VertexID & 2);
    gl_Position = vec4(v_uv * 2.0 - 1.0, 0.0, 1.0);
}
"#;

/// Copies the previous buffer with decayed, vignetted coverage.
pub const FADE_FRAGMENT: &str = r#"#version 300 es
precision highp float;
in vec2 v_uv;
uniform sampler2D u_previous;
uniform float u_persistence;
uniform float u_fade_edges;
out vec4 frag_color;
void main() {
    vec4 texel = texture(u_previous, v_uv);
    float dist = length(v_uv - 0.5) * 2.0;
    float edge = smoothstep(1.0 - u_fade_edges, 1.0, dist);
    frag_color = texel * (u_persistence * (1.0 - edge));
}
"#;

/// Copies the finished trail buffer; premultiplied output reads as the
/// trails over black.
pub const PRESENT_FRAGMENT: &str = r#"#version 300 es
precision highp float;
in vec2 v_uv;
uniform sampler2D u_frame;
out vec4 frag_color;
void main() {
    frag_color = texture(u_frame, v_uv);
}
"#;

/// Orthographic projection of world-space particles onto the viewport.
pub const POINTS_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec3 a_color;
uniform vec2 u_half_extent;
uniform float u_point_size;
out vec3 v_color;
void main() {
    v_color = a_color;
    gl_Position = vec4(a_position / u_half_extent, 0.0, 1.0);
    gl_PointSize = u_point_size;
}
"#;

pub const POINTS_FRAGMENT: &str = r#"#version 300 es
precision mediump float;
in vec3 v_color;
uniform float u_opacity;
out vec4 frag_color;
void main() {
    frag_color = vec4(v_color * u_opacity, u_opacity);
}
"#;

/// Attribute slots fixed by `layout(location = ...)` in [`POINTS_VERTEX`].
pub const POSITION_ATTRIB: u32 = 0;
pub const COLOR_ATTRIB: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [&str; 5] = [
        FULLSCREEN_VERTEX,
        FADE_FRAGMENT,
        PRESENT_FRAGMENT,
        POINTS_VERTEX,
        POINTS_FRAGMENT,
    ];

    #[test]
    fn every_source_starts_with_es3_version() {
        for src in ALL {
            assert!(src.starts_with("#version 300 es\n"), "{src}");
            assert!(src.contains("void main()"));
        }
    }

    #[test]
    fn fragment_sources_declare_precision() {
        for src in [FADE_FRAGMENT, PRESENT_FRAGMENT, POINTS_FRAGMENT] {
            assert!(src.contains("precision "), "{src}");
        }
    }

    #[test]
    fn fade_scales_every_premultiplied_channel() {
        assert!(FADE_FRAGMENT.contains("smoothstep(1.0 - u_fade_edges, 1.0, dist)"));
        assert!(FADE_FRAGMENT.contains("texel * (u_persistence * (1.0 - edge))"));
        assert!(!FADE_FRAGMENT.contains("texel.rgb"));
    }

    #[test]
    fn points_emit_premultiplied_color() {
        assert!(POINTS_FRAGMENT.contains("vec4(v_color * u_opacity, u_opacity)"));
    }

    #[test]
    fn varyings_match_between_stages() {
        assert!(FULLSCREEN_VERTEX.contains("out vec2 v_uv"));
        assert!(FADE_FRAGMENT.contains("in vec2 v_uv"));
        assert!(POINTS_VERTEX.contains("out vec3 v_color"));
        assert!(POINTS_FRAGMENT.contains("in vec3 v_color"));
    }

    #[test]
    fn attribute_slots_match_layout_qualifiers() {
        assert!(POINTS_VERTEX.contains(&format!("location = {POSITION_ATTRIB}) in vec2 a_position")));
        assert!(POINTS_VERTEX.contains(&format!("location = {COLOR_ATTRIB}) in vec3 a_color")));
    }
}
