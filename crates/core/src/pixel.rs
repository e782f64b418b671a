//! RGBA8 conversion for trail buffers and field speed maps.
//!
//! Output is always opaque, row-major, top row first, `width * height * 4`
//! bytes, ready for `image::RgbaImage::from_raw`.

use crate::color::Srgb;
use crate::field::VectorField;
use crate::gradient::ColorGradient;
use crate::trail::ColorBuffer;

fn to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Flattens a straight-alpha buffer over an opaque `background`.
pub fn buffer_to_rgba(buffer: &ColorBuffer, background: Srgb) -> Vec<u8> {
    buffer
        .pixels()
        .iter()
        .flat_map(|&[r, g, b, a]| {
            let a = a.clamp(0.0, 1.0);
            let over = |c: f64, bg: f64| to_byte(c * a + bg * (1.0 - a));
            [
                over(r, background.r),
                over(g, background.g),
                over(b, background.b),
                255u8,
            ]
        })
        .collect()
}

/// Colors every cell by its normalized speed, the same mapping particles use.
///
/// Field row 0 is the bottom of the viewport, so rows are emitted in reverse.
pub fn field_speed_rgba(field: &VectorField, gradient: &ColorGradient, speed_factor: f64) -> Vec<u8> {
    let (nx, ny) = (field.nx(), field.ny());
    let inv_max = 1.0 / field.max_magnitude();
    let mut out = Vec::with_capacity(nx * ny * 4);
    for y in (0..ny).rev() {
        for x in 0..nx {
            let v = field.get(x, y).unwrap_or_default();
            let speed = (v.length() * inv_max * speed_factor).min(1.0);
            let [r, g, b] = gradient.color_for(speed).to_rgb8();
            out.extend_from_slice(&[r, g, b, 255]);
        }
    }
    out
}
