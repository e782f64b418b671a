//! PNG output for presented frames and field speed maps.

use std::path::Path;
use windtrail_core::pixel::{buffer_to_rgba, field_speed_rgba};
use windtrail_core::{ColorBuffer, ColorGradient, Srgb, VectorField, WindError};

fn write_rgba(rgba: Vec<u8>, width: usize, height: usize, path: &Path) -> Result<(), WindError> {
    let w = u32::try_from(width).map_err(|_| WindError::InvalidDimensions)?;
    let h = u32::try_from(height).map_err(|_| WindError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| WindError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path)
        .map_err(|e| WindError::Io(format!("{}: {e}", path.display())))
}

/// Writes a trail buffer flattened over `background`.
pub fn write_frame(buffer: &ColorBuffer, background: Srgb, path: &Path) -> Result<(), WindError> {
    write_rgba(
        buffer_to_rgba(buffer, background),
        buffer.width(),
        buffer.height(),
        path,
    )
}

/// Writes one pixel per field cell, colored by normalized speed.
pub fn write_speed_map(
    field: &VectorField,
    gradient: &ColorGradient,
    speed_factor: f64,
    path: &Path,
) -> Result<(), WindError> {
    if field.nx() == 0 || field.ny() == 0 {
        return Err(WindError::InvalidDimensions);
    }
    write_rgba(
        field_speed_rgba(field, gradient, speed_factor),
        field.nx(),
        field.ny(),
        path,
    )
}
