//! Reproducible description of a wind scene.
//!
//! A [`SceneConfig`] captures everything needed to recreate a render:
//! viewport size, field grid resolution, PRNG seed, frame count and the
//! free-form parameter overrides read by each component.

use crate::error::WindError;
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};

/// Longitude samples of the default global grid (1 degree).
pub const DEFAULT_GRID_NX: usize = 360;
/// Latitude samples of the default global grid (1 degree, both poles).
pub const DEFAULT_GRID_NY: usize = 181;

fn default_grid_nx() -> usize {
    DEFAULT_GRID_NX
}

fn default_grid_ny() -> usize {
    DEFAULT_GRID_NY
}

fn default_params() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Two identical configs produce bit-identical frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    #[serde(default = "default_grid_nx")]
    pub grid_nx: usize,
    #[serde(default = "default_grid_ny")]
    pub grid_ny: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub frames: usize,
    #[serde(default = "default_params")]
    pub params: serde_json::Value,
}

impl SceneConfig {
    /// Default grid, empty params, zero frames.
    pub fn new(width: usize, height: usize, seed: u64) -> Self {
        Self {
            width,
            height,
            grid_nx: DEFAULT_GRID_NX,
            grid_ny: DEFAULT_GRID_NY,
            seed,
            frames: 0,
            params: default_params(),
        }
    }

    /// Checks that the viewport is non-empty and no buffer size overflows.
    ///
    /// A zero-sized field grid is accepted: every sample is "no data" and
    /// particles simply stay put.
    pub fn validate(&self) -> Result<(), WindError> {
        if self.width == 0 || self.height == 0 {
            return Err(WindError::InvalidDimensions);
        }
        self.width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(WindError::InvalidDimensions)?;
        self.grid_nx
            .checked_mul(self.grid_ny)
            .ok_or(WindError::InvalidDimensions)?;
        Ok(())
    }

    pub fn viewport(&self) -> Result<Viewport, WindError> {
        self.validate()?;
        Viewport::new(self.width as f64, self.height as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_uses_global_grid_and_empty_params() {
        let c = SceneConfig::new(800, 600, 42);
        assert_eq!((c.grid_nx, c.grid_ny), (360, 181));
        assert_eq!(c.frames, 0);
        assert_eq!(c.params, json!({}));
    }

    #[test]
    fn json_round_trip_with_params() {
        let mut c = SceneConfig::new(1024, 512, 8675309);
        c.frames = 120;
        c.params = json!({"persistence": 0.95, "field": "waves"});
        let text = serde_json::to_string_pretty(&c).unwrap();
        let back: SceneConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(c, back);
    }

    #[test]
    fn missing_optional_keys_take_defaults() {
        let c: SceneConfig = serde_json::from_str(r#"{"width": 64, "height": 32}"#).unwrap();
        assert_eq!(c, SceneConfig::new(64, 32, 0));
    }

    #[test]
    fn validate_rejects_empty_viewport() {
        assert!(matches!(
            SceneConfig::new(0, 600, 1).validate(),
            Err(WindError::InvalidDimensions)
        ));
        assert!(SceneConfig::new(800, 0, 1).validate().is_err());
    }

    #[test]
    fn validate_rejects_overflowing_sizes() {
        assert!(SceneConfig::new(usize::MAX, 2, 1).validate().is_err());
        let mut c = SceneConfig::new(10, 10, 1);
        c.grid_nx = usize::MAX;
        c.grid_ny = 2;
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_accepts_empty_grid() {
        let mut c = SceneConfig::new(10, 10, 1);
        c.grid_nx = 0;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn viewport_matches_dimensions() {
        let vp = SceneConfig::new(300, 200, 1).viewport().unwrap();
        assert_eq!((vp.width(), vp.height()), (300.0, 200.0));
    }
}
