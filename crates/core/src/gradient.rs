//! Piecewise-linear speed-to-color gradient.
//!
//! A [`ColorGradient`] is a list of [`GradientStop`]s covering [0, 1] with
//! strictly increasing speeds. Sampling clamps outside the covered range and
//! interpolates each sRGB channel linearly between the bracketing stops.

use crate::color::Srgb;
use crate::error::WindError;
use serde::{Deserialize, Serialize};

/// One gradient key: the color reached at a normalized speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub speed: f64,
    pub color: Srgb,
}

impl GradientStop {
    pub const fn new(speed: f64, color: Srgb) -> Self {
        Self { speed, color }
    }
}

/// Dark blue through white to red.
const WIND_STOPS: [GradientStop; 6] = [
    GradientStop::new(0.0, Srgb::new(0.2, 0.2, 0.5)),
    GradientStop::new(0.2, Srgb::new(0.5, 0.5, 1.0)),
    GradientStop::new(0.4, Srgb::new(1.0, 1.0, 1.0)),
    GradientStop::new(0.6, Srgb::new(1.0, 0.8, 0.2)),
    GradientStop::new(0.8, Srgb::new(1.0, 0.4, 0.0)),
    GradientStop::new(1.0, Srgb::new(1.0, 0.0, 0.0)),
];

/// Validated color gradient over normalized speed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColorGradient {
    stops: Vec<GradientStop>,
}

impl ColorGradient {
    /// Builds a gradient, rejecting stop lists that could make interpolation
    /// degenerate or produce out-of-gamut colors.
    ///
    /// Requirements: at least two stops, first speed exactly 0, last exactly
    /// 1, speeds strictly increasing, every channel in [0, 1].
    pub fn new(stops: Vec<GradientStop>) -> Result<Self, WindError> {
        let invalid = |msg: String| Err(WindError::InvalidGradient(msg));

        let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
            return invalid("gradient requires at least 2 stops, got 0".into());
        };
        if stops.len() < 2 {
            return invalid(format!(
                "gradient requires at least 2 stops, got {}",
                stops.len()
            ));
        }
        if first.speed != 0.0 {
            return invalid(format!("first stop must be at speed 0, got {}", first.speed));
        }
        if last.speed != 1.0 {
            return invalid(format!("last stop must be at speed 1, got {}", last.speed));
        }
        if let Some(i) = stops.windows(2).position(|w| !(w[0].speed < w[1].speed)) {
            return invalid(format!(
                "stop speeds must be strictly increasing: {} then {}",
                stops[i].speed,
                stops[i + 1].speed
            ));
        }
        if let Some(stop) = stops.iter().find(|s| !s.color.is_in_gamut()) {
            return invalid(format!(
                "stop at speed {} has a color outside [0, 1]: {:?}",
                stop.speed, stop.color
            ));
        }
        Ok(Self { stops })
    }

    /// The six-stop wind gradient: dark blue, blue, white, yellow, orange, red.
    pub fn wind() -> Self {
        Self {
            stops: WIND_STOPS.to_vec(),
        }
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Color for a normalized speed.
    ///
    /// Speeds at or beyond either end return that end's color unchanged.
    /// NaN maps to the first color. Otherwise the first bracketing pair in
    /// ascending order is interpolated.
    pub fn color_for(&self, speed: f64) -> Srgb {
        let n = self.stops.len();
        let (first, last) = (&self.stops[0], &self.stops[n - 1]);

        if speed.is_nan() || speed <= first.speed {
            return first.color;
        }
        if speed >= last.speed {
            return last.color;
        }

        let (lower, upper) = self
            .stops
            .windows(2)
            .map(|w| (&w[0], &w[1]))
            .find(|(lo, hi)| lo.speed <= speed && speed <= hi.speed)
            .unwrap_or((first, last));

        let t = (speed - lower.speed) / (upper.speed - lower.speed);
        lower.color.lerp(upper.color, t)
    }
}

impl Default for ColorGradient {
    fn default() -> Self {
        Self::wind()
    }
}

impl<'de> Deserialize<'de> for ColorGradient {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stops = Vec::<GradientStop>::deserialize(deserializer)?;
        ColorGradient::new(stops).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn approx(a: Srgb, b: Srgb) -> bool {
        (a.r - b.r).abs() < EPSILON && (a.g - b.g).abs() < EPSILON && (a.b - b.b).abs() < EPSILON
    }

    #[test]
    fn below_range_clamps_to_first_color() {
        let g = ColorGradient::wind();
        assert_eq!(g.color_for(-5.0), Srgb::new(0.2, 0.2, 0.5));
        assert_eq!(g.color_for(0.0), Srgb::new(0.2, 0.2, 0.5));
    }

    #[test]
    fn above_range_clamps_to_last_color() {
        let g = ColorGradient::wind();
        assert_eq!(g.color_for(5.0), Srgb::new(1.0, 0.0, 0.0));
        assert_eq!(g.color_for(1.0), Srgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn exact_stop_returns_stop_color() {
        let g = ColorGradient::wind();
        assert!(approx(g.color_for(0.4), Srgb::WHITE), "{:?}", g.color_for(0.4));
    }

    #[test]
    fn midpoint_of_first_segment_averages_endpoints() {
        let g = ColorGradient::wind();
        let c = g.color_for(0.1);
        assert!(approx(c, Srgb::new(0.35, 0.35, 0.75)), "got {c:?}");
    }

    #[test]
    fn interpolation_inside_upper_segment() {
        let g = ColorGradient::wind();
        // Quarter of the way from yellow (0.6) to orange (0.8).
        let c = g.color_for(0.65);
        assert!(approx(c, Srgb::new(1.0, 0.7, 0.15)), "got {c:?}");
    }

    #[test]
    fn nan_maps_to_first_color() {
        let g = ColorGradient::wind();
        assert_eq!(g.color_for(f64::NAN), Srgb::new(0.2, 0.2, 0.5));
    }

    #[test]
    fn new_rejects_too_few_stops() {
        assert!(matches!(
            ColorGradient::new(vec![]),
            Err(WindError::InvalidGradient(_))
        ));
        assert!(ColorGradient::new(vec![GradientStop::new(0.0, Srgb::BLACK)]).is_err());
    }

    #[test]
    fn new_rejects_wrong_endpoints() {
        let r = ColorGradient::new(vec![
            GradientStop::new(0.1, Srgb::BLACK),
            GradientStop::new(1.0, Srgb::WHITE),
        ]);
        assert!(r.unwrap_err().to_string().contains("first stop"));
        let r = ColorGradient::new(vec![
            GradientStop::new(0.0, Srgb::BLACK),
            GradientStop::new(0.9, Srgb::WHITE),
        ]);
        assert!(r.unwrap_err().to_string().contains("last stop"));
    }

    #[test]
    fn new_rejects_repeated_speed() {
        let r = ColorGradient::new(vec![
            GradientStop::new(0.0, Srgb::BLACK),
            GradientStop::new(0.5, Srgb::WHITE),
            GradientStop::new(0.5, Srgb::BLACK),
            GradientStop::new(1.0, Srgb::WHITE),
        ]);
        assert!(r.unwrap_err().to_string().contains("strictly increasing"));
    }

    #[test]
    fn new_rejects_nan_speed() {
        let r = ColorGradient::new(vec![
            GradientStop::new(0.0, Srgb::BLACK),
            GradientStop::new(f64::NAN, Srgb::WHITE),
            GradientStop::new(1.0, Srgb::WHITE),
        ]);
        assert!(r.is_err());
    }

    #[test]
    fn new_rejects_out_of_gamut_color() {
        let r = ColorGradient::new(vec![
            GradientStop::new(0.0, Srgb::BLACK),
            GradientStop::new(1.0, Srgb::new(1.2, 0.0, 0.0)),
        ]);
        assert!(matches!(r, Err(WindError::InvalidGradient(_))));
    }

    #[test]
    fn wind_gradient_passes_its_own_validation() {
        let g = ColorGradient::new(WIND_STOPS.to_vec()).unwrap();
        assert_eq!(g, ColorGradient::wind());
    }

    #[test]
    fn deserialize_validates_stops() {
        let ok: ColorGradient = serde_json::from_str(
            r##"[{"speed":0,"color":"#000000"},{"speed":1,"color":"#ffffff"}]"##,
        )
        .unwrap();
        assert_eq!(ok.color_for(1.0), Srgb::WHITE);

        let bad = serde_json::from_str::<ColorGradient>(
            r##"[{"speed":0.5,"color":"#000000"},{"speed":1,"color":"#ffffff"}]"##,
        );
        assert!(bad.is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_real_speed_yields_in_gamut_color(speed in proptest::num::f64::ANY) {
                let c = ColorGradient::wind().color_for(speed);
                prop_assert!(c.is_in_gamut(), "color_for({speed}) = {c:?}");
            }

            #[test]
            fn channels_are_continuous_across_range(speed in 0.0_f64..1.0) {
                let g = ColorGradient::wind();
                let a = g.color_for(speed);
                let b = g.color_for(speed + 1e-9);
                prop_assert!((a.r - b.r).abs() < 1e-6);
                prop_assert!((a.g - b.g).abs() < 1e-6);
                prop_assert!((a.b - b.b).abs() < 1e-6);
            }
        }
    }
}
