//! Procedural wind field synthesis.
//!
//! [`FieldGenerator::generate`] lays a fixed set of spiral vortices over a
//! constant background flow, rasterizes the sum at every grid cell, and adds
//! a small uniform jitter drawn from the caller's PRNG. The "waves" kind is a
//! simpler separable sin/cos field with no jitter.

use crate::field::VectorField;
use crate::field_source::{
    CompositeField, FieldSource, PerlinField, SpiralVortex, UniformFlow, WaveField,
};
use crate::params::{
    bool_schema, choice_schema, number_schema, param_bool, param_f64, param_f64_clamped,
    param_string,
};
use crate::prng::Xorshift64;
use glam::DVec2;
use serde_json::{json, Value};
use std::f64::consts::FRAC_PI_6;

/// Normalization magnitude used when the measured maximum is not requested.
pub const DEFAULT_MAX_MAGNITUDE: f64 = 28.7;
/// Normalization magnitude of the waves field (amplitude 10 on each axis).
pub const WAVES_MAX_MAGNITUDE: f64 = 20.0;
/// Per-axis jitter half-width.
const DEFAULT_JITTER: f64 = 0.25;
const DEFAULT_BACKGROUND_ANGLE: f64 = FRAC_PI_6;
const DEFAULT_BACKGROUND_STRENGTH: f64 = 2.0;
const DEFAULT_TURBULENCE_STRENGTH: f64 = 0.0;
const DEFAULT_TURBULENCE_SCALE: f64 = 0.05;
const WAVES_AMPLITUDE: f64 = 10.0;

/// Which analytic field to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Three spiral vortices over a diagonal background breeze.
    Vortices,
    /// Separable `sin`/`cos` bands.
    Waves,
}

impl FieldKind {
    pub const NAMES: &'static [&'static str] = &["vortices", "waves"];

    /// Parses a kind name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vortices" => Some(FieldKind::Vortices),
            "waves" => Some(FieldKind::Waves),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Vortices => "vortices",
            FieldKind::Waves => "waves",
        }
    }
}

/// Tunables for field synthesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorParams {
    pub kind: FieldKind,
    /// Half-width of the uniform per-axis jitter. `0` disables it.
    pub jitter: f64,
    pub background_angle: f64,
    pub background_strength: f64,
    /// Strength of optional Perlin turbulence. `0` leaves it out.
    pub turbulence_strength: f64,
    pub turbulence_scale: f64,
    /// Record the measured maximum magnitude instead of the fixed constant.
    pub normalize_to_measured: bool,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            kind: FieldKind::Vortices,
            jitter: DEFAULT_JITTER,
            background_angle: DEFAULT_BACKGROUND_ANGLE,
            background_strength: DEFAULT_BACKGROUND_STRENGTH,
            turbulence_strength: DEFAULT_TURBULENCE_STRENGTH,
            turbulence_scale: DEFAULT_TURBULENCE_SCALE,
            normalize_to_measured: false,
        }
    }
}

impl GeneratorParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    ///
    /// An unknown `field` name falls back to the vortex field.
    pub fn from_json(params: &Value) -> Self {
        let kind_name = param_string(params, "field", FieldKind::Vortices.name());
        Self {
            kind: FieldKind::from_name(&kind_name).unwrap_or(FieldKind::Vortices),
            jitter: param_f64_clamped(params, "jitter", DEFAULT_JITTER, 0.0, 10.0),
            background_angle: param_f64(params, "background_angle", DEFAULT_BACKGROUND_ANGLE),
            background_strength: param_f64(
                params,
                "background_strength",
                DEFAULT_BACKGROUND_STRENGTH,
            ),
            turbulence_strength: param_f64_clamped(
                params,
                "turbulence_strength",
                DEFAULT_TURBULENCE_STRENGTH,
                0.0,
                100.0,
            ),
            turbulence_scale: param_f64(params, "turbulence_scale", DEFAULT_TURBULENCE_SCALE),
            normalize_to_measured: param_bool(params, "normalize_to_measured", false),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "field": self.kind.name(),
            "jitter": self.jitter,
            "background_angle": self.background_angle,
            "background_strength": self.background_strength,
            "turbulence_strength": self.turbulence_strength,
            "turbulence_scale": self.turbulence_scale,
            "normalize_to_measured": self.normalize_to_measured,
        })
    }

    pub fn schema() -> Value {
        json!({
            "field": choice_schema(FieldKind::Vortices.name(), FieldKind::NAMES, "Analytic field to synthesize"),
            "jitter": number_schema(DEFAULT_JITTER, 0.0, 10.0, "Half-width of uniform per-axis noise added to every cell"),
            "background_angle": number_schema(DEFAULT_BACKGROUND_ANGLE, -std::f64::consts::PI, std::f64::consts::PI, "Direction of the background breeze in radians"),
            "background_strength": number_schema(DEFAULT_BACKGROUND_STRENGTH, 0.0, 20.0, "Speed of the background breeze"),
            "turbulence_strength": number_schema(DEFAULT_TURBULENCE_STRENGTH, 0.0, 100.0, "Strength of Perlin turbulence layered on top (0 = off)"),
            "turbulence_scale": number_schema(DEFAULT_TURBULENCE_SCALE, 0.001, 1.0, "Spatial frequency of the turbulence in 1/cells"),
            "normalize_to_measured": bool_schema(false, "Normalize by the measured maximum instead of the fixed constant"),
        })
    }
}

/// Synthesizes vector fields from [`GeneratorParams`].
#[derive(Debug, Clone, Default)]
pub struct FieldGenerator {
    params: GeneratorParams,
}

impl FieldGenerator {
    pub fn new(params: GeneratorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// The three vortex patterns, positioned relative to the grid size.
    pub fn vortex_patterns(nx: usize, ny: usize) -> [SpiralVortex; 3] {
        let (w, h) = (nx as f64, ny as f64);
        [
            SpiralVortex {
                center: DVec2::new(w / 2.0, h / 2.0),
                strength: 12.0,
                radius: w / 4.0,
                rotation_factor: 25.0,
                weight: 1.0,
            },
            SpiralVortex {
                center: DVec2::new(w / 2.0 - w / 5.0, h / 2.0 + h / 6.0),
                strength: 6.0,
                radius: w / 8.0,
                rotation_factor: 15.0,
                weight: 0.7,
            },
            SpiralVortex {
                center: DVec2::new(w / 2.0 + w / 4.0, h / 2.0 - h / 5.0),
                strength: 5.0,
                radius: w / 10.0,
                rotation_factor: 20.0,
                weight: 0.6,
            },
        ]
    }

    /// The deterministic part of the field as a composite source.
    ///
    /// `turbulence_seed` only matters when turbulence is enabled.
    pub fn sources(&self, nx: usize, ny: usize, turbulence_seed: u32) -> CompositeField {
        let p = &self.params;
        let mut composite = match p.kind {
            FieldKind::Vortices => {
                let mut c = CompositeField::new().with(UniformFlow {
                    angle: p.background_angle,
                    strength: p.background_strength,
                });
                for pattern in Self::vortex_patterns(nx, ny) {
                    c.push(Box::new(pattern));
                }
                c
            }
            FieldKind::Waves => CompositeField::new().with(WaveField {
                nx: nx as f64,
                ny: ny as f64,
                amplitude: WAVES_AMPLITUDE,
            }),
        };
        if p.turbulence_strength > 0.0 {
            composite.push(Box::new(PerlinField::new(
                p.turbulence_scale,
                p.turbulence_strength,
                turbulence_seed,
            )));
        }
        composite
    }

    /// Builds an `nx` x `ny` field, drawing jitter and the turbulence seed from `rng`.
    ///
    /// Total over all sizes: a zero dimension produces an empty field.
    pub fn generate(&self, nx: usize, ny: usize, rng: &mut Xorshift64) -> VectorField {
        let turbulence_seed = (rng.next_u64() >> 32) as u32;
        let sources = self.sources(nx, ny, turbulence_seed);
        let jitter = match self.params.kind {
            FieldKind::Vortices => self.params.jitter,
            FieldKind::Waves => 0.0,
        };

        let mut data = Vec::with_capacity(nx.saturating_mul(ny));
        for y in 0..ny {
            for x in 0..nx {
                let mut v = sources.sample(x as f64, y as f64);
                if jitter > 0.0 {
                    v += DVec2::new(
                        rng.next_range(-jitter, jitter),
                        rng.next_range(-jitter, jitter),
                    );
                }
                data.push(v);
            }
        }

        let fixed = match self.params.kind {
            FieldKind::Vortices => DEFAULT_MAX_MAGNITUDE,
            FieldKind::Waves => WAVES_MAX_MAGNITUDE,
        };
        let measured = data.iter().map(|v| v.length()).fold(0.0, f64::max);
        let max_magnitude = if self.params.normalize_to_measured && measured > 0.0 {
            measured
        } else {
            fixed
        };

        log::info!(
            "generated {} field {nx}x{ny}: measured max {measured:.3}, normalizing by {max_magnitude:.3}",
            self.params.kind.name()
        );

        build_field(nx, ny, data, max_magnitude, fixed)
    }
}

/// Wraps generated data in a `VectorField`.
///
/// Sources are finite for finite parameters; a non-finite parameter (e.g. a
/// NaN strength injected through JSON) zeroes the offending cells instead of
/// failing, keeping generation total.
fn build_field(
    nx: usize,
    ny: usize,
    mut data: Vec<DVec2>,
    max_magnitude: f64,
    fallback_magnitude: f64,
) -> VectorField {
    let bad = data.iter().filter(|v| !v.is_finite()).count();
    if bad > 0 {
        log::warn!("{bad} non-finite field cells replaced with calm air");
        data.iter_mut()
            .filter(|v| !v.is_finite())
            .for_each(|v| *v = DVec2::ZERO);
    }
    let usable = max_magnitude > 0.0 && max_magnitude.recip().is_finite();
    let magnitude = if max_magnitude.is_finite() && usable {
        max_magnitude
    } else {
        fallback_magnitude
    };
    VectorField::from_generated(nx, ny, data, magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> FieldGenerator {
        FieldGenerator::new(GeneratorParams {
            jitter: 0.0,
            ..GeneratorParams::default()
        })
    }

    #[test]
    fn generate_produces_dense_grid() {
        let field = FieldGenerator::default().generate(36, 18, &mut Xorshift64::new(1));
        assert_eq!(field.nx(), 36);
        assert_eq!(field.ny(), 18);
        assert_eq!(field.data().len(), 36 * 18);
        assert!(field.data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn generate_is_total_over_zero_dimensions() {
        let gen = FieldGenerator::default();
        let mut rng = Xorshift64::new(1);
        assert!(gen.generate(0, 10, &mut rng).data().is_empty());
        assert!(gen.generate(10, 0, &mut rng).data().is_empty());
        assert!(gen.generate(0, 0, &mut rng).data().is_empty());
    }

    #[test]
    fn same_seed_reproduces_field_exactly() {
        let gen = FieldGenerator::default();
        let a = gen.generate(72, 36, &mut Xorshift64::new(99));
        let b = gen.generate(72, 36, &mut Xorshift64::new(99));
        assert_eq!(a, b);
    }

    #[test]
    fn without_jitter_different_seeds_agree() {
        let gen = no_jitter();
        let a = gen.generate(72, 36, &mut Xorshift64::new(1));
        let b = gen.generate(72, 36, &mut Xorshift64::new(2));
        assert_eq!(a, b);
    }

    #[test]
    fn jitter_stays_within_quarter_per_axis() {
        let noisy = FieldGenerator::default().generate(90, 45, &mut Xorshift64::new(7));
        let clean = no_jitter().generate(90, 45, &mut Xorshift64::new(7));
        let mut any_difference = false;
        for (n, c) in noisy.data().iter().zip(clean.data()) {
            let d = *n - *c;
            assert!(d.x.abs() <= 0.25 + 1e-12, "x jitter {} too large", d.x);
            assert!(d.y.abs() <= 0.25 + 1e-12, "y jitter {} too large", d.y);
            any_difference |= d != DVec2::ZERO;
        }
        assert!(any_difference, "jitter should perturb the field");
    }

    #[test]
    fn cells_outside_all_patterns_get_only_background() {
        let field = no_jitter().generate(360, 181, &mut Xorshift64::new(3));
        let corner = field.get(0, 0).unwrap();
        let expected = DVec2::from_angle(FRAC_PI_6) * 2.0;
        assert!((corner - expected).length() < 1e-12, "corner = {corner:?}");
    }

    #[test]
    fn main_vortex_centre_is_background_plus_full_strength() {
        // 360 x 181: centre cell (180, 90.5) is not on the grid, so check a
        // neighbour and only assert the vortex dominates there.
        let field = no_jitter().generate(360, 181, &mut Xorshift64::new(3));
        let near_centre = field.get(180, 90).unwrap();
        assert!(
            near_centre.length() > 9.0,
            "vortex core should be strong, got {}",
            near_centre.length()
        );
    }

    #[test]
    fn default_normalization_is_fixed_constant() {
        let field = FieldGenerator::default().generate(36, 18, &mut Xorshift64::new(1));
        assert_eq!(field.max_magnitude(), DEFAULT_MAX_MAGNITUDE);
    }

    #[test]
    fn measured_normalization_matches_longest_vector() {
        let gen = FieldGenerator::new(GeneratorParams {
            normalize_to_measured: true,
            ..GeneratorParams::default()
        });
        let field = gen.generate(60, 30, &mut Xorshift64::new(4));
        assert!((field.max_magnitude() - field.measured_max_magnitude()).abs() < 1e-12);
    }

    #[test]
    fn waves_field_has_no_jitter_and_fixed_normalization() {
        let gen = FieldGenerator::new(GeneratorParams {
            kind: FieldKind::Waves,
            ..GeneratorParams::default()
        });
        let a = gen.generate(64, 32, &mut Xorshift64::new(1));
        let b = gen.generate(64, 32, &mut Xorshift64::new(2));
        assert_eq!(a, b);
        assert_eq!(a.max_magnitude(), WAVES_MAX_MAGNITUDE);
        let v = a.get(16, 0).unwrap();
        assert!((v.x - 10.0).abs() < 1e-9 && (v.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn turbulence_perturbs_field_when_enabled() {
        let calm = no_jitter().generate(40, 20, &mut Xorshift64::new(5));
        let turbulent = FieldGenerator::new(GeneratorParams {
            jitter: 0.0,
            turbulence_strength: 3.0,
            turbulence_scale: 0.17,
            ..GeneratorParams::default()
        })
        .generate(40, 20, &mut Xorshift64::new(5));
        assert_ne!(calm, turbulent);
    }

    #[test]
    fn nan_strength_is_replaced_with_calm_cells() {
        let gen = FieldGenerator::new(GeneratorParams {
            background_strength: f64::NAN,
            jitter: 0.0,
            ..GeneratorParams::default()
        });
        let field = gen.generate(10, 5, &mut Xorshift64::new(1));
        assert!(field.data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn params_from_json_uses_defaults_and_overrides() {
        let p = GeneratorParams::from_json(&json!({}));
        assert_eq!(p, GeneratorParams::default());

        let p = GeneratorParams::from_json(&json!({
            "field": "waves",
            "jitter": 0.1,
            "normalize_to_measured": true,
        }));
        assert_eq!(p.kind, FieldKind::Waves);
        assert_eq!(p.jitter, 0.1);
        assert!(p.normalize_to_measured);
    }

    #[test]
    fn unusable_measured_magnitude_falls_back_to_fixed() {
        let field = build_field(2, 1, vec![DVec2::ZERO; 2], 5e-324, DEFAULT_MAX_MAGNITUDE);
        assert_eq!(field.max_magnitude(), DEFAULT_MAX_MAGNITUDE);
    }

    #[test]
    fn params_from_json_falls_back_on_unknown_kind() {
        let p = GeneratorParams::from_json(&json!({"field": "hurricane"}));
        assert_eq!(p.kind, FieldKind::Vortices);
    }

    #[test]
    fn params_json_round_trip() {
        let p = GeneratorParams {
            kind: FieldKind::Waves,
            jitter: 0.5,
            ..GeneratorParams::default()
        };
        assert_eq!(GeneratorParams::from_json(&p.to_json()), p);
    }

    #[test]
    fn schema_lists_every_parameter() {
        let schema = GeneratorParams::schema();
        for key in [
            "field",
            "jitter",
            "background_angle",
            "background_strength",
            "turbulence_strength",
            "turbulence_scale",
            "normalize_to_measured",
        ] {
            assert!(schema.get(key).is_some(), "schema missing {key}");
        }
    }
}
