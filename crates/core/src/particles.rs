//! Particle advection through a vector field.
//!
//! Each tick moves every particle by its cell's normalized wind vector times
//! a visual gain, wraps it toroidally at the viewport edges, and recolors it
//! by speed. A small per-tick reset probability scatters particles to new
//! random positions so they never all pile into the same streamlines.

use crate::color::Srgb;
use crate::field::VectorField;
use crate::gradient::ColorGradient;
use crate::params::{integer_schema, number_schema, param_f64_clamped, param_usize};
use crate::prng::Xorshift64;
use crate::viewport::Viewport;
use glam::DVec2;
use serde_json::{json, Value};

const DEFAULT_COUNT: usize = 15_000;
const MAX_COUNT: usize = 2_000_000;
/// Screen pixels moved per tick by a vector of length `max_magnitude`.
const DEFAULT_SPEED_FACTOR: f64 = 2.5;
const DEFAULT_RESET_PROBABILITY: f64 = 0.005;

/// A single tracer: screen-space position and its current color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: DVec2,
    pub color: Srgb,
}

/// Tunables for the particle system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleParams {
    pub count: usize,
    pub speed_factor: f64,
    pub reset_probability: f64,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            speed_factor: DEFAULT_SPEED_FACTOR,
            reset_probability: DEFAULT_RESET_PROBABILITY,
        }
    }
}

impl ParticleParams {
    pub fn from_json(params: &Value) -> Self {
        Self {
            count: param_usize(params, "particle_count", DEFAULT_COUNT).min(MAX_COUNT),
            speed_factor: param_f64_clamped(
                params,
                "speed_factor",
                DEFAULT_SPEED_FACTOR,
                0.0,
                100.0,
            ),
            reset_probability: param_f64_clamped(
                params,
                "reset_probability",
                DEFAULT_RESET_PROBABILITY,
                0.0,
                1.0,
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "particle_count": self.count,
            "speed_factor": self.speed_factor,
            "reset_probability": self.reset_probability,
        })
    }

    pub fn schema() -> Value {
        json!({
            "particle_count": integer_schema(DEFAULT_COUNT, 0, MAX_COUNT, "Number of tracer particles"),
            "speed_factor": number_schema(DEFAULT_SPEED_FACTOR, 0.0, 100.0, "Pixels per tick for a vector at the normalization magnitude"),
            "reset_probability": number_schema(DEFAULT_RESET_PROBABILITY, 0.0, 1.0, "Per-particle chance each tick of respawning at a random position"),
        })
    }
}

/// Outcome counts of one [`ParticleSystem::advect`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvectStats {
    /// Particles teleported to a random position.
    pub reset: usize,
    /// Particles moved by the field.
    pub moved: usize,
    /// Particles left in place because their cell had no data.
    pub no_data: usize,
}

/// Fixed-size set of particles plus the PRNG that drives resets.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    params: ParticleParams,
    rng: Xorshift64,
}

impl ParticleSystem {
    /// Scatters `params.count` white particles uniformly over `viewport`.
    pub fn new(params: ParticleParams, viewport: &Viewport, mut rng: Xorshift64) -> Self {
        let particles = (0..params.count)
            .map(|_| Particle {
                position: viewport.random_point(&mut rng),
                color: Srgb::WHITE,
            })
            .collect();
        Self {
            particles,
            params,
            rng,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn params(&self) -> &ParticleParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Advances every particle by one tick.
    ///
    /// Order per particle: reset lottery, field sample, displacement by
    /// `sample / max_magnitude * speed_factor`, toroidal wrap, recolor by
    /// `min(1, |sample / max_magnitude| * speed_factor)`. A particle whose
    /// cell has no data, or whose displacement is not finite, keeps both its
    /// position and its color.
    pub fn advect(
        &mut self,
        field: &VectorField,
        viewport: &Viewport,
        gradient: &ColorGradient,
    ) -> AdvectStats {
        let mut stats = AdvectStats::default();
        let speed_factor = self.params.speed_factor;
        let inv_max = 1.0 / field.max_magnitude();

        for p in &mut self.particles {
            if self.rng.chance(self.params.reset_probability) {
                p.position = viewport.random_point(&mut self.rng);
                stats.reset += 1;
                continue;
            }

            let Some(delta) = field
                .sample(p.position, viewport)
                .map(|wind| wind * inv_max)
                .filter(|d| d.is_finite())
            else {
                stats.no_data += 1;
                continue;
            };

            p.position = viewport.wrap(p.position + delta * speed_factor);

            let speed = (delta.length() * speed_factor).min(1.0);
            p.color = gradient.color_for(speed);
            stats.moved += 1;
        }

        stats
    }

    /// Respawns particles left outside a resized viewport.
    ///
    /// Returns how many were moved.
    pub fn fit_to(&mut self, viewport: &Viewport) -> usize {
        let mut respawned = 0;
        for p in &mut self.particles {
            if !viewport.contains(p.position) {
                p.position = viewport.random_point(&mut self.rng);
                respawned += 1;
            }
        }
        respawned
    }
}
