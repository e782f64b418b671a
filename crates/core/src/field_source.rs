//! Composable analytic wind sources, evaluated in grid-cell coordinates.
//!
//! A [`FieldSource`] returns the wind vector at any point of the grid. The
//! generator rasterizes a [`CompositeField`] of sources onto a
//! [`VectorField`](crate::field::VectorField). All sources are deterministic;
//! randomness (cell jitter) is added by the generator afterwards.

use glam::DVec2;
use noise::{NoiseFn, Perlin};
use std::f64::consts::TAU;

/// A 2D wind source sampled in grid-cell coordinates.
pub trait FieldSource: Send + Sync {
    /// Wind vector at grid position `(x, y)`.
    fn sample(&self, x: f64, y: f64) -> DVec2;
}

// ---------------------------------------------------------------------------
// Spiral vortex
// ---------------------------------------------------------------------------

/// Spiralling vortex with a quadratic falloff that vanishes at `radius`.
///
/// The flow direction is the polar angle around the centre advanced by
/// `distance / rotation_factor`, so streamlines curl tighter towards the
/// edge of the pattern's influence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralVortex {
    pub center: DVec2,
    pub strength: f64,
    pub radius: f64,
    pub rotation_factor: f64,
    pub weight: f64,
}

impl SpiralVortex {
    /// Linear falloff `max(0, 1 - d / radius)`. Zero for a non-positive radius.
    pub fn falloff(&self, distance: f64) -> f64 {
        if self.radius <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / self.radius).max(0.0)
    }
}

impl FieldSource for SpiralVortex {
    fn sample(&self, x: f64, y: f64) -> DVec2 {
        let offset = DVec2::new(x, y) - self.center;
        let distance = offset.length();
        let falloff = self.falloff(distance);
        if falloff <= 0.0 {
            return DVec2::ZERO;
        }
        let angle = offset.y.atan2(offset.x) + distance / self.rotation_factor;
        let magnitude = self.strength * falloff * falloff * self.weight;
        DVec2::from_angle(angle) * magnitude
    }
}

// ---------------------------------------------------------------------------
// Uniform flow
// ---------------------------------------------------------------------------

/// Constant background wind blowing at `angle` radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformFlow {
    pub angle: f64,
    pub strength: f64,
}

impl FieldSource for UniformFlow {
    fn sample(&self, _x: f64, _y: f64) -> DVec2 {
        DVec2::from_angle(self.angle) * self.strength
    }
}

// ---------------------------------------------------------------------------
// Waves
// ---------------------------------------------------------------------------

/// Separable sinusoidal flow: `u = A sin(2 pi x / nx)`, `v = A cos(2 pi y / ny)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveField {
    pub nx: f64,
    pub ny: f64,
    pub amplitude: f64,
}

impl FieldSource for WaveField {
    fn sample(&self, x: f64, y: f64) -> DVec2 {
        if self.nx <= 0.0 || self.ny <= 0.0 {
            return DVec2::ZERO;
        }
        DVec2::new(
            (x / self.nx * TAU).sin() * self.amplitude,
            (y / self.ny * TAU).cos() * self.amplitude,
        )
    }
}

// ---------------------------------------------------------------------------
// Perlin turbulence
// ---------------------------------------------------------------------------

/// Smooth Perlin turbulence, two decorrelated noise lookups per sample.
pub struct PerlinField {
    noise: Perlin,
    scale: f64,
    strength: f64,
}

impl PerlinField {
    pub fn new(scale: f64, strength: f64, seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
            strength,
        }
    }
}

impl FieldSource for PerlinField {
    fn sample(&self, x: f64, y: f64) -> DVec2 {
        let sx = x * self.scale;
        let sy = y * self.scale;
        DVec2::new(
            self.noise.get([sx, sy]),
            self.noise.get([sx + 100.0, sy + 100.0]),
        ) * self.strength
    }
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

/// Sum of any number of sources.
#[derive(Default)]
pub struct CompositeField {
    sources: Vec<Box<dyn FieldSource>>,
}

impl CompositeField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source and returns `self` for chaining.
    pub fn with(mut self, source: impl FieldSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: Box<dyn FieldSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl FieldSource for CompositeField {
    fn sample(&self, x: f64, y: f64) -> DVec2 {
        self.sources
            .iter()
            .fold(DVec2::ZERO, |acc, source| acc + source.sample(x, y))
    }
}
