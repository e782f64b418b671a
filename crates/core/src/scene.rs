//! The composed wind visualization.
//!
//! [`WindScene`] owns one instance of every component: viewport, field,
//! gradient, particle system and trail compositor. Each [`tick`](WindScene::tick)
//! advects the particles once and composites one frame. Nothing is shared
//! between scenes, so several can run side by side.

use crate::config::SceneConfig;
use crate::error::WindError;
use crate::field::VectorField;
use crate::generator::{FieldGenerator, GeneratorParams};
use crate::gradient::ColorGradient;
use crate::particles::{AdvectStats, ParticleParams, ParticleSystem};
use crate::prng::Xorshift64;
use crate::trail::{TrailCompositor, TrailParams};
use crate::viewport::Viewport;
use serde_json::{json, Value};

const FIELD_STREAM: u64 = 1;
const PARTICLE_STREAM: u64 = 2;

/// Shallow-merges the keys of several JSON objects.
fn merge_objects(parts: impl IntoIterator<Item = Value>) -> Value {
    let mut out = serde_json::Map::new();
    for part in parts {
        if let Value::Object(map) = part {
            out.extend(map);
        }
    }
    Value::Object(out)
}

/// Reads an optional `gradient` stop list from params, defaulting to
/// [`ColorGradient::wind`].
pub fn gradient_from_params(params: &Value) -> Result<ColorGradient, WindError> {
    match params.get("gradient") {
        None | Some(Value::Null) => Ok(ColorGradient::wind()),
        Some(stops) => serde_json::from_value(stops.clone())
            .map_err(|e| WindError::InvalidGradient(e.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct WindScene {
    config: SceneConfig,
    viewport: Viewport,
    generator: GeneratorParams,
    field: VectorField,
    gradient: ColorGradient,
    particles: ParticleSystem,
    trail: TrailCompositor,
    frame: u64,
}

impl WindScene {
    /// Builds a scene, synthesizing its field from `config.params`.
    pub fn new(config: &SceneConfig) -> Result<Self, WindError> {
        config.validate()?;
        Self::with_field(config, Self::generate_field(config))
    }

    /// The field [`WindScene::new`] would synthesize for `config`.
    pub fn generate_field(config: &SceneConfig) -> VectorField {
        let generator = FieldGenerator::new(GeneratorParams::from_json(&config.params));
        let mut field_rng = Xorshift64::new(config.seed).fork(FIELD_STREAM);
        generator.generate(config.grid_nx, config.grid_ny, &mut field_rng)
    }

    /// Builds a scene around an externally supplied field.
    ///
    /// Particle placement uses the same PRNG stream as [`WindScene::new`],
    /// so swapping the field does not perturb the particles.
    pub fn with_field(config: &SceneConfig, field: VectorField) -> Result<Self, WindError> {
        config.validate()?;
        let mut root = Xorshift64::new(config.seed);
        // Skip the draw that seeds the field stream.
        let _ = root.fork(FIELD_STREAM);
        Self::assemble(config, GeneratorParams::from_json(&config.params), field, root)
    }

    fn assemble(
        config: &SceneConfig,
        generator: GeneratorParams,
        field: VectorField,
        mut root: Xorshift64,
    ) -> Result<Self, WindError> {
        let viewport = config.viewport()?;
        let gradient = gradient_from_params(&config.params)?;
        let particles = ParticleSystem::new(
            ParticleParams::from_json(&config.params),
            &viewport,
            root.fork(PARTICLE_STREAM),
        );
        let trail = TrailCompositor::new(&viewport, TrailParams::from_json(&config.params));

        log::info!(
            "scene {}x{} seed {}: {} particles over a {}x{} field",
            config.width,
            config.height,
            config.seed,
            particles.len(),
            field.nx(),
            field.ny()
        );

        Ok(Self {
            config: config.clone(),
            viewport,
            generator,
            field,
            gradient,
            particles,
            trail,
            frame: 0,
        })
    }

    /// Advances particles one step and composites one frame.
    pub fn tick(&mut self) -> AdvectStats {
        let stats = self
            .particles
            .advect(&self.field, &self.viewport, &self.gradient);
        self.trail
            .render_frame(self.particles.particles(), &self.viewport);
        self.frame += 1;
        log::trace!(
            "frame {}: {} moved, {} reset, {} without data",
            self.frame,
            stats.moved,
            stats.reset,
            stats.no_data
        );
        stats
    }

    /// Runs `frames` ticks back to back.
    pub fn run(&mut self, frames: usize) {
        for _ in 0..frames {
            self.tick();
        }
    }

    /// Adopts a new viewport size between frames.
    ///
    /// Both trail buffers are reallocated and cleared, and particles left
    /// outside the new rectangle are respawned inside it.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), WindError> {
        let mut next = self.config.clone();
        next.width = width;
        next.height = height;
        let viewport = next.viewport()?;

        self.trail.resize(&viewport);
        let respawned = self.particles.fit_to(&viewport);
        log::debug!("resized to {width}x{height}, respawned {respawned} particles");

        self.viewport = viewport;
        self.config = next;
        Ok(())
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn field(&self) -> &VectorField {
        &self.field
    }

    pub fn gradient(&self) -> &ColorGradient {
        &self.gradient
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn trail(&self) -> &TrailCompositor {
        &self.trail
    }

    /// Frames composited so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Effective parameter values, in the same shape `config.params` accepts.
    pub fn params(&self) -> Value {
        merge_objects([
            self.generator.to_json(),
            self.particles.params().to_json(),
            self.trail.params().to_json(),
            json!({ "gradient": self.gradient }),
        ])
    }

    /// Every accepted parameter with its type, range, default and description.
    pub fn param_schema(&self) -> Value {
        Self::schema()
    }

    /// Same as [`param_schema`](Self::param_schema) without building a scene.
    pub fn schema() -> Value {
        merge_objects([
            GeneratorParams::schema(),
            ParticleParams::schema(),
            TrailParams::schema(),
            json!({
                "gradient": {
                    "type": "gradient",
                    "default": ColorGradient::wind(),
                    "description": "Speed-to-color stops: speeds 0..=1 strictly increasing, colors as #rrggbb",
                }
            }),
        ])
    }
}
