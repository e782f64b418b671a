#![deny(unsafe_code)]
//! Wind-field particle visualization with persistent trails.
//!
//! A [`VectorField`] of wind vectors advects a [`ParticleSystem`]; each
//! particle is colored from a [`ColorGradient`] by its normalized speed and
//! drawn into a double-buffered [`TrailCompositor`] whose fade pass leaves
//! decaying streaks behind it. [`WindScene`] wires everything together from
//! a [`SceneConfig`]. The optional `render` feature adds the same trail
//! technique on the GPU via `glow`.

pub mod color;
pub mod config;
pub mod error;
pub mod field;
pub mod field_source;
pub mod generator;
pub mod gradient;
pub mod params;
pub mod particles;
pub mod ping_pong;
pub mod pixel;
pub mod prng;
pub mod scene;
pub mod trail;
pub mod viewport;

#[cfg(feature = "render")]
pub mod render;

pub use color::Srgb;
pub use config::SceneConfig;
pub use error::WindError;
pub use field::VectorField;
pub use field_source::{CompositeField, FieldSource};
pub use generator::{FieldGenerator, FieldKind, GeneratorParams};
pub use gradient::{ColorGradient, GradientStop};
pub use particles::{AdvectStats, Particle, ParticleParams, ParticleSystem};
pub use ping_pong::{BufferSlot, PingPong};
pub use prng::Xorshift64;
pub use scene::WindScene;
pub use trail::{ColorBuffer, TrailCompositor, TrailParams};
pub use viewport::Viewport;
