#![deny(unsafe_code)]
//! `windtrail`: headless driver for wind-trail scenes.
//!
//! Subcommands:
//! - `render`: run a scene for N frames and write the presented frame as PNG
//! - `field`: synthesize a wind field and write its speed map as PNG
//! - `schema`: describe every scene parameter

mod error;
mod snapshot;

use clap::{Parser, Subcommand};
use error::CliError;
use std::path::{Path, PathBuf};
use std::process;
use windtrail_core::scene::gradient_from_params;
use windtrail_core::{ParticleParams, SceneConfig, Srgb, WindScene};

#[derive(Parser)]
#[command(name = "windtrail", about = "Wind field particle trails")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Scene description shared by `render` and `field`.
#[derive(clap::Args)]
struct SceneArgs {
    /// Viewport width in pixels.
    #[arg(short = 'W', long, default_value_t = 800)]
    width: usize,

    /// Viewport height in pixels.
    #[arg(short = 'H', long, default_value_t = 600)]
    height: usize,

    /// Field grid columns.
    #[arg(long, default_value_t = windtrail_core::config::DEFAULT_GRID_NX)]
    grid_nx: usize,

    /// Field grid rows.
    #[arg(long, default_value_t = windtrail_core::config::DEFAULT_GRID_NY)]
    grid_ny: usize,

    /// PRNG seed for deterministic output.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Scene parameters as a JSON object (see `windtrail schema`).
    #[arg(long, default_value = "{}")]
    params: String,

    /// Load the whole scene from a JSON config file instead of the flags above.
    #[arg(long, conflicts_with_all = ["width", "height", "grid_nx", "grid_ny", "seed", "params"])]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scene and write the presented frame as PNG.
    Render {
        #[command(flatten)]
        scene: SceneArgs,

        /// Frames to simulate (ignored when --config sets `frames`).
        #[arg(short, long, default_value_t = 300)]
        frames: usize,

        /// Opaque color under the trails, as #rrggbb.
        #[arg(long, default_value = "#000000")]
        background: String,

        /// Output file path.
        #[arg(short, long, default_value = "windtrail.png")]
        output: PathBuf,

        /// Also write the effective scene config as JSON to this path.
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
    /// Synthesize a field and write a speed map (one pixel per cell).
    Field {
        #[command(flatten)]
        scene: SceneArgs,

        /// Output file path.
        #[arg(short, long, default_value = "field.png")]
        output: PathBuf,
    },
    /// Print every scene parameter with type, range and default.
    Schema,
}

fn read_config(path: &Path) -> Result<SceneConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("invalid config {}: {e}", path.display())))
}

impl SceneArgs {
    fn into_config(self, frames: usize) -> Result<SceneConfig, CliError> {
        if let Some(path) = &self.config {
            let mut config = read_config(path)?;
            if config.frames == 0 {
                config.frames = frames;
            }
            return Ok(config);
        }
        let params: serde_json::Value = serde_json::from_str(&self.params)
            .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
        if !params.is_object() {
            return Err(CliError::Input("--params must be a JSON object".into()));
        }
        let mut config = SceneConfig::new(self.width, self.height, self.seed);
        config.grid_nx = self.grid_nx;
        config.grid_ny = self.grid_ny;
        config.frames = frames;
        config.params = params;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Schema => {
            let schema = WindScene::schema();
            if cli.json {
                print_json(&schema)?;
            } else if let Some(entries) = schema.as_object() {
                for (name, entry) in entries {
                    let ty = entry["type"].as_str().unwrap_or("?");
                    let desc = entry["description"].as_str().unwrap_or("");
                    println!("{name:<22} {ty:<8} {desc}");
                }
            }
        }
        Command::Render {
            scene,
            frames,
            background,
            output,
            save_config,
        } => {
            let background = Srgb::from_hex(&background)?;
            let config = scene.into_config(frames)?;
            let mut wind = WindScene::new(&config)?;
            wind.run(config.frames);
            snapshot::write_frame(wind.trail().screen(), background, &output)?;

            if let Some(path) = &save_config {
                let text = serde_json::to_string_pretty(&config)?;
                std::fs::write(path, text)
                    .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
            }

            log::info!("wrote {}", output.display());
            if cli.json {
                print_json(&serde_json::json!({
                    "width": config.width,
                    "height": config.height,
                    "seed": config.seed,
                    "frames": config.frames,
                    "particles": wind.particles().len(),
                    "params": wind.params(),
                    "output": output.display().to_string(),
                }))?;
            } else {
                eprintln!(
                    "rendered {}x{} ({} frames, {} particles, seed {}) -> {}",
                    config.width,
                    config.height,
                    config.frames,
                    wind.particles().len(),
                    config.seed,
                    output.display()
                );
            }
        }
        Command::Field { scene, output } => {
            let config = scene.into_config(0)?;
            config.validate()?;
            let gradient = gradient_from_params(&config.params)?;
            let speed_factor = ParticleParams::from_json(&config.params).speed_factor;
            let field = WindScene::generate_field(&config);
            snapshot::write_speed_map(&field, &gradient, speed_factor, &output)?;

            if cli.json {
                print_json(&serde_json::json!({
                    "nx": field.nx(),
                    "ny": field.ny(),
                    "max_magnitude": field.max_magnitude(),
                    "measured_max_magnitude": field.measured_max_magnitude(),
                    "output": output.display().to_string(),
                }))?;
            } else {
                eprintln!(
                    "field {}x{} (max {:.2}, measured {:.2}) -> {}",
                    field.nx(),
                    field.ny(),
                    field.max_magnitude(),
                    field.measured_max_magnitude(),
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
