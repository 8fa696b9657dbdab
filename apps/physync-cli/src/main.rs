use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use physync_render::{Camera, DebugTextRenderer, Renderer, Scene};
use physync_scene::SceneConfig;
use physync_sync::{FrameDriver, SceneContext};
use physync_tools::FrameInspector;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "physync-cli", about = "Headless runner for physync scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and a summary of the default scene
    Info,
    /// Run a scene for a fixed number of frames
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// Scene file (.yaml, .yml, or .json); the demo scene if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the text rendering every K frames (0 prints only the last)
        #[arg(short, long, default_value = "0")]
        print_every: u64,
    },
    /// Drop the demo sphere and report how it bounces and settles
    Drop {
        /// Give up after this many frames
        #[arg(short, long, default_value = "1800")]
        max_frames: u64,
    },
    /// Print the tilt angle for a pointer position
    Tilt {
        #[arg(short, long, allow_hyphen_values = true)]
        x: f32,
        #[arg(short, long, allow_hyphen_values = true)]
        y: f32,
        /// Treat x and y as pixels in a viewport of this size, e.g. 1280x720
        #[arg(long, value_parser = parse_viewport)]
        viewport: Option<Vec2>,
    },
    /// Print the default scene as YAML
    DumpConfig,
}

/// Discards frames; the headless drop test only needs the step.
struct NullRenderer;

impl Renderer for NullRenderer {
    type Output = ();

    fn render(&self, _scene: &Scene, _camera: &Camera) {}
}

fn parse_viewport(s: &str) -> Result<Vec2, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: f32 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h: f32 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    Ok(Vec2::new(w, h))
}

fn load_context(config: Option<&PathBuf>) -> anyhow::Result<SceneContext> {
    let config = match config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene {}", path.display()))?,
        None => SceneConfig::default(),
    };
    Ok(config.build()?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("physync-cli v{}", env!("CARGO_PKG_VERSION"));
            let ctx = load_context(None)?;
            println!("{}", FrameInspector::summary(&ctx));
            println!("timestep: {:.6}s", ctx.dt());
            for pair in FrameInspector::pairs(&ctx) {
                println!("  {pair}");
            }
        }
        Commands::Run {
            frames,
            config,
            print_every,
        } => {
            let mut ctx = load_context(config.as_ref())?;
            let renderer = DebugTextRenderer::new();
            let stats = FrameDriver::run_until(&mut ctx, &renderer, frames, |ctx, text| {
                if print_every > 0 && ctx.tick() % print_every == 0 {
                    print!("{text}");
                }
                false
            });
            if print_every == 0 {
                print!("{}", ctx.draw(&renderer));
            }
            println!("{}", FrameInspector::summary(&ctx));
            println!("Driver: {stats}");
            if stats.failed > 0 {
                anyhow::bail!("{} of {} frames failed", stats.failed, stats.frames);
            }
        }
        Commands::Drop { max_frames } => {
            let mut ctx = load_context(None)?;
            let visual = ctx
                .scene
                .find("sphere")
                .context("demo scene has no sphere")?;
            let body = ctx
                .pairs()
                .body_for(visual)
                .context("sphere is not paired")?;

            let mut min_height = f32::INFINITY;
            let mut bounces = 0u32;
            let mut falling = false;
            let mut still_frames = 0u32;
            let stats = FrameDriver::run_until(&mut ctx, &NullRenderer, max_frames, |ctx, _| {
                let Some(b) = ctx.world.body(body) else {
                    return true;
                };
                let v = b.linear_velocity();
                min_height = min_height.min(b.position().y);
                if v.y < -0.5 {
                    falling = true;
                } else if falling && v.y > 0.5 {
                    falling = false;
                    bounces += 1;
                    tracing::debug!(tick = ctx.tick(), vy = v.y, "bounce");
                }
                still_frames = if v.length() < 0.05 { still_frames + 1 } else { 0 };
                still_frames >= 30
            });

            println!("Bounces: {bounces}");
            println!("Minimum height: {min_height:.4}");
            if stats.stopped {
                println!("Settled at frame {}", stats.frames);
            } else {
                println!("Not settled after {} frames", stats.frames);
            }
            if let Some(b) = ctx.world.body(body) {
                println!("Rest height: {:.4}", b.position().y);
            }
        }
        Commands::Tilt { x, y, viewport } => {
            let pointer = match viewport {
                Some(size) => physync_input::normalize_pointer(Vec2::new(x, y), size),
                None => Vec2::new(x, y),
            };
            let angle = physync_input::pointer_tilt_angle(pointer);
            println!(
                "pointer=({:.3}, {:.3}) tilt={angle:.6} rad ({:.2} deg)",
                pointer.x,
                pointer.y,
                angle.to_degrees()
            );
            // Preview only: where the demo walls would land if the ground
            // were tilted about the x axis. Nothing is moved.
            for entity in SceneConfig::default().entities {
                if entity.body.is_some() || !entity.name.starts_with("wall") {
                    continue;
                }
                let p = entity.position;
                let (z, y) = physync_input::rotate_2d(p.z, p.y, angle);
                println!("  {} -> y={y:.3} z={z:.3}", entity.name);
            }
        }
        Commands::DumpConfig => {
            print!("{}", SceneConfig::default().to_yaml()?);
        }
    }

    Ok(())
}
