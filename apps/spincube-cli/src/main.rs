use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use spincube_render::{RecordingContext, RenderConfig};
use spincube_scene::CubeMesh;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spincube-cli", about = "CLI tool for the spinning cube")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info, the mesh summary and the fixed camera
    Info,
    /// Run setup and a few frames against a recording context
    Trace {
        /// Number of frame callbacks after the direct first frame
        #[arg(short, long, default_value = "3")]
        frames: u32,
        /// Milliseconds between synthetic scheduler timestamps
        #[arg(short, long, default_value = "16.0")]
        interval_ms: f64,
        /// Drawing surface width
        #[arg(long, default_value = "800")]
        width: u32,
        /// Drawing surface height
        #[arg(long, default_value = "600")]
        height: u32,
        /// Report this attribute as missing from the program
        #[arg(long)]
        missing_attribute: Option<String>,
        /// Emit one JSON object per line instead of a text transcript
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => info()?,
        Commands::Trace {
            frames,
            interval_ms,
            width,
            height,
            missing_attribute,
            json,
        } => {
            let mut ctx = RecordingContext::new(width, height);
            if let Some(name) = missing_attribute {
                ctx = ctx.without_attribute(name);
            }
            trace(&mut ctx, frames, interval_ms, json)?;
        }
    }

    Ok(())
}

fn info() -> anyhow::Result<()> {
    let mesh = CubeMesh::new();
    let config = RenderConfig::default();
    tracing::debug!("printing crate info");

    println!("spincube-cli v{}", env!("CARGO_PKG_VERSION"));
    println!("scene: {}", spincube_scene::crate_info());
    println!("render: {}", spincube_render::crate_info());
    println!(
        "mesh: vertices={}, indices={}, triangles={}",
        mesh.vertex_count(),
        mesh.index_count(),
        mesh.triangle_count()
    );
    println!(
        "config: {}",
        serde_json::to_string_pretty(&config).context("serializing render config")?
    );
    println!("view: {:?}", config.camera.view_matrix().to_cols_array());
    Ok(())
}

type FrameAngle = (Option<f64>, f64);

/// Set up the cube, draw the direct first frame, then `frames` scheduled
/// callbacks spaced `interval_ms` apart.
fn run_frames(
    ctx: &mut RecordingContext,
    frames: u32,
    interval_ms: f64,
) -> anyhow::Result<Vec<FrameAngle>> {
    let mut renderer = match spincube_render::setup(ctx, &RenderConfig::default()) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "cube setup halted");
            return Err(e).context("cube setup halted");
        }
    };

    let mut angles = Vec::with_capacity(frames as usize + 1);
    angles.push((None, renderer.frame(ctx, None)?));
    for i in 1..=frames {
        let now = f64::from(i) * interval_ms;
        angles.push((Some(now), renderer.frame(ctx, Some(now))?));
    }
    tracing::info!(
        frames = renderer.frames(),
        commands = ctx.commands().len(),
        "trace finished"
    );
    Ok(angles)
}

fn trace(
    ctx: &mut RecordingContext,
    frames: u32,
    interval_ms: f64,
    json: bool,
) -> anyhow::Result<()> {
    tracing::info!(frames, interval_ms, "tracing cube frames");
    let angles = match run_frames(ctx, frames, interval_ms) {
        Ok(angles) => angles,
        Err(e) => {
            print_commands(ctx, json)?;
            return Err(e);
        }
    };

    if json {
        for (frame, (now, angle)) in angles.iter().enumerate() {
            println!(
                "{}",
                json!({ "frame": frame, "timestamp_ms": now, "angle": angle })
            );
        }
    } else {
        for (frame, (now, angle)) in angles.iter().enumerate() {
            let at = now.map_or_else(|| "direct".to_string(), |t| format!("{t:.1} ms"));
            println!("frame {frame:>3}  {at:>10}  angle={angle:.6}");
        }
    }
    print_commands(ctx, json)
}

fn print_commands(ctx: &RecordingContext, json: bool) -> anyhow::Result<()> {
    if json {
        for cmd in ctx.commands() {
            println!("{}", serde_json::to_string(cmd)?);
        }
    } else {
        print!("{}", ctx.transcript());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spincube_render::Command;

    #[test]
    fn run_frames_draws_direct_frame_then_callbacks() {
        let mut ctx = RecordingContext::new(800, 600);
        let angles = run_frames(&mut ctx, 3, 16.0).unwrap();

        assert_eq!(angles.len(), 4);
        assert_eq!(angles[0], (None, 0.0));
        // The first scheduled callback has no previous timestamp yet.
        assert_eq!(angles[1], (Some(16.0), 0.0));
        let step = std::f64::consts::FRAC_PI_2 * 0.016;
        assert!((angles[3].1 - 2.0 * step).abs() < 1e-12);

        let presents = ctx
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::Present))
            .count();
        assert_eq!(presents, 4);
    }

    #[test]
    fn run_frames_reports_a_missing_attribute() {
        let ctx = RecordingContext::new(800, 600);
        let mut ctx = ctx.without_attribute("a_position");
        let err = run_frames(&mut ctx, 2, 16.0).unwrap_err();

        assert_eq!(err.to_string(), "cube setup halted");
        assert!(!ctx.commands().contains(&Command::Present));
    }
}
