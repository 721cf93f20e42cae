//! Lumen Demo: headless live-feed enhancement.
//!
//! Pulls frames from a still image, a directory or a synthetic gradient,
//! runs them through the enhancement pipeline on a render thread and writes
//! the composed original|processed view to disk. Pipeline commands arrive as
//! JSON lines on stdin.

mod config;
mod controller;
mod frame_source;
mod image_loader;
mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use clap::Parser;
use lumen_core::{Pipeline, PipelineConfig};

use crate::config::AppConfig;
use crate::frame_source::{DirectorySource, FrameSource, StillImageSource, SyntheticSource};
use crate::render::RenderLoop;

type DemoError = Box<dyn std::error::Error>;
type DemoResult<T> = Result<T, DemoError>;

/// Size of the synthetic frames when no input is given.
const SYNTHETIC_SIZE: (u32, u32) = (320, 240);

#[derive(Debug, Parser)]
#[command(name = "lumen-demo")]
#[command(about = "Run a live frame feed through the Lumen enhancement pipeline")]
#[command(version)]
struct Cli {
    /// Pipeline configuration (JSON). Uses the built-in catalog if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Still image or directory of frames. Uses a synthetic feed if omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for composed frames.
    #[arg(long, default_value = "lumen-out")]
    output: PathBuf,

    /// Stop after this many displayed frames.
    #[arg(long)]
    frames: Option<u64>,

    /// Save every n-th displayed frame.
    #[arg(long, default_value = "30")]
    save_every: u64,

    /// Width of the composed display (overrides LUMEN_DISPLAY_WIDTH).
    #[arg(long)]
    width: Option<u32>,

    /// Height of the composed display (overrides LUMEN_DISPLAY_HEIGHT).
    #[arg(long)]
    height: Option<u32>,

    /// Print the effective pipeline configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> DemoResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let app = AppConfig::default().with_overrides(cli.width, cli.height);

    let pipeline_config = match &cli.config {
        Some(path) => {
            tracing::info!("loading pipeline config from {}", path.display());
            PipelineConfig::from_path(path)?
        }
        None => PipelineConfig::builtin(),
    };
    if cli.print_config {
        println!("{}", pipeline_config.to_json_string()?);
        return Ok(());
    }

    let pipeline = Arc::new(Pipeline::from_config(&pipeline_config)?);
    let source = open_source(cli.input.as_deref())?;
    std::fs::create_dir_all(&cli.output)?;

    tracing::info!(
        "display {}x{}, frame delay {:?}, output {}",
        app.display_width,
        app.display_height,
        app.frame_delay,
        cli.output.display()
    );

    // Detached: stdin reads block until EOF and the process may exit first.
    controller::spawn_stdin_controller(Arc::clone(&pipeline));

    let stop = Arc::new(AtomicBool::new(false));
    let render = RenderLoop {
        pipeline,
        source,
        display_size: (app.display_width, app.display_height),
        frame_delay: app.frame_delay,
    };
    let (mut rx, render_handle) = render.spawn(Arc::clone(&stop));

    let started = Instant::now();
    let save_every = cli.save_every.max(1);
    let mut shown = 0u64;
    while let Some(composed) = rx.blocking_recv() {
        if shown % save_every == 0 {
            let path = cli.output.join(format!("frame_{shown:06}.png"));
            if let Err(e) = composed.save(&path) {
                tracing::warn!("failed to save {}: {e}", path.display());
            } else {
                tracing::debug!("saved {}", path.display());
            }
        }
        shown += 1;

        if shown % 100 == 0 {
            let fps = shown as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
            tracing::info!("{shown} frames displayed ({fps:.1} fps)");
        }
        if cli.frames.is_some_and(|limit| shown >= limit) {
            break;
        }
    }

    stop.store(true, Ordering::Relaxed);
    drop(rx);
    let stats = render_handle
        .join()
        .map_err(|_| DemoError::from("render thread panicked"))?;
    tracing::info!(
        "done: {shown} frames displayed, {} failed, {} dropped",
        stats.failed,
        stats.dropped
    );
    Ok(())
}

fn open_source(input: Option<&std::path::Path>) -> DemoResult<Box<dyn FrameSource>> {
    let source: Box<dyn FrameSource> = match input {
        Some(path) if path.is_dir() => {
            tracing::info!("cycling frames from {}", path.display());
            Box::new(DirectorySource::open(path)?)
        }
        Some(path) => {
            tracing::info!("repeating still image {}", path.display());
            Box::new(StillImageSource::open(path)?)
        }
        None => {
            tracing::info!("no input given, using synthetic feed");
            Box::new(SyntheticSource::new(SYNTHETIC_SIZE.0, SYNTHETIC_SIZE.1))
        }
    };
    Ok(source)
}
