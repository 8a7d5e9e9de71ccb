use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Turn a GPX track into a street-level drive-through MP4.
#[derive(Parser, Debug)]
#[command(name = "drivelapse", version)]
struct Cli {
    /// Input GPX track.
    track: PathBuf,

    /// Output MP4 path.
    out: PathBuf,

    /// Midpoint-densification passes (each pass doubles the sample count).
    #[arg(long, default_value_t = 1)]
    iterations: u32,

    /// Hard cap on points processed after densification.
    #[arg(long, default_value_t = 2500)]
    max_points: usize,

    /// Output frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Street View API key.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let cfg = drivelapse::PipelineConfig {
        api_key: cli.api_key,
        densify_iterations: cli.iterations,
        max_points: cli.max_points,
        fps: cli.fps,
        ..drivelapse::PipelineConfig::default()
    };

    let provider = drivelapse::StreetViewProvider::new(&cfg);
    let summary = drivelapse::pipeline::run(&cli.track, &cli.out, &provider, &cfg)?;

    eprintln!(
        "wrote {} ({} raw points, {} processed, {} frames, {} duplicates skipped, {} failures)",
        cli.out.display(),
        summary.raw_points,
        summary.fetch.points_processed,
        summary.fetch.frames_written,
        summary.fetch.duplicates_skipped,
        summary.fetch.failures,
    );
    Ok(())
}
