use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use cubit::{AppConfig, AppContext};
use cubit_gpu::HeadlessBackend;
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};

#[derive(Parser, Debug)]
#[command(name = "cubit", version, about = "Streams voxel terrain around a flying camera and batches it for GPU-culled indirect drawing")]
struct Cli {
    /// App config; asset paths inside it are relative to the file.
    #[arg(long, default_value = "assets/cubit.toml")]
    config: PathBuf,
    #[arg(long)]
    seed: Option<i32>,
    /// Chebyshev radius in chunk columns.
    #[arg(long)]
    load_distance: Option<i32>,
    #[arg(long, default_value_t = 600)]
    frames: u64,
    /// off, error, warn, info, debug or trace. Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<LevelFilter>,
    /// Also write the log to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(level: Option<LevelFilter>, file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match file {
        Some(path) => {
            let level = level.unwrap_or(LevelFilter::Info);
            CombinedLogger::init(vec![
                TermLogger::new(
                    level,
                    simplelog::Config::default(),
                    TerminalMode::Mixed,
                    ColorChoice::Auto,
                ),
                WriteLogger::new(level, simplelog::Config::default(), File::create(path)?),
            ])?;
        }
        None => {
            let mut builder =
                env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
            if let Some(level) = level {
                builder.filter_level(level);
            }
            builder.try_init()?;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_file.as_deref())?;

    let mut cfg = AppConfig::load_from_path(&cli.config)?;
    if let Some(seed) = cli.seed {
        cfg.world.seed = seed;
    }
    if let Some(d) = cli.load_distance {
        cfg.streaming.load_distance = d;
    }

    let mut app = AppContext::new(cfg, HeadlessBackend::new())?;
    let start = Instant::now();
    let summary = app.run(cli.frames, 1.0 / 60.0);
    log::info!(
        target: "app",
        "{} frames in {:.2?}: {} results applied, {} stale, {} chunks evicted, {} draw calls",
        summary.frames,
        start.elapsed(),
        summary.applied,
        summary.discarded,
        summary.evicted,
        summary.draw_calls
    );
    Ok(())
}
