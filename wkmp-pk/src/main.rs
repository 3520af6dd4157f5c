//! WKMP Packetizer (wkmp-pk)
//!
//! Decodes an audio file into fixed-size PCM packets.
//!
//! **Usage:**
//! ```bash
//! wkmp-pk [INPUT] [--frames-per-packet N] [--config FILE] [--output FILE] [--export FILE]
//! ```
//!
//! Exit status is 0 when every packet was produced, otherwise the code of the
//! failing stage (see [`wkmp_pk::Stage::exit_code`]).

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wkmp_common::config::{ConfigSource, LoggingConfig};
use wkmp_pk::audio::SymphoniaOpener;
use wkmp_pk::config::{Config, ConfigOverrides};
use wkmp_pk::packetizer::{DiscardSink, PacketSink, WriterSink};
use wkmp_pk::{Packetizer, RunSummary, Stage};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(name = "wkmp-pk")]
#[clap(about = "Decode an audio file into fixed-size PCM packets")]
#[clap(version)]
struct Args {
    /// Audio file to packetize (default: audio_file.wav)
    #[clap(value_name = "INPUT", env = "WKMP_PK_INPUT")]
    input: Option<PathBuf>,

    /// PCM frames per packet (default: 1024)
    #[clap(short = 'f', long, env = "WKMP_PK_FRAMES_PER_PACKET")]
    frames_per_packet: Option<u32>,

    /// Path to TOML bootstrap file
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write packet data as raw interleaved PCM to this file
    #[clap(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Export the run summary as JSON
    #[clap(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[clap(long, env = "WKMP_PK_LOG_LEVEL")]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let stage = e
                .downcast_ref::<wkmp_pk::Error>()
                .map(wkmp_pk::Error::stage)
                .unwrap_or(Stage::Config);
            eprintln!("wkmp-pk: {} failed: {:#}", stage, e);
            ExitCode::from(stage.exit_code())
        }
    }
}

fn run(args: Args) -> Result<()> {
    let overrides = ConfigOverrides {
        input: args.input,
        frames_per_packet: args.frames_per_packet,
        log_level: args.log_level,
    };
    let config = Config::load(args.config.as_deref(), overrides)?;

    init_logging(&config.logging)?;

    info!("Starting WKMP Packetizer (wkmp-pk)");
    match &config.source {
        ConfigSource::File(path) => info!("Configuration loaded from {}", path.display()),
        ConfigSource::Defaults => warn!("No config file found, using built-in defaults"),
    }
    info!("Input: {}", config.input.display());
    info!("Frames per packet: {}", config.frames_per_packet);

    let mut sink: Box<dyn PacketSink> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            info!("Writing packets to {}", path.display());
            Box::new(WriterSink::new(BufWriter::new(file)))
        }
        None => Box::new(DiscardSink::default()),
    };

    let packetizer = Packetizer::new(config.frames_per_packet);

    info!("Begin packetization");
    let summary = packetizer.run(&SymphoniaOpener, &config.input, sink.as_mut())?;
    info!("End packetization");

    if let Some(path) = &args.export {
        export_summary(&summary, path)?;
        info!("Summary exported to {}", path.display());
    }

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.to_ascii_lowercase()));

    let (writer, ansi) = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(ansi))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

fn export_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    Ok(())
}
