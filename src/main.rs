//! HandSignal command-line entry point

use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use sysinfo::System;

use handsignal::broadcast::StdoutTransport;
use handsignal::detection::{HandDetector, ReplayDetector};
use handsignal::messaging::Event;
use handsignal::{AppResult, Config, Session, Settings};

const LOG_TARGET_STARTUP: &str = "handsignal::startup";

/// Initialize tracing with file rotation
///
/// Logs are written to `<config_dir>/HandSignal/logs/handsignal.YYYY-MM-DD.log`.
/// Debug builds also log to stderr; stdout carries status payloads.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = Config::app_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "handsignal.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let mut system = System::new();
    system.refresh_memory();

    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());
    let architecture = std::env::consts::ARCH;
    let threads = std::thread::available_parallelism().map_or(1, |n| n.get());

    tracing::info!(target: LOG_TARGET_STARTUP, "Starting HandSignal v{} on ({})", version, architecture);
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);
    tracing::debug!(
        target: LOG_TARGET_STARTUP,
        "{} hardware threads, {} MiB memory",
        threads,
        system.total_memory() / (1024 * 1024)
    );
}

/// Replays recorded hand landmarks (JSON lines) through the gesture engine
/// and writes status payloads to stdout.
#[derive(Debug, Parser)]
#[command(name = "handsignal", version, about)]
struct CliOptions {
    /// Landmark input, one JSON array of hands per line ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    frames: Option<PathBuf>,

    /// Import a signals file before starting
    #[arg(long, value_name = "PATH")]
    signals: Option<PathBuf>,

    /// Record into NAME (created if missing) once detection runs
    #[arg(long, value_name = "NAME")]
    record: Option<String>,

    /// Enable auto-learning
    #[arg(long)]
    learn: bool,

    /// Export the signals on exit (default: last loaded filename)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    export: Option<Option<PathBuf>>,

    /// Settings file (default: user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Restore default settings before loading them
    #[arg(long)]
    reset_config: bool,
}

impl CliOptions {
    /// Frames file, `None` for stdin
    fn frames_path(&self) -> Option<&Path> {
        self.frames.as_deref().filter(|path| *path != Path::new("-"))
    }
}

fn open_detector(options: &CliOptions, settings: &Settings) -> AppResult<Box<dyn HandDetector>> {
    let detector: Box<dyn HandDetector> = match options.frames_path() {
        Some(path) => Box::new(
            ReplayDetector::open(path, &settings.detector)
                .with_context(|| format!("Failed to open frames file {}", path.display()))?,
        ),
        None => Box::new(ReplayDetector::new(BufReader::new(io::stdin()), &settings.detector)),
    };
    Ok(detector)
}

fn run(options: CliOptions) -> AppResult<()> {
    if options.reset_config {
        let mut defaults = Config::default();
        match &options.config {
            Some(path) => defaults.reset_at(path),
            None => defaults.reset(),
        }
        .context("Failed to reset settings")?;
    }

    let config = match &options.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load settings")?;
    let settings = config.resolve();
    tracing::info!(
        "Settings: tolerance {:?}, recognize at {}, learn at {}",
        settings.tolerance,
        settings.recognition_threshold,
        settings.learning_threshold
    );

    let session = Session::with_transport(settings.clone(), Box::new(StdoutTransport::new()))?;
    let (events, _id) = session.event_bus().subscribe();

    if let Some(path) = &options.signals {
        session.import_file(path)?;
    }
    if let Some(name) = &options.record {
        if session.store().contains(name) {
            session.select_signal(Some(name.as_str()))?;
        } else {
            session.create_signal(name)?;
        }
    }
    if options.learn {
        session.toggle_learning();
    }

    session.start_detection(open_detector(&options, &settings)?)?;

    for event in events.iter() {
        match &event {
            Event::ProcessStateChanged { new_state, .. } if new_state.is_running() => {
                if options.record.is_some() {
                    session.record()?;
                }
            }
            Event::ProcessStateChanged { new_state, .. } if new_state.is_stopped() => break,
            Event::PredictionsUpdated { .. } => {
                tracing::debug!("{}", event.description());
                continue;
            }
            _ => {}
        }
        tracing::info!("{}", event.description());
    }
    session.wait_for_detection();

    if let Some(path) = &options.export {
        let target = session.export_file(path.as_deref())?;
        eprintln!("Signals exported to {}", target.display());
    }

    session.shutdown();
    Ok(())
}

fn main() {
    let options = CliOptions::parse();

    initialize_tracing();
    log_runtime_environment();

    if let Err(err) = run(options) {
        tracing::error!("{err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<CliOptions, clap::Error> {
        CliOptions::try_parse_from(std::iter::once("handsignal").chain(args.iter().copied()))
    }

    #[test]
    fn test_command_definition() {
        CliOptions::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.frames_path(), None);
        assert_eq!(options.signals, None);
        assert_eq!(options.record, None);
        assert!(!options.learn);
        assert_eq!(options.export, None);
        assert!(!options.reset_config);
    }

    #[test]
    fn test_parse_all_flags() {
        let options = parse(&[
            "--frames", "hands.jsonl", "--signals", "in.json", "--record", "fist", "--learn",
            "--export", "out.json", "--config", "cfg.json", "--reset-config",
        ])
        .unwrap();

        assert_eq!(options.frames_path(), Some(Path::new("hands.jsonl")));
        assert_eq!(options.signals, Some(PathBuf::from("in.json")));
        assert_eq!(options.record.as_deref(), Some("fist"));
        assert!(options.learn);
        assert_eq!(options.export, Some(Some(PathBuf::from("out.json"))));
        assert_eq!(options.config, Some(PathBuf::from("cfg.json")));
        assert!(options.reset_config);
    }

    #[test]
    fn test_parse_export_without_path() {
        let options = parse(&["--export", "--learn"]).unwrap();
        assert_eq!(options.export, Some(None));
        assert!(options.learn);
    }

    #[test]
    fn test_parse_stdin_frames() {
        assert_eq!(parse(&["--frames", "-"]).unwrap().frames_path(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["--record"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }
}
