//! # zstream
//!
//! Command-line driver for the rolling z-score anomaly detector.
//! Reads a synthetic or file-backed stream, scores every value and writes
//! one JSON record per classified tick.

mod input;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anomaly_facade::{
    AnomalyDetector, FanOutSink, JsonLinesSink, LogSink, Monitor, Paced, RunSummary,
    SineNoiseSource, SpikeInjector, StreamConfig,
};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "zstream")]
#[command(about = "Rolling z-score anomaly detection over numeric streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a synthetic sine + noise stream
    Run {
        #[command(flatten)]
        detector: DetectorArgs,

        /// Stop after this many ticks (default: run forever)
        #[arg(short = 'n', long)]
        ticks: Option<u64>,

        /// Seed for the noise generator
        #[arg(long)]
        seed: Option<u64>,

        /// Emit values at the configured tick interval instead of as fast as possible
        #[arg(long)]
        realtime: bool,

        /// Add a spike to every Nth value
        #[arg(long, requires = "spike_magnitude")]
        spike_every: Option<u64>,

        /// Size of injected spikes
        #[arg(long)]
        spike_magnitude: Option<f64>,
    },

    /// Score a finite series read from a file (CSV, JSON or plain text)
    Detect {
        #[command(flatten)]
        detector: DetectorArgs,

        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Column name or index for CSV/JSON input
        #[arg(short, long)]
        column: Option<String>,
    },
}

/// Options shared by every subcommand.
#[derive(Args)]
struct DetectorArgs {
    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rolling window size
    #[arg(short, long)]
    window_size: Option<usize>,

    /// Z-score threshold
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Recompute statistics from scratch every N streaming ticks
    #[arg(long)]
    resync_interval: Option<usize>,

    /// Output file for JSON lines (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only write records flagged as anomalies
    #[arg(long)]
    anomalies_only: bool,
}

impl DetectorArgs {
    /// File configuration (or defaults) with command-line overrides applied.
    fn resolve(&self) -> anyhow::Result<StreamConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => StreamConfig::default(),
        };
        if let Some(window_size) = self.window_size {
            config.detector.window_size = window_size;
        }
        if let Some(threshold) = self.threshold {
            config.detector.threshold = threshold;
        }
        if let Some(interval) = self.resync_interval {
            config.detector.resync_interval = Some(interval);
        }
        config.validate()?;
        Ok(config)
    }

    fn writer(&self) -> anyhow::Result<Box<dyn Write + Send>> {
        Ok(match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout()),
        })
    }
}

fn load_config(path: &Path) -> anyhow::Result<StreamConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = StreamConfig::from_json_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zstream=info,anomaly_core=info".into()),
        )
        .init();
}

/// Wire detector and sinks together and drain `source` through them.
fn stream<I>(
    args: &DetectorArgs,
    config: &StreamConfig,
    source: I,
    limit: Option<u64>,
) -> anyhow::Result<RunSummary>
where
    I: IntoIterator<Item = f64>,
{
    let detector = AnomalyDetector::from_config(config.detector.clone())?;
    let sink = FanOutSink::new()
        .with(LogSink::new(config.alert.clone()))
        .with(JsonLinesSink::new(args.writer()?).anomalies_only(args.anomalies_only));

    tracing::info!(
        window_size = config.detector.window_size,
        threshold = config.detector.threshold,
        "detector ready"
    );

    let mut monitor = Monitor::new(detector, sink);
    Ok(monitor.run(source, limit))
}

fn run_synthetic(
    args: DetectorArgs,
    ticks: Option<u64>,
    seed: Option<u64>,
    realtime: bool,
    spike: Option<(u64, f64)>,
) -> anyhow::Result<RunSummary> {
    let mut config = args.resolve()?;
    if seed.is_some() {
        config.source.seed = seed;
    }

    let source = SineNoiseSource::from_config(&config.source)?;
    let interval = Duration::from_millis(config.source.tick_interval_ms);

    let values: Box<dyn Iterator<Item = f64>> = match spike {
        Some((every, magnitude)) => Box::new(SpikeInjector::new(source, every, magnitude)?),
        None => Box::new(source),
    };
    let values: Box<dyn Iterator<Item = f64>> = if realtime {
        Box::new(Paced::new(values, interval))
    } else {
        values
    };

    stream(&args, &config, values, ticks)
}

fn run_detect(
    args: DetectorArgs,
    input: PathBuf,
    column: Option<String>,
) -> anyhow::Result<RunSummary> {
    let config = args.resolve()?;
    let values = input::load_values(&input, column.as_deref())
        .with_context(|| format!("failed to load {}", input.display()))?;
    tracing::info!(points = values.len(), file = %input.display(), "loaded series");

    stream(&args, &config, values, None)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let summary = match cli.command {
        Commands::Run {
            detector,
            ticks,
            seed,
            realtime,
            spike_every,
            spike_magnitude,
        } => {
            let spike = spike_every.zip(spike_magnitude);
            run_synthetic(detector, ticks, seed, realtime, spike)?
        }
        Commands::Detect {
            detector,
            input,
            column,
        } => run_detect(detector, input, column)?,
    };

    eprintln!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
