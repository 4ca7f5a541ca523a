//! Basic example: detect spikes in a synthetic sine stream
//!
//! Run with: cargo run --example basic -p anomaly-facade

use anomaly_facade::{
    AlertConfig, AnomalyDetector, DetectorConfig, FanOutSink, HistorySink, LogSink, Monitor,
    SineNoiseSource, SpikeInjector,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Rolling Z-Score Example ===\n");

    let config = DetectorConfig::builder()
        .window_size(30)
        .threshold(3.0)
        .build()?;
    println!("Window size: {}, threshold: {}", config.window_size, config.threshold);

    // Sine wave with noise, plus a +5.0 spike every 150 ticks
    let source = SpikeInjector::new(SineNoiseSource::seeded(7), 150, 5.0)?;

    let detector = AnomalyDetector::from_config(config)?;
    let sink = FanOutSink::new()
        .with(LogSink::new(AlertConfig::default()))
        .with(HistorySink::new());
    let mut monitor = Monitor::new(detector, sink);

    let summary = monitor.run(source, Some(1_000));

    println!("\nSummary:");
    println!("   Ticks read:   {}", summary.ticks);
    println!("   Classified:   {}", summary.classified);
    println!("   Anomalies:    {}", summary.anomalies);
    println!("   Anomaly rate: {:.2}%", summary.anomaly_rate() * 100.0);

    println!("\n=== Example Complete ===");
    Ok(())
}
