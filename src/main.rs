use anyhow::Result;
use std::sync::Arc;

use traffic_signal_ai::core::{logging, Config};
use traffic_signal_ai::detection::SimulatedSource;
use traffic_signal_ai::monitoring::{EventBus, TrafficEvent};
use traffic_signal_ai::service::TrafficAnalyzer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level);

    tracing::info!("🚦 Traffic signal analyzer starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "History capacity: {}, green time {}-{}s",
        config.analysis.history_capacity,
        config.analysis.min_green_secs,
        config.analysis.max_green_secs
    );

    let events = Arc::new(EventBus::new(config.monitoring.event_bus_capacity));
    let analyzer = TrafficAnalyzer::new(&config.analysis, events.clone());
    let source = SimulatedSource::new(
        config.analysis.fallback_seed,
        config.analysis.simulated_dropout_rate,
    );

    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let TrafficEvent::EmergencyActivated { analysis_id, released, .. } = event {
                tracing::warn!("🚨 {} released {:?} under emergency protocol", analysis_id, released);
            }
        }
    });

    let period = std::time::Duration::from_secs(config.monitoring.evaluation_interval_secs.max(1));
    let cycles = analyzer
        .run(
            &source,
            period,
            config.monitoring.statistics_every,
            tokio::signal::ctrl_c(),
        )
        .await;

    tracing::info!("Stopped after {} analysis cycles", cycles);
    analyzer.metrics().print_report();
    Ok(())
}
