use chrono::{DateTime, FixedOffset, Local};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::analysis::{AllocationMode, AnalysisPipeline, AnalysisRecord, TimeContext};
use crate::core::AnalysisConfig;
use crate::detection::{CountSource, DirectionEstimates};
use crate::monitoring::{AnalysisHistory, EventBus, PipelineMetrics, TrafficEvent, TrafficStatistics};

/// Service context shared by request handlers. Owns the bounded history and
/// the randomness used for fallback counts.
pub struct TrafficAnalyzer {
    pipeline: AnalysisPipeline,
    history: AnalysisHistory,
    metrics: Arc<PipelineMetrics>,
    events: Arc<EventBus>,
    seeder: Mutex<ChaCha8Rng>,
}

impl TrafficAnalyzer {
    pub fn new(config: &AnalysisConfig, events: Arc<EventBus>) -> Self {
        let seeder = match config.fallback_seed {
            Some(seed) => {
                tracing::info!("🎲 Fallback RNG seeded with {}", seed);
                ChaCha8Rng::seed_from_u64(seed)
            }
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            pipeline: AnalysisPipeline::new(config.green_time_bounds()),
            history: AnalysisHistory::new(config.history_capacity),
            metrics: Arc::new(PipelineMetrics::new()),
            events,
            seeder: Mutex::new(seeder),
        }
    }

    /// Runs one full cycle and appends the result to the history.
    pub async fn analyze(
        &self,
        estimates: DirectionEstimates,
        at: DateTime<FixedOffset>,
    ) -> Arc<AnalysisRecord> {
        let start = Instant::now();

        // Each cycle gets its own generator so concurrent cycles never
        // contend on the shared one during evaluation.
        let mut rng = ChaCha8Rng::seed_from_u64(self.next_cycle_seed());
        let previous = self.history.latest().await.map(|r| r.signal_states);
        let time = TimeContext::from_datetime(&at);

        let evaluation = self
            .pipeline
            .evaluate(&estimates, &time, previous.as_ref(), &mut rng);

        for (direction, fused) in evaluation.fused.iter() {
            if fused.source.is_fallback() {
                self.events.publish(TrafficEvent::EstimatorFallback {
                    direction,
                    source: fused.source,
                    substituted_count: fused.count,
                });
            }
        }
        self.metrics
            .add_fallback_directions(evaluation.fallback_directions());
        if evaluation.allocation.mode == AllocationMode::Fallback {
            self.metrics.increment_allocator_faults();
        }

        let record = self
            .history
            .push(AnalysisRecord::from_evaluation(evaluation, at))
            .await;

        if record.emergency_mode {
            self.metrics.increment_emergency_cycles();
            tracing::warn!(
                "🚨 Emergency mode for {}: releasing {:?}",
                record.analysis_id,
                record.signal_states.greens()
            );
            self.events.publish(TrafficEvent::EmergencyActivated {
                analysis_id: record.analysis_id.clone(),
                released: record.signal_states.greens(),
                timestamp: record.timestamp,
            });
        }

        self.events.publish(TrafficEvent::AnalysisCompleted {
            analysis_id: record.analysis_id.clone(),
            total_vehicles: record.total_vehicles,
            signal_states: record.signal_states,
            timestamp: record.timestamp,
        });

        self.metrics.increment_analyses();
        self.metrics.record_latency(start.elapsed());

        tracing::info!(
            "✅ Analysis {} complete: {} vehicles, regime {}, {} recommendations",
            record.analysis_id,
            record.total_vehicles,
            record.regime,
            record.recommendations.len()
        );

        record
    }

    /// Pulls estimates from `source`. A failing source counts as missing
    /// input for every direction.
    pub async fn analyze_from<S: CountSource + ?Sized>(
        &self,
        source: &S,
        at: DateTime<FixedOffset>,
    ) -> Arc<AnalysisRecord> {
        let estimates = match source.collect(at).await {
            Ok(estimates) => estimates,
            Err(e) => {
                tracing::error!("❌ Estimate source failed: {}", e);
                self.metrics.increment_source_errors();
                DirectionEstimates::default()
            }
        };

        self.analyze(estimates, at).await
    }

    pub async fn analyze_now<S: CountSource + ?Sized>(&self, source: &S) -> Arc<AnalysisRecord> {
        self.analyze_from(source, Local::now().fixed_offset()).await
    }

    /// Evaluates on every tick until `shutdown` resolves. The shutdown future
    /// is created once and polled by reference, so a request that arrives
    /// mid-cycle is seen before the next tick. Returns the cycles completed.
    pub async fn run<S, F>(
        &self,
        source: &S,
        period: Duration,
        statistics_every: u64,
        shutdown: F,
    ) -> u64
    where
        S: CountSource + ?Sized,
        F: Future,
    {
        let mut interval = tokio::time::interval(period);
        let statistics_every = statistics_every.max(1);
        let mut cycles: u64 = 0;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("🛑 Shutdown requested");
                    break;
                }
                _ = interval.tick() => {}
            }

            let record = self.analyze_now(source).await;
            cycles += 1;

            for recommendation in &record.recommendations {
                tracing::info!("💡 {}", recommendation);
            }

            if cycles % statistics_every == 0 {
                if let Some(stats) = self.statistics().await {
                    tracing::info!(
                        "📈 Last {} analyses: avg {:.1} vehicles (min {}, max {}), {} in emergency mode",
                        stats.total_analyses,
                        stats.average_vehicles,
                        stats.min_vehicles,
                        stats.max_vehicles,
                        stats.emergency_mode_count
                    );
                }
                self.metrics.print_report();
            }
        }

        cycles
    }

    pub fn history(&self) -> &AnalysisHistory {
        &self.history
    }

    pub async fn statistics(&self) -> Option<TrafficStatistics> {
        self.history.statistics().await
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    fn next_cycle_seed(&self) -> u64 {
        match self.seeder.lock() {
            Ok(mut seeder) => seeder.next_u64(),
            // the generator holds no invariant a panic could break
            Err(poisoned) => poisoned.into_inner().next_u64(),
        }
    }
}
