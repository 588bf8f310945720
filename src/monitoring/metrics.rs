use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct PipelineMetrics {
    analyses_completed: AtomicU64,
    fallback_directions: AtomicU64,
    emergency_cycles: AtomicU64,
    allocator_faults: AtomicU64,
    source_errors: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            analyses_completed: AtomicU64::new(0),
            fallback_directions: AtomicU64::new(0),
            emergency_cycles: AtomicU64::new(0),
            allocator_faults: AtomicU64::new(0),
            source_errors: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn increment_analyses(&self) {
        self.analyses_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_fallback_directions(&self, count: usize) {
        self.fallback_directions
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn increment_emergency_cycles(&self) {
        self.emergency_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_allocator_faults(&self) {
        self.allocator_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_source_errors(&self) {
        self.source_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, latency: Duration) {
        self.total_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_analyses_completed(&self) -> u64 {
        self.analyses_completed.load(Ordering::Relaxed)
    }

    pub fn get_fallback_directions(&self) -> u64 {
        self.fallback_directions.load(Ordering::Relaxed)
    }

    pub fn get_emergency_cycles(&self) -> u64 {
        self.emergency_cycles.load(Ordering::Relaxed)
    }

    pub fn get_allocator_faults(&self) -> u64 {
        self.allocator_faults.load(Ordering::Relaxed)
    }

    pub fn get_source_errors(&self) -> u64 {
        self.source_errors.load(Ordering::Relaxed)
    }

    pub fn get_average_latency_ms(&self) -> f64 {
        let total = self.total_latency_us.load(Ordering::Relaxed);
        let samples = self.latency_samples.load(Ordering::Relaxed);

        if samples == 0 {
            0.0
        } else {
            total as f64 / samples as f64 / 1000.0
        }
    }

    pub fn get_uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn get_snapshot(&self) -> HashMap<String, serde_json::Value> {
        let mut snapshot = HashMap::new();

        snapshot.insert(
            "analyses_completed".to_string(),
            serde_json::json!(self.get_analyses_completed()),
        );
        snapshot.insert(
            "fallback_directions".to_string(),
            serde_json::json!(self.get_fallback_directions()),
        );
        snapshot.insert(
            "emergency_cycles".to_string(),
            serde_json::json!(self.get_emergency_cycles()),
        );
        snapshot.insert(
            "allocator_faults".to_string(),
            serde_json::json!(self.get_allocator_faults()),
        );
        snapshot.insert(
            "source_errors".to_string(),
            serde_json::json!(self.get_source_errors()),
        );
        snapshot.insert(
            "average_latency_ms".to_string(),
            serde_json::json!(self.get_average_latency_ms()),
        );
        snapshot.insert(
            "uptime_secs".to_string(),
            serde_json::json!(self.get_uptime_secs()),
        );

        snapshot
    }

    pub fn print_report(&self) {
        tracing::info!(
            "📊 Pipeline metrics: {} analyses, {} emergency cycles, {} fallback directions, {} allocator faults, {} source errors, avg {:.3} ms, uptime {}s",
            self.get_analyses_completed(),
            self.get_emergency_cycles(),
            self.get_fallback_directions(),
            self.get_allocator_faults(),
            self.get_source_errors(),
            self.get_average_latency_ms(),
            self.get_uptime_secs(),
        );
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
