pub mod event_bus;
pub mod history;
pub mod metrics;

pub use event_bus::{EventBus, TrafficEvent};
pub use history::{AnalysisHistory, TrafficStatistics, DEFAULT_HISTORY_CAPACITY};
pub use metrics::PipelineMetrics;
