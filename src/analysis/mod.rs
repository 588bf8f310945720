pub mod allocator;
pub mod density;
pub mod fusion;
pub mod pipeline;
pub mod recommendations;
pub mod record;
pub mod time_policy;
pub mod timing;
pub mod types;

pub use allocator::{is_emergency, Allocation, AllocationMode, AllocatorFault, SignalAllocator};
pub use density::{classify, classify_all};
pub use fusion::{default_method_weight, FusedCount, FusionSource, MAX_FUSED_COUNT};
pub use pipeline::{AnalysisPipeline, Evaluation};
pub use recommendations::{generate_recommendations, MAX_RECOMMENDATIONS, OPERATING_OPTIMALLY};
pub use record::AnalysisRecord;
pub use time_policy::{TimeContext, TimeRegime};
pub use timing::GreenTimeBounds;
pub use types::{Axis, DensityLevel, Direction, DirectionMap, SignalMap, SignalState};
