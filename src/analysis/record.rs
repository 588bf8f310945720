use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::allocator::AllocationMode;
use super::pipeline::Evaluation;
use super::time_policy::TimeRegime;
use super::types::{DensityLevel, DirectionMap, SignalMap};

/// Immutable snapshot of one completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub analysis_id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub vehicle_counts: DirectionMap<u32>,
    pub traffic_density: DirectionMap<DensityLevel>,
    pub signal_states: SignalMap,
    pub recommendations: Vec<String>,
    pub total_vehicles: u32,
    pub emergency_mode: bool,
    pub regime: TimeRegime,
    pub allocation_mode: AllocationMode,
    pub confidence: DirectionMap<f64>,
    pub green_times: DirectionMap<u32>,
}

impl AnalysisRecord {
    pub fn from_evaluation(evaluation: Evaluation, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            analysis_id: generate_analysis_id(&timestamp),
            timestamp,
            total_vehicles: evaluation.total_vehicles(),
            confidence: evaluation.fused.map(|_, f| f.confidence),
            vehicle_counts: evaluation.vehicle_counts,
            traffic_density: evaluation.traffic_density,
            signal_states: evaluation.allocation.states,
            emergency_mode: evaluation.allocation.emergency,
            allocation_mode: evaluation.allocation.mode,
            recommendations: evaluation.recommendations,
            regime: evaluation.regime,
            green_times: evaluation.green_times,
        }
    }
}

fn generate_analysis_id(timestamp: &DateTime<FixedOffset>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "TRAFFIC_ANALYSIS_{}_{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        &suffix[..8]
    )
}
