use rand::Rng;
use serde::{Deserialize, Serialize};

use super::allocator::{Allocation, SignalAllocator};
use super::density::classify_all;
use super::fusion::{fuse_all, FusedCount};
use super::recommendations::generate_recommendations;
use super::time_policy::{TimeContext, TimeRegime};
use super::timing::{plan_green_times, GreenTimeBounds};
use super::types::{DensityLevel, DirectionMap, SignalMap};
use crate::detection::DirectionEstimates;

/// Everything one cycle derives from its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub fused: DirectionMap<FusedCount>,
    pub vehicle_counts: DirectionMap<u32>,
    pub traffic_density: DirectionMap<DensityLevel>,
    pub regime: TimeRegime,
    pub allocation: Allocation,
    pub recommendations: Vec<String>,
    pub green_times: DirectionMap<u32>,
}

impl Evaluation {
    pub fn total_vehicles(&self) -> u32 {
        self.vehicle_counts.total()
    }

    pub fn signal_states(&self) -> &SignalMap {
        &self.allocation.states
    }

    pub fn fallback_directions(&self) -> usize {
        self.fused.iter().filter(|(_, f)| f.source.is_fallback()).count()
    }
}

/// Fusion -> density -> allocation -> recommendations. Holds no per-cycle
/// state, so one instance can serve concurrent requests.
pub struct AnalysisPipeline {
    allocator: SignalAllocator,
    green_bounds: GreenTimeBounds,
}

impl AnalysisPipeline {
    pub fn new(green_bounds: GreenTimeBounds) -> Self {
        Self {
            allocator: SignalAllocator::new(),
            green_bounds,
        }
    }

    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        estimates: &DirectionEstimates,
        time: &TimeContext,
        previous: Option<&SignalMap>,
        rng: &mut R,
    ) -> Evaluation {
        let regime = time.regime();

        let fused = fuse_all(estimates, time, rng);
        let vehicle_counts = fused.map(|_, f| f.count);
        let traffic_density = classify_all(&vehicle_counts);

        let allocation = self
            .allocator
            .allocate(&vehicle_counts, &traffic_density, regime, previous);

        let recommendations = generate_recommendations(
            &vehicle_counts,
            &traffic_density,
            &allocation.states,
            regime,
        );
        let green_times = plan_green_times(&vehicle_counts, &allocation.states, self.green_bounds);

        Evaluation {
            fused,
            vehicle_counts,
            traffic_density,
            regime,
            allocation,
            recommendations,
            green_times,
        }
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new(GreenTimeBounds::default())
    }
}
