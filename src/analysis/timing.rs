use super::fusion::MAX_FUSED_COUNT;
use super::types::{DirectionMap, SignalMap};

#[derive(Debug, Clone, Copy)]
pub struct GreenTimeBounds {
    pub min_secs: u32,
    pub max_secs: u32,
}

impl Default for GreenTimeBounds {
    fn default() -> Self {
        Self {
            min_secs: 10,
            max_secs: 60,
        }
    }
}

/// Suggested green duration per approach, scaled linearly with the queue.
/// Red approaches get zero.
pub fn plan_green_times(
    counts: &DirectionMap<u32>,
    states: &SignalMap,
    bounds: GreenTimeBounds,
) -> DirectionMap<u32> {
    let min = bounds.min_secs.min(bounds.max_secs) as f64;
    let max = bounds.max_secs.max(bounds.min_secs) as f64;

    DirectionMap::from_fn(|d| {
        if !states[d].is_green() {
            return 0;
        }
        let load = counts[d].min(MAX_FUSED_COUNT) as f64 / MAX_FUSED_COUNT as f64;
        (min + (max - min) * load).round() as u32
    })
}
