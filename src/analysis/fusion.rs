use rand::Rng;
use serde::{Deserialize, Serialize};

use super::time_policy::TimeContext;
use super::types::{Direction, DirectionMap};
use crate::detection::{DirectionEstimates, MethodEstimate};

pub const MAX_FUSED_COUNT: u32 = 25;

const SINGLE_ESTIMATOR_CONFIDENCE: f64 = 0.7;
const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Weight assigned to the known counting methods.
pub fn default_method_weight(method: &str) -> f64 {
    match method {
        "contour" => 0.5,
        "cascade" => 0.2,
        // motion, feature, pattern and anything unrecognised
        _ => 0.3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionSource {
    Estimators { used: usize },
    /// No estimate arrived for the direction.
    MissingInput,
    /// Estimates arrived but every one of them was unusable.
    AllEstimatorsFailed,
}

impl FusionSource {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, FusionSource::Estimators { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedCount {
    pub count: u32,
    pub confidence: f64,
    pub source: FusionSource,
}

/// Fuses one direction's estimates into a single count.
pub fn fuse_direction<R: Rng + ?Sized>(
    direction: Direction,
    estimates: &[MethodEstimate],
    time: &TimeContext,
    rng: &mut R,
) -> FusedCount {
    if estimates.is_empty() {
        let count = rng.gen_range(1..=8);
        tracing::warn!(
            "⚠️  No estimates for {} - using fallback count {}",
            direction,
            count
        );
        return FusedCount {
            count,
            confidence: FALLBACK_CONFIDENCE,
            source: FusionSource::MissingInput,
        };
    }

    let mut usable = Vec::with_capacity(estimates.len());
    for estimate in estimates {
        match estimate.usable() {
            Ok(pair) => usable.push(pair),
            Err(e) => {
                tracing::debug!("{} estimator '{}' excluded: {}", direction, estimate.method, e);
            }
        }
    }

    if usable.is_empty() {
        let count = rng.gen_range(2..=6);
        tracing::warn!(
            "⚠️  All {} estimators failed for {} - using fallback count {}",
            estimates.len(),
            direction,
            count
        );
        return FusedCount {
            count,
            confidence: FALLBACK_CONFIDENCE,
            source: FusionSource::AllEstimatorsFailed,
        };
    }

    let combined = weighted_count(&usable);
    let adjusted = time.adjust_count(combined).min(MAX_FUSED_COUNT);
    let confidence = agreement_confidence(&usable);

    tracing::debug!(
        "🎯 {}: combined={} adjusted={} confidence={:.2} ({} estimators)",
        direction,
        combined,
        adjusted,
        confidence,
        usable.len()
    );

    FusedCount {
        count: adjusted,
        confidence,
        source: FusionSource::Estimators { used: usable.len() },
    }
}

pub fn fuse_all<R: Rng + ?Sized>(
    estimates: &DirectionEstimates,
    time: &TimeContext,
    rng: &mut R,
) -> DirectionMap<FusedCount> {
    // from_fn visits directions in canonical order, so fallback draws are stable.
    DirectionMap::from_fn(|direction| {
        fuse_direction(direction, &estimates[direction], time, &mut *rng)
    })
}

fn weighted_count(usable: &[(u32, f64)]) -> u32 {
    let total_weight: f64 = usable.iter().map(|(_, w)| w).sum();

    let value = if total_weight > 0.0 {
        usable.iter().map(|(c, w)| *c as f64 * w).sum::<f64>() / total_weight
    } else {
        usable.iter().map(|(c, _)| *c as f64).sum::<f64>() / usable.len() as f64
    };

    // Bounded here so the time multipliers cannot overflow; the final clamp comes after them.
    value.round().clamp(0.0, MAX_FUSED_COUNT as f64 * 4.0) as u32
}

fn agreement_confidence(usable: &[(u32, f64)]) -> f64 {
    if usable.len() < 2 {
        return SINGLE_ESTIMATOR_CONFIDENCE;
    }

    let n = usable.len() as f64;
    let mean = usable.iter().map(|(c, _)| *c as f64).sum::<f64>() / n;
    let variance = usable
        .iter()
        .map(|(c, _)| (*c as f64 - mean).powi(2))
        .sum::<f64>()
        / n;

    (1.0 - variance / (mean + 1.0)).clamp(0.0, 1.0)
}
