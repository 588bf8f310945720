use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Mutex;

use super::estimates::{DirectionEstimates, EstimatorFailure, MethodEstimate};
use crate::analysis::fusion::default_method_weight;
use crate::analysis::time_policy::{TimeContext, TimeRegime};
use crate::analysis::types::{DensityLevel, Direction, DirectionMap};

/// Supplies per-direction estimates for one cycle. Image decoding and the
/// detectors themselves live behind this boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountSource: Send + Sync {
    async fn collect(&self, at: DateTime<FixedOffset>) -> Result<DirectionEstimates>;
}

/// Stand-in detector bank that draws contour, feature and pattern counts
/// around the usual load for the time of day.
pub struct SimulatedSource {
    rng: Mutex<ChaCha8Rng>,
    dropout_rate: f64,
}

impl SimulatedSource {
    pub fn new(seed: Option<u64>, dropout_rate: f64) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            dropout_rate: dropout_rate.clamp(0.0, 1.0),
        }
    }

    fn typical_load(regime: TimeRegime, direction: Direction) -> DensityLevel {
        use DensityLevel::*;
        let pattern = match regime {
            TimeRegime::MorningPeak => DirectionMap { north: High, south: Medium, east: Low, west: High },
            TimeRegime::EveningPeak => DirectionMap { north: Medium, south: High, east: High, west: Medium },
            _ => DirectionMap { north: Medium, south: Medium, east: Low, west: Low },
        };
        pattern[direction]
    }

    fn base_count(level: DensityLevel) -> i64 {
        match level {
            DensityLevel::VeryLow => 1,
            DensityLevel::Low => 3,
            DensityLevel::Medium => 7,
            DensityLevel::High => 12,
            DensityLevel::VeryHigh => 18,
        }
    }

    fn sample(&self, rng: &mut ChaCha8Rng, method: &str, raw: i64) -> MethodEstimate {
        let weight = default_method_weight(method);
        if rng.gen_bool(self.dropout_rate) {
            return MethodEstimate::failed(
                method,
                EstimatorFailure::Unavailable(format!("{} detector dropped the frame", method)),
                weight,
            );
        }
        MethodEstimate::from_raw(method, raw, weight)
    }
}

#[async_trait]
impl CountSource for SimulatedSource {
    async fn collect(&self, at: DateTime<FixedOffset>) -> Result<DirectionEstimates> {
        let regime = TimeContext::from_datetime(&at).regime();
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("simulated source RNG poisoned"))?;

        let estimates = DirectionMap::from_fn(|direction| {
            let base = Self::base_count(Self::typical_load(regime, direction));
            let contour = (base + rng.gen_range(-2..=2)).max(0);
            let feature = (base / 2 + rng.gen_range(0..=3)).clamp(1, 10);
            let pattern = (base + rng.gen_range(-2..=3)).max(0);

            vec![
                self.sample(&mut rng, "contour", contour),
                self.sample(&mut rng, "feature", feature),
                self.sample(&mut rng, "pattern", pattern),
            ]
        });

        Ok(estimates)
    }
}
