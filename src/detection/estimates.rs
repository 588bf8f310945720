use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::types::DirectionMap;

/// Why a single estimator produced no usable count.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum EstimatorFailure {
    #[error("estimator unavailable: {0}")]
    Unavailable(String),
    #[error("estimator returned an invalid count: {0}")]
    InvalidCount(i64),
    #[error("estimator weight {0} outside [0, 1]")]
    InvalidWeight(f64),
}

/// Output of one counting method for one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodEstimate {
    pub method: String,
    pub result: Result<u32, EstimatorFailure>,
    pub weight: f64,
}

impl MethodEstimate {
    pub fn counted(method: impl Into<String>, count: u32, weight: f64) -> Self {
        Self {
            method: method.into(),
            result: Ok(count),
            weight,
        }
    }

    pub fn failed(method: impl Into<String>, failure: EstimatorFailure, weight: f64) -> Self {
        Self {
            method: method.into(),
            result: Err(failure),
            weight,
        }
    }

    /// Raw counts from detectors that report signed values.
    pub fn from_raw(method: impl Into<String>, raw: i64, weight: f64) -> Self {
        match u32::try_from(raw) {
            Ok(count) => Self::counted(method, count, weight),
            Err(_) => Self::failed(method, EstimatorFailure::InvalidCount(raw), weight),
        }
    }

    /// The count and weight if this estimate can take part in fusion.
    pub fn usable(&self) -> Result<(u32, f64), EstimatorFailure> {
        let count = self.result.clone()?;
        if !self.weight.is_finite() || !(0.0..=1.0).contains(&self.weight) {
            return Err(EstimatorFailure::InvalidWeight(self.weight));
        }
        Ok((count, self.weight))
    }
}

/// All estimates for one cycle. An empty list means no input arrived for
/// that direction.
pub type DirectionEstimates = DirectionMap<Vec<MethodEstimate>>;
