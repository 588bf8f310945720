pub mod estimates;
pub mod source;

pub use estimates::{DirectionEstimates, EstimatorFailure, MethodEstimate};
pub use source::{CountSource, SimulatedSource};

#[cfg(test)]
pub use source::MockCountSource;
