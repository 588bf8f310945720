use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::{Direction, FusionSource, SignalMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrafficEvent {
    AnalysisCompleted {
        analysis_id: String,
        total_vehicles: u32,
        signal_states: SignalMap,
        timestamp: DateTime<FixedOffset>,
    },
    EmergencyActivated {
        analysis_id: String,
        released: Vec<Direction>,
        timestamp: DateTime<FixedOffset>,
    },
    EstimatorFallback {
        direction: Direction,
        source: FusionSource,
        substituted_count: u32,
    },
}

pub struct EventBus {
    sender: broadcast::Sender<TrafficEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: TrafficEvent) {
        // send only fails when nobody is subscribed
        if let Ok(receivers) = self.sender.send(event) {
            tracing::debug!("📡 Event published to {} receivers", receivers);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrafficEvent> {
        self.sender.subscribe()
    }
}
