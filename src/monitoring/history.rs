use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::analysis::AnalysisRecord;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficStatistics {
    pub total_analyses: usize,
    pub average_vehicles: f64,
    pub min_vehicles: u32,
    pub max_vehicles: u32,
    pub emergency_mode_count: usize,
}

/// Fixed-capacity FIFO of completed analyses. The oldest record is evicted
/// once capacity is reached.
#[derive(Clone)]
pub struct AnalysisHistory {
    records: Arc<RwLock<VecDeque<Arc<AnalysisRecord>>>>,
    capacity: usize,
}

impl AnalysisHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn push(&self, record: AnalysisRecord) -> Arc<AnalysisRecord> {
        let record = Arc::new(record);
        let mut records = self.records.write().await;

        while records.len() >= self.capacity {
            if let Some(evicted) = records.pop_front() {
                tracing::debug!("🗑️  Evicted analysis {} from history", evicted.analysis_id);
            }
        }
        records.push_back(record.clone());

        record
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn latest(&self) -> Option<Arc<AnalysisRecord>> {
        self.records.read().await.back().cloned()
    }

    /// Up to `limit` most recent records, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<Arc<AnalysisRecord>> {
        let records = self.records.read().await;
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    pub async fn snapshot(&self) -> Vec<Arc<AnalysisRecord>> {
        self.records.read().await.iter().cloned().collect()
    }

    /// Rolling statistics over everything retained, computed under one read
    /// lock so a concurrent eviction cannot interleave.
    pub async fn statistics(&self) -> Option<TrafficStatistics> {
        let records = self.records.read().await;
        if records.is_empty() {
            return None;
        }

        let totals: Vec<u32> = records.iter().map(|r| r.total_vehicles).collect();
        let sum: u64 = totals.iter().map(|t| *t as u64).sum();

        Some(TrafficStatistics {
            total_analyses: records.len(),
            average_vehicles: sum as f64 / totals.len() as f64,
            min_vehicles: totals.iter().copied().min().unwrap_or(0),
            max_vehicles: totals.iter().copied().max().unwrap_or(0),
            emergency_mode_count: records.iter().filter(|r| r.emergency_mode).count(),
        })
    }
}

impl Default for AnalysisHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisPipeline, TimeContext};
    use crate::detection::{DirectionEstimates, MethodEstimate};
    use crate::analysis::DirectionMap;
    use chrono::{FixedOffset, TimeZone};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn record(total_per_direction: u32) -> AnalysisRecord {
        let at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 7, 12, 0, 0)
            .unwrap();
        let estimates: DirectionEstimates = DirectionMap::splat(vec![MethodEstimate::counted(
            "contour",
            total_per_direction,
            0.5,
        )]);
        let eval = AnalysisPipeline::default().evaluate(
            &estimates,
            &TimeContext::from_datetime(&at),
            None,
            &mut ChaCha8Rng::seed_from_u64(0),
        );
        AnalysisRecord::from_evaluation(eval, at)
    }

    #[tokio::test]
    async fn test_empty_history() {
        let history = AnalysisHistory::default();
        assert!(history.is_empty().await);
        assert!(history.statistics().await.is_none());
        assert!(history.latest().await.is_none());
    }

    #[tokio::test]
    async fn test_eviction_keeps_capacity() {
        let history = AnalysisHistory::new(3);
        for n in 1..=5 {
            history.push(record(n)).await;
        }
        let totals: Vec<u32> = history
            .snapshot()
            .await
            .iter()
            .map(|r| r.total_vehicles)
            .collect();
        assert_eq!(totals, vec![12, 16, 20]);
    }

    #[tokio::test]
    async fn test_recent_limit() {
        let history = AnalysisHistory::new(10);
        for n in 1..=4 {
            history.push(record(n)).await;
        }
        let recent = history.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].total_vehicles, 12);
        assert_eq!(recent[1].total_vehicles, 16);
        assert_eq!(history.recent(50).await.len(), 4);
    }

    #[tokio::test]
    async fn test_statistics() {
        let history = AnalysisHistory::new(10);
        history.push(record(1)).await;
        history.push(record(3)).await;
        history.push(record(20)).await;

        let stats = history.statistics().await.unwrap();
        assert_eq!(stats.total_analyses, 3);
        assert_eq!(stats.min_vehicles, 4);
        assert_eq!(stats.max_vehicles, 80);
        assert_eq!(stats.average_vehicles, 32.0);
        // four very_high approaches
        assert_eq!(stats.emergency_mode_count, 1);
    }
}
