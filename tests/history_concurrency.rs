use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use std::sync::Arc;

use traffic_signal_ai::analysis::DirectionMap;
use traffic_signal_ai::core::AnalysisConfig;
use traffic_signal_ai::detection::{DirectionEstimates, MethodEstimate};
use traffic_signal_ai::monitoring::EventBus;
use traffic_signal_ai::service::TrafficAnalyzer;

fn base_time() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 6, 4, 11, 0, 0)
        .unwrap()
}

fn uniform(count: u32) -> DirectionEstimates {
    DirectionMap::splat(vec![MethodEstimate::counted("contour", count, 0.5)])
}

fn analyzer(capacity: usize) -> TrafficAnalyzer {
    let config = AnalysisConfig {
        history_capacity: capacity,
        fallback_seed: Some(17),
        ..AnalysisConfig::default()
    };
    TrafficAnalyzer::new(&config, Arc::new(EventBus::new(64)))
}

#[tokio::test]
async fn history_keeps_most_recent_hundred_in_order() {
    let analyzer = analyzer(100);
    let start = base_time();

    for i in 0..105 {
        analyzer
            .analyze(uniform(1), start + Duration::seconds(i))
            .await;
    }

    let records = analyzer.history().snapshot().await;
    assert_eq!(records.len(), 100);
    for (offset, record) in records.iter().enumerate() {
        assert_eq!(record.timestamp, start + Duration::seconds(offset as i64 + 5));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cycles_respect_capacity() {
    let analyzer = Arc::new(analyzer(50));
    let start = base_time();

    let mut handles = Vec::new();
    for i in 0..200u32 {
        let analyzer = analyzer.clone();
        handles.push(tokio::spawn(async move {
            analyzer
                .analyze(uniform(i % 20), start + Duration::seconds(i as i64))
                .await
        }));
    }

    let stats_reader = {
        let analyzer = analyzer.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                if let Some(stats) = analyzer.statistics().await {
                    assert!(stats.total_analyses <= 50);
                    assert!(stats.min_vehicles <= stats.max_vehicles);
                    assert!(stats.average_vehicles <= stats.max_vehicles as f64);
                }
                tokio::task::yield_now().await;
            }
        })
    };

    for handle in handles {
        handle.await.unwrap();
    }
    stats_reader.await.unwrap();

    assert_eq!(analyzer.history().len().await, 50);
    assert_eq!(analyzer.metrics().get_analyses_completed(), 200);
}

#[tokio::test]
async fn statistics_cover_retained_records() {
    let analyzer = analyzer(100);
    let start = base_time();

    analyzer.analyze(uniform(2), start).await;
    analyzer.analyze(uniform(5), start + Duration::seconds(1)).await;
    analyzer.analyze(uniform(20), start + Duration::seconds(2)).await;

    let stats = analyzer.statistics().await.unwrap();
    assert_eq!(stats.total_analyses, 3);
    assert_eq!(stats.min_vehicles, 8);
    assert_eq!(stats.max_vehicles, 80);
    assert_eq!(stats.emergency_mode_count, 1);

    let recent = analyzer.history().recent(2).await;
    assert_eq!(recent[0].total_vehicles, 20);
    assert_eq!(recent[1].total_vehicles, 80);
}
