use anyhow::Result;
use serde::Deserialize;
use std::env;

use crate::analysis::GreenTimeBounds;
use crate::monitoring::DEFAULT_HISTORY_CAPACITY;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub history_capacity: usize,
    pub fallback_seed: Option<u64>,
    pub min_green_secs: u32,
    pub max_green_secs: u32,
    pub simulated_dropout_rate: f64,
}

impl AnalysisConfig {
    pub fn green_time_bounds(&self) -> GreenTimeBounds {
        GreenTimeBounds {
            min_secs: self.min_green_secs,
            max_secs: self.max_green_secs,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            fallback_seed: None,
            min_green_secs: 10,
            max_green_secs: 60,
            simulated_dropout_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub evaluation_interval_secs: u64,
    pub statistics_every: u64,
    pub event_bus_capacity: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            evaluation_interval_secs: 30,
            statistics_every: 10,
            event_bus_capacity: 256,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            analysis: AnalysisConfig {
                history_capacity: env::var("HISTORY_CAPACITY")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .unwrap_or(DEFAULT_HISTORY_CAPACITY),
                fallback_seed: env::var("FALLBACK_SEED")
                    .ok()
                    .and_then(|s| s.parse().ok()),
                min_green_secs: env::var("MIN_GREEN_TIME")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                max_green_secs: env::var("MAX_GREEN_TIME")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
                simulated_dropout_rate: env::var("SIMULATED_DROPOUT_RATE")
                    .unwrap_or_else(|_| "0.05".to_string())
                    .parse()
                    .unwrap_or(0.05),
            },
            monitoring: MonitoringConfig {
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                evaluation_interval_secs: env::var("EVALUATION_INTERVAL_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
                statistics_every: env::var("STATISTICS_EVERY")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                event_bus_capacity: env::var("EVENT_BUS_CAPACITY")
                    .unwrap_or_else(|_| "256".to_string())
                    .parse()
                    .unwrap_or(256),
            },
        })
    }
}
