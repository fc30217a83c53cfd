use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedConfig = Arc<RwLock<Config>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Confluence gate
    pub min_confluence_timeframes: usize,
    pub min_confluence_score: f64,
    /// Entry zones within this fraction of each other cluster together.
    pub cluster_tolerance: f64,
    /// Signal expiry horizon in bars of the signal's timeframe.
    pub signal_ttl_bars: u32,

    // Risk simulation
    pub sim_iterations: usize,

    // Prediction tracking
    pub prediction_batch: usize,
    pub stats_window: usize,
    pub stats_cache_secs: i64,
    /// Prediction expiry horizon in bars of the setup's timeframe.
    pub prediction_ttl_bars: u32,

    // Persistence
    pub store_path: String,

    // Logging
    pub log_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        Config {
            min_confluence_timeframes: env("MIN_CONFLUENCE_TFS", "4").parse().unwrap_or(4),
            min_confluence_score: env("MIN_CONFLUENCE_SCORE", "75").parse().unwrap_or(75.0),
            cluster_tolerance: env("CLUSTER_TOLERANCE", "0.005").parse().unwrap_or(0.005),
            signal_ttl_bars: env("SIGNAL_TTL_BARS", "24").parse().unwrap_or(24),
            sim_iterations: env("SIM_ITERATIONS", "1000").parse().unwrap_or(1000),
            prediction_batch: env("PREDICTION_BATCH", "100").parse().unwrap_or(100),
            stats_window: env("STATS_WINDOW", "100").parse().unwrap_or(100),
            stats_cache_secs: env("STATS_CACHE_SECS", "300").parse().unwrap_or(300),
            prediction_ttl_bars: env("PREDICTION_TTL_BARS", "48").parse().unwrap_or(48),
            store_path: env("STORE_PATH", "data/pipeline_state.json"),
            log_dir: env("LOG_DIR", "logs"),
            log_level: env("LOG_LEVEL", "INFO"),
        }
    }

    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
