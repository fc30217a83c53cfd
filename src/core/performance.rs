use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::store::KvStore;

const RECENT_WINDOW: usize = 20;
const MIN_WINRATE_SAMPLES: usize = 10;
const HOT_STREAK: i32 = 3;
const WEIGHT_FLOOR: f64 = 0.5;
const WEIGHT_CEILING: f64 = 1.5;

/// Cumulative win/loss state for one strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub strategy: String,
    pub wins: u32,
    pub losses: u32,
    /// Signed streak: +n consecutive wins, -n consecutive losses.
    pub streak: i32,
    /// Last 20 outcomes, oldest first.
    pub recent: VecDeque<bool>,
    pub recent_win_rate: f64,
    pub total_r: f64,
    pub last_updated: DateTime<Utc>,
}

impl PerformanceRecord {
    fn fresh(strategy: &str, now: DateTime<Utc>) -> Self {
        Self {
            strategy: strategy.to_string(),
            wins: 0,
            losses: 0,
            streak: 0,
            recent: VecDeque::with_capacity(RECENT_WINDOW),
            recent_win_rate: 0.5,
            total_r: 0.0,
            last_updated: now,
        }
    }
}

/// Tracks realized outcomes per strategy and derives a bounded weight
/// multiplier the edge scorer reads on every evaluation.
pub struct PerformanceTracker {
    records: RwLock<HashMap<String, PerformanceRecord>>,
    store: Arc<dyn KvStore>,
    /// When set, used instead of Utc::now() for timestamps (tests/backfills).
    pub sim_time: Option<DateTime<Utc>>,
}

impl PerformanceTracker {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let tracker = Self {
            records: RwLock::new(HashMap::new()),
            store,
            sim_time: None,
        };
        tracker.load();
        tracker
    }

    fn now(&self) -> DateTime<Utc> {
        self.sim_time.unwrap_or_else(Utc::now)
    }

    fn load(&self) {
        let loaded = match self.store.query_prefix("perf:") {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("performance records unavailable, starting empty: {e}");
                return;
            }
        };

        let mut records = self.records.write().expect("performance lock");
        for (key, value) in loaded {
            match serde_json::from_value::<PerformanceRecord>(value) {
                Ok(record) => {
                    records.insert(record.strategy.clone(), record);
                }
                Err(e) => tracing::warn!("skipping corrupt performance record {key}: {e}"),
            }
        }
        tracing::debug!("loaded {} performance records", records.len());
    }

    /// Record a realized outcome. Creates the strategy record on first use.
    pub fn record_outcome(&self, strategy: &str, is_win: bool, r_multiple: f64) {
        let now = self.now();
        let snapshot = {
            let mut records = self.records.write().expect("performance lock");
            let record = records
                .entry(strategy.to_string())
                .or_insert_with(|| PerformanceRecord::fresh(strategy, now));

            if is_win {
                record.wins += 1;
                record.streak = if record.streak >= 0 { record.streak + 1 } else { 1 };
            } else {
                record.losses += 1;
                record.streak = if record.streak <= 0 { record.streak - 1 } else { -1 };
            }

            if record.recent.len() == RECENT_WINDOW {
                record.recent.pop_front();
            }
            record.recent.push_back(is_win);
            let window_wins = record.recent.iter().filter(|&&w| w).count();
            record.recent_win_rate = round4(window_wins as f64 / record.recent.len() as f64);
            record.total_r += r_multiple;
            record.last_updated = now;
            record.clone()
        };

        match serde_json::to_value(&snapshot) {
            Ok(value) => {
                if let Err(e) = self.store.set(&format!("perf:{strategy}"), value) {
                    tracing::warn!("failed to persist performance record for {strategy}: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to encode performance record for {strategy}: {e}"),
        }
    }

    /// Bounded weight multiplier in [0.5, 1.5]. Read-only: an unknown
    /// strategy reports the neutral 1.0 without creating a record.
    pub fn dynamic_weight(&self, strategy: &str) -> f64 {
        let records = self.records.read().expect("performance lock");
        let record = match records.get(strategy) {
            Some(r) => r,
            None => return 1.0,
        };

        let mut weight: f64 = 1.0;
        if record.streak >= HOT_STREAK {
            weight += 0.2;
        } else if record.streak <= -HOT_STREAK {
            weight -= 0.2;
        }

        if record.recent.len() >= MIN_WINRATE_SAMPLES {
            if record.recent_win_rate > 0.6 {
                weight += 0.2;
            } else if record.recent_win_rate < 0.4 {
                weight -= 0.2;
            }
        }

        weight.clamp(WEIGHT_FLOOR, WEIGHT_CEILING)
    }

    pub fn record(&self, strategy: &str) -> Option<PerformanceRecord> {
        self.records
            .read()
            .expect("performance lock")
            .get(strategy)
            .cloned()
    }
}

fn round4(x: f64) -> f64 {
    (x * 10000.0).round() / 10000.0
}
