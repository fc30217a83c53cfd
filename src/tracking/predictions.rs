use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::config::Config;
use crate::models::{Bias, Candle, Prediction, PredictionOutcome};
use crate::store::KvStore;

const LAST_OUTCOMES: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketAccuracy {
    pub samples: usize,
    pub hits: usize,
    pub accuracy: f64,
}

/// Windowed accuracy aggregates. Feeds the credibility engine's prior on the
/// next scoring cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionStats {
    pub symbol: String,
    /// Records considered (most recent first, bounded).
    pub window: usize,
    /// Terminal hit/fail records inside the window.
    pub evaluated: usize,
    pub hits: usize,
    pub fails: usize,
    pub expired: usize,
    pub pending: usize,
    /// hits / (hits + fails); expired calls are unresolved, not wrong.
    pub overall_accuracy: f64,
    pub by_edge: BTreeMap<String, BucketAccuracy>,
    pub by_strategy: BTreeMap<String, BucketAccuracy>,
    /// Chronological win/loss sequence of the last evaluated outcomes.
    pub last_10: Vec<bool>,
    pub computed_at: DateTime<Utc>,
}

impl PredictionStats {
    fn empty(symbol: &str, now: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            window: 0,
            evaluated: 0,
            hits: 0,
            fails: 0,
            expired: 0,
            pending: 0,
            overall_accuracy: 0.0,
            by_edge: BTreeMap::new(),
            by_strategy: BTreeMap::new(),
            last_10: Vec::new(),
            computed_at: now,
        }
    }
}

/// Persists published predictions, resolves them against later candles, and
/// aggregates historical accuracy. Terminal outcomes are write-once.
pub struct PredictionTracker {
    store: Arc<dyn KvStore>,
    cache: RwLock<HashMap<String, PredictionStats>>,
    batch: usize,
    window: usize,
    cache_ttl: Duration,
    /// When set, used instead of Utc::now() (tests/backfills).
    pub sim_time: Option<DateTime<Utc>>,
}

impl PredictionTracker {
    pub fn new(store: Arc<dyn KvStore>, cfg: &Config) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
            batch: cfg.prediction_batch,
            window: cfg.stats_window,
            cache_ttl: Duration::seconds(cfg.stats_cache_secs),
            sim_time: None,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.sim_time.unwrap_or_else(Utc::now)
    }

    fn key(symbol: &str, id: &str) -> String {
        format!("pred:{symbol}:{id}")
    }

    /// Persist a new pending prediction. Neutral-bias candidates carry no
    /// testable call and are skipped.
    pub fn track(&self, prediction: &Prediction) {
        if prediction.bias == Bias::Neutral {
            tracing::debug!("{}: neutral bias, not tracked", prediction.id);
            return;
        }

        let key = Self::key(&prediction.symbol, &prediction.id);
        match serde_json::to_value(prediction) {
            Ok(value) => {
                if let Err(e) = self.store.set(&key, value) {
                    tracing::warn!("failed to persist prediction {key}: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to encode prediction {key}: {e}"),
        }
    }

    pub fn get(&self, symbol: &str, id: &str) -> Option<Prediction> {
        self.store
            .get(&Self::key(symbol, id))
            .ok()
            .flatten()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Resolve pending predictions for a symbol against one candle. Returns
    /// the records that reached a terminal outcome in this pass.
    pub fn evaluate_pending(&self, symbol: &str, candle: &Candle) -> Vec<Prediction> {
        let entries = match self.store.query_prefix(&format!("pred:{symbol}:")) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("{symbol}: prediction load failed, skipping evaluation: {e}");
                return Vec::new();
            }
        };

        let now = self.now();
        let mut resolved = Vec::new();

        let pending = entries
            .into_iter()
            .filter_map(|(key, value)| {
                serde_json::from_value::<Prediction>(value)
                    .map_err(|e| tracing::warn!("skipping corrupt prediction {key}: {e}"))
                    .ok()
            })
            .filter(|p| p.outcome == PredictionOutcome::Pending)
            .take(self.batch);

        for mut prediction in pending {
            let verdict = resolve(&prediction, candle, now);
            let (outcome, reason) = match verdict {
                Some(v) => v,
                None => continue,
            };

            // Idempotence guard: never overwrite a terminal outcome that
            // landed since the batch was read.
            if let Some(stored) = self.get(symbol, &prediction.id) {
                if stored.outcome.is_terminal() {
                    continue;
                }
            }

            prediction.outcome = outcome;
            prediction.evaluated_at = Some(now);
            prediction.reason = Some(reason);

            match serde_json::to_value(&prediction) {
                Ok(value) => {
                    let key = Self::key(symbol, &prediction.id);
                    if let Err(e) = self.store.set(&key, value) {
                        tracing::warn!("failed to persist outcome for {key}: {e}");
                        continue;
                    }
                    tracing::info!(
                        "{}: {} -> {}",
                        symbol,
                        prediction.id,
                        prediction.outcome
                    );
                    resolved.push(prediction);
                }
                Err(e) => tracing::warn!("failed to encode outcome for {}: {e}", prediction.id),
            }
        }

        if !resolved.is_empty() {
            self.cache.write().expect("stats cache lock").remove(symbol);
        }
        resolved
    }

    /// Windowed accuracy aggregates, cached for a few minutes per symbol.
    pub fn stats(&self, symbol: &str) -> PredictionStats {
        let now = self.now();
        {
            let cache = self.cache.read().expect("stats cache lock");
            if let Some(stats) = cache.get(symbol) {
                if now - stats.computed_at < self.cache_ttl {
                    return stats.clone();
                }
            }
        }

        let stats = self.compute_stats(symbol, now);
        self.cache
            .write()
            .expect("stats cache lock")
            .insert(symbol.to_string(), stats.clone());
        stats
    }

    fn compute_stats(&self, symbol: &str, now: DateTime<Utc>) -> PredictionStats {
        let entries = match self.store.query_prefix(&format!("pred:{symbol}:")) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("{symbol}: stats unavailable: {e}");
                return PredictionStats::empty(symbol, now);
            }
        };

        let mut records: Vec<Prediction> = entries
            .into_iter()
            .filter_map(|(_, v)| serde_json::from_value(v).ok())
            .collect();
        records.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        records.truncate(self.window);

        let mut stats = PredictionStats::empty(symbol, now);
        stats.window = records.len();

        for record in &records {
            match record.outcome {
                PredictionOutcome::Hit => stats.hits += 1,
                PredictionOutcome::Fail => stats.fails += 1,
                PredictionOutcome::Expired => stats.expired += 1,
                PredictionOutcome::Pending => stats.pending += 1,
            }
            if matches!(
                record.outcome,
                PredictionOutcome::Hit | PredictionOutcome::Fail
            ) {
                let hit = record.outcome == PredictionOutcome::Hit;
                bump(
                    stats.by_edge.entry(record.edge_label.to_string()).or_default(),
                    hit,
                );
                bump(
                    stats
                        .by_strategy
                        .entry(record.strategy.clone())
                        .or_default(),
                    hit,
                );
            }
        }

        stats.evaluated = stats.hits + stats.fails;
        if stats.evaluated > 0 {
            stats.overall_accuracy = round4(stats.hits as f64 / stats.evaluated as f64);
        }

        // Chronological tail of evaluated outcomes
        let mut evaluated: Vec<&Prediction> = records
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    PredictionOutcome::Hit | PredictionOutcome::Fail
                )
            })
            .collect();
        evaluated.sort_by_key(|r| r.evaluated_at);
        stats.last_10 = evaluated
            .iter()
            .rev()
            .take(LAST_OUTCOMES)
            .rev()
            .map(|r| r.outcome == PredictionOutcome::Hit)
            .collect();

        stats
    }
}

fn bump(bucket: &mut BucketAccuracy, hit: bool) {
    bucket.samples += 1;
    if hit {
        bucket.hits += 1;
    }
    bucket.accuracy = round4(bucket.hits as f64 / bucket.samples as f64);
}

/// Expiry first, then invalidation, then target. No verdict leaves the
/// record pending.
fn resolve(
    prediction: &Prediction,
    candle: &Candle,
    now: DateTime<Utc>,
) -> Option<(PredictionOutcome, String)> {
    if now > prediction.expires_at {
        return Some((
            PredictionOutcome::Expired,
            format!("expired at {}", prediction.expires_at.to_rfc3339()),
        ));
    }

    match prediction.bias {
        Bias::Bullish => {
            if candle.low <= prediction.invalidation_price {
                Some((
                    PredictionOutcome::Fail,
                    format!("low {:.2} crossed invalidation {:.2}", candle.low, prediction.invalidation_price),
                ))
            } else if candle.high >= prediction.target_price {
                Some((
                    PredictionOutcome::Hit,
                    format!("high {:.2} reached target {:.2}", candle.high, prediction.target_price),
                ))
            } else {
                None
            }
        }
        Bias::Bearish => {
            if candle.high >= prediction.invalidation_price {
                Some((
                    PredictionOutcome::Fail,
                    format!("high {:.2} crossed invalidation {:.2}", candle.high, prediction.invalidation_price),
                ))
            } else if candle.low <= prediction.target_price {
                Some((
                    PredictionOutcome::Hit,
                    format!("low {:.2} reached target {:.2}", candle.low, prediction.target_price),
                ))
            } else {
                None
            }
        }
        Bias::Neutral => None,
    }
}

fn round4(x: f64) -> f64 {
    (x * 10000.0).round() / 10000.0
}
