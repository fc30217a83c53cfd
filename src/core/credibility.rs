use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{CredibilityLabel, Regime};
use crate::tracking::predictions::PredictionStats;

const DEFAULT_PRIOR: f64 = 0.55;
const MIN_SAMPLES: usize = 10;
const MIN_STRATEGY_SAMPLES: usize = 3;
const SUPPRESS_BELOW: f64 = 0.6;
const LIKELIHOOD_WEIGHT: f64 = 0.6;
const PRIOR_WEIGHT: f64 = 0.4;

/// Markers for strategies that trade against the prevailing move. Everything
/// else is treated as trend-following.
const REVERSAL_MARKERS: &[&str] = &["reversal", "sweep", "fade", "divergence", "judas", "trap"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosteriorCredibility {
    pub probability: f64,
    pub confidence: CredibilityLabel,
    pub is_suppressed: bool,
    pub sample_size: usize,
}

impl PosteriorCredibility {
    /// The conservative default used below the sample floor.
    pub fn default_prior(sample_size: usize) -> Self {
        Self {
            probability: DEFAULT_PRIOR,
            confidence: label_for(DEFAULT_PRIOR),
            is_suppressed: false,
            sample_size,
        }
    }
}

/// Blends a strategy's historical accuracy with a regime-conditioned
/// likelihood into a posterior reliability estimate. Production accuracy
/// arrives via prediction-tracker aggregates; the local override cache backs
/// bootstrap and tests.
#[derive(Default)]
pub struct CredibilityEngine {
    overrides: RwLock<HashMap<String, (u32, u32)>>,
}

impl CredibilityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local counter increment. Does not replace tracker aggregates.
    pub fn update_performance(&self, strategy: &str, is_win: bool) {
        let mut overrides = self.overrides.write().expect("credibility lock");
        let entry = overrides.entry(strategy.to_string()).or_insert((0, 0));
        if is_win {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    pub fn posterior(
        &self,
        symbol: &str,
        strategy: &str,
        regime: Regime,
        stats: Option<&PredictionStats>,
    ) -> PosteriorCredibility {
        let (total, overall, strategy_samples, strategy_accuracy) = match stats {
            Some(s) => {
                let bucket = s.by_strategy.get(strategy);
                (
                    s.evaluated,
                    s.overall_accuracy,
                    bucket.map_or(0, |b| b.samples),
                    bucket.map_or(0.0, |b| b.accuracy),
                )
            }
            None => self.override_view(strategy),
        };

        if total < MIN_SAMPLES {
            tracing::debug!(
                "{symbol}/{strategy}: {total} samples below floor, using default prior"
            );
            return PosteriorCredibility::default_prior(total);
        }

        let prior = if strategy_samples >= MIN_STRATEGY_SAMPLES {
            strategy_accuracy
        } else if total > 0 {
            overall
        } else {
            DEFAULT_PRIOR
        };

        let likelihood = likelihood_for(strategy, regime);
        let posterior = round4(LIKELIHOOD_WEIGHT * likelihood + PRIOR_WEIGHT * prior);

        PosteriorCredibility {
            probability: posterior,
            confidence: label_for(posterior),
            is_suppressed: posterior < SUPPRESS_BELOW,
            sample_size: total,
        }
    }

    fn override_view(&self, strategy: &str) -> (usize, f64, usize, f64) {
        let overrides = self.overrides.read().expect("credibility lock");
        let (total_wins, total) = overrides
            .values()
            .fold((0u32, 0u32), |(w, t), &(bw, bt)| (w + bw, t + bt));
        let overall = if total > 0 {
            total_wins as f64 / total as f64
        } else {
            0.0
        };
        let (s_wins, s_total) = overrides.get(strategy).copied().unwrap_or((0, 0));
        let s_acc = if s_total > 0 {
            s_wins as f64 / s_total as f64
        } else {
            0.0
        };
        (total as usize, overall, s_total as usize, s_acc)
    }
}

pub fn is_reversal_strategy(strategy: &str) -> bool {
    let lower = strategy.to_lowercase();
    REVERSAL_MARKERS.iter().any(|m| lower.contains(m))
}

/// Fixed regime likelihood table. Reversal strategies swap the
/// trending/ranging cells; volatile conditions discount both styles.
fn likelihood_for(strategy: &str, regime: Regime) -> f64 {
    let reversal = is_reversal_strategy(strategy);
    match (reversal, regime) {
        (false, Regime::Trending) => 0.80,
        (false, Regime::Ranging) => 0.40,
        (false, Regime::Volatile) => 0.40,
        (true, Regime::Trending) => 0.40,
        (true, Regime::Ranging) => 0.80,
        (true, Regime::Volatile) => 0.40,
    }
}

fn label_for(probability: f64) -> CredibilityLabel {
    if probability >= 0.8 {
        CredibilityLabel::Premium
    } else if probability >= 0.7 {
        CredibilityLabel::Strong
    } else {
        CredibilityLabel::Neutral
    }
}

fn round4(x: f64) -> f64 {
    (x * 10000.0).round() / 10000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn few_samples_returns_default_prior() {
        let engine = CredibilityEngine::new();
        for _ in 0..5 {
            engine.update_performance("breaker", true);
        }
        let cred = engine.posterior("BTC-USD", "breaker", Regime::Trending, None);
        assert!((cred.probability - 0.55).abs() < 1e-9);
        assert!(!cred.is_suppressed);
        assert_eq!(cred.sample_size, 5);
        assert_eq!(cred.confidence, CredibilityLabel::Neutral);
    }

    #[test]
    fn trend_strategy_in_trend_scores_premium() {
        let engine = CredibilityEngine::new();
        // 12 samples at 10/12 accuracy for a trend-following strategy
        for i in 0..12 {
            engine.update_performance("breaker", i < 10);
        }
        let cred = engine.posterior("BTC-USD", "breaker", Regime::Trending, None);
        // 0.6*0.80 + 0.4*(10/12) = 0.8133
        assert!((cred.probability - 0.8133).abs() < 1e-3);
        assert_eq!(cred.confidence, CredibilityLabel::Premium);
        assert!(!cred.is_suppressed);
    }

    #[test]
    fn trend_strategy_in_range_is_suppressed() {
        let engine = CredibilityEngine::new();
        for i in 0..12 {
            engine.update_performance("breaker", i < 8);
        }
        let cred = engine.posterior("BTC-USD", "breaker", Regime::Ranging, None);
        // 0.6*0.40 + 0.4*(8/12) = 0.5067 < 0.6
        assert!(cred.is_suppressed);
    }

    #[test]
    fn reversal_table_swaps_trend_and_range() {
        assert!((likelihood_for("liquidity_sweep", Regime::Ranging) - 0.80).abs() < 1e-9);
        assert!((likelihood_for("liquidity_sweep", Regime::Trending) - 0.40).abs() < 1e-9);
        assert!((likelihood_for("breaker", Regime::Trending) - 0.80).abs() < 1e-9);
        assert!((likelihood_for("breaker", Regime::Volatile) - 0.40).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_global_accuracy_below_strategy_floor() {
        let engine = CredibilityEngine::new();
        // 10 global samples, but only 2 for the queried strategy
        for _ in 0..8 {
            engine.update_performance("other", true);
        }
        engine.update_performance("fade_play", false);
        engine.update_performance("fade_play", false);

        let cred = engine.posterior("BTC-USD", "fade_play", Regime::Ranging, None);
        // global accuracy 8/10, likelihood 0.80: 0.6*0.8 + 0.4*0.8 = 0.80
        assert!((cred.probability - 0.80).abs() < 1e-9);
        assert_eq!(cred.sample_size, 10);
    }
}
