pub mod confluence;
pub mod edge;

pub use confluence::{ConfluenceValidator, TimeframeResult};
pub use edge::EdgeScorer;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use crate::config::Config;
use crate::core::credibility::{CredibilityEngine, PosteriorCredibility};
use crate::core::performance::PerformanceTracker;
use crate::core::risk_sim::{RiskSimulator, SimulationResult};
use crate::feeds::ShockFeed;
use crate::models::{
    EdgeLabel, MarketStateSnapshot, Prediction, PredictionOutcome, Regime, Setup, Signal,
    Timeframe,
};
use crate::store::KvStore;
use crate::tracking::predictions::PredictionTracker;

/// One timeframe's raw scan input: detector setups plus the analytics
/// snapshot, with the ATR the risk simulator walks on.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScanInput {
    pub timeframe: Timeframe,
    pub snapshot: MarketStateSnapshot,
    #[serde(default)]
    pub setups: Vec<Setup>,
    #[serde(default)]
    pub atr: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ScoredSetup {
    pub setup: Setup,
    pub credibility: PosteriorCredibility,
    pub simulation: Option<SimulationResult>,
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub scored: Vec<ScoredSetup>,
    pub signal: Option<Signal>,
}

/// End-to-end scan for one symbol: score every setup, annotate risk, drop
/// suppressed strategies, gate the survivors through confluence, and publish
/// predictions for the adaptive loop.
pub struct ScanPipeline {
    pub scorer: EdgeScorer,
    pub validator: ConfluenceValidator,
    pub credibility: CredibilityEngine,
    pub risk: RiskSimulator,
    pub performance: Arc<PerformanceTracker>,
    pub predictions: Arc<PredictionTracker>,
    prediction_ttl_bars: u32,
    /// Fixed seed for reproducible risk simulations (tests/replays).
    pub sim_seed: Option<u64>,
    /// When set, used instead of Utc::now() (tests/backfills).
    pub sim_time: Option<DateTime<Utc>>,
}

impl ScanPipeline {
    pub fn new(cfg: &Config, store: Arc<dyn KvStore>) -> Self {
        Self {
            scorer: EdgeScorer::new(),
            validator: ConfluenceValidator::new(cfg),
            credibility: CredibilityEngine::new(),
            risk: RiskSimulator::new(cfg.sim_iterations),
            performance: Arc::new(PerformanceTracker::new(store.clone())),
            predictions: Arc::new(PredictionTracker::new(store, cfg)),
            prediction_ttl_bars: cfg.prediction_ttl_bars,
            sim_seed: None,
            sim_time: None,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.sim_time.unwrap_or_else(Utc::now)
    }

    pub async fn scan_symbol(
        &self,
        symbol: &str,
        inputs: Vec<ScanInput>,
        shocks: &dyn ShockFeed,
    ) -> ScanOutcome {
        let stats = self.predictions.stats(symbol);
        let now = self.now();
        let mut rng = match self.sim_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut scored = Vec::new();
        let mut timeframe_results = Vec::new();

        for input in inputs {
            let mut surviving = Vec::new();

            for (idx, mut setup) in input.setups.into_iter().enumerate() {
                let regime = input.snapshot.regime.unwrap_or(Regime::Ranging);
                let credibility = self.credibility.posterior(
                    symbol,
                    &setup.strategy,
                    regime,
                    Some(&stats),
                );

                let breakdown = self.scorer.calculate(
                    Some(&setup),
                    Some(&input.snapshot),
                    &credibility,
                    &self.performance,
                );
                setup.edge_score = Some(breakdown.score);
                setup.breakdown = Some(breakdown);

                let simulation = input
                    .atr
                    .map(|atr| self.risk.run(&setup, atr, &mut rng));

                if credibility.is_suppressed {
                    tracing::debug!(
                        "{symbol} {} {}: suppressed at {:.2} credibility",
                        setup.timeframe,
                        setup.strategy,
                        credibility.probability
                    );
                } else {
                    self.predictions.track(&self.publish(&setup, idx, now));
                    surviving.push(setup.clone());
                }

                scored.push(ScoredSetup {
                    setup,
                    credibility,
                    simulation,
                });
            }

            timeframe_results.push(TimeframeResult {
                timeframe: input.timeframe,
                snapshot: input.snapshot,
                setups: surviving,
            });
        }

        let signal = self
            .validator
            .validate(symbol, &timeframe_results, shocks)
            .await;

        ScanOutcome { scored, signal }
    }

    /// Feed resolved predictions back into the adaptive weights. Expired
    /// records are unresolved and carry no lesson.
    pub fn apply_outcomes(&self, resolved: &[Prediction]) {
        for prediction in resolved {
            let is_win = match prediction.outcome {
                PredictionOutcome::Hit => true,
                PredictionOutcome::Fail => false,
                PredictionOutcome::Expired | PredictionOutcome::Pending => continue,
            };
            let r_multiple = if is_win {
                reward_multiple(prediction)
            } else {
                -1.0
            };
            self.performance
                .record_outcome(&prediction.strategy, is_win, r_multiple);
            self.credibility
                .update_performance(&prediction.strategy, is_win);
        }
    }

    fn publish(&self, setup: &Setup, idx: usize, now: DateTime<Utc>) -> Prediction {
        let score = setup.edge_score.unwrap_or(0.0);
        let ttl = Duration::seconds(
            setup.timeframe.as_seconds() as i64 * i64::from(self.prediction_ttl_bars),
        );
        Prediction {
            id: format!(
                "{}-{}-{}-{}-{}",
                setup.symbol,
                setup.timeframe,
                setup.strategy,
                now.timestamp(),
                idx
            ),
            symbol: setup.symbol.clone(),
            bias: setup.direction.as_bias(),
            target_price: setup.first_target().unwrap_or(setup.entry.optimal),
            invalidation_price: setup.stop,
            published_at: now,
            expires_at: now + ttl,
            strategy: setup.strategy.clone(),
            edge_label: EdgeLabel::from_score(score),
            snapshot_price: setup.entry.optimal,
            outcome: PredictionOutcome::Pending,
            evaluated_at: None,
            reason: None,
        }
    }
}

fn reward_multiple(prediction: &Prediction) -> f64 {
    let risk = (prediction.snapshot_price - prediction.invalidation_price).abs();
    if risk <= 0.0 {
        return 0.0;
    }
    (prediction.target_price - prediction.snapshot_price).abs() / risk
}
