mod common;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

use confluence_engine::config::Config;
use confluence_engine::feeds::{QuietShockFeed, ShockFeed};
use confluence_engine::models::{
    Bias, Candle, Direction, NewsShock, PredictionOutcome, ShockSeverity, SignalStatus, Timeframe,
};
use confluence_engine::scoring::{ScanInput, ScanPipeline};
use confluence_engine::store::{KvStore, MemoryStore};
use confluence_engine::tracking::SignalLifecycleManager;

use common::{make_aligned_snapshot, make_bullish_trend, make_setup, test_time};

struct ShockedFeed;

#[async_trait]
impl ShockFeed for ShockedFeed {
    async fn active_shock(&self, _symbol: &str) -> Result<Option<NewsShock>> {
        Ok(Some(NewsShock {
            severity: ShockSeverity::High,
            message: "NFP release".to_string(),
        }))
    }
}

fn bullish_scan() -> Vec<ScanInput> {
    [
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
    ]
    .into_iter()
    .map(|tf| ScanInput {
        timeframe: tf,
        snapshot: make_aligned_snapshot(tf, Bias::Bullish),
        setups: vec![make_setup(tf, Direction::Bullish)],
        atr: Some(1.5),
    })
    .collect()
}

fn pipeline(store: Arc<dyn KvStore>) -> ScanPipeline {
    let mut pipeline = ScanPipeline::new(&Config::from_env(), store);
    pipeline.sim_seed = Some(42);
    pipeline
}

#[tokio::test]
async fn full_scan_scores_publishes_and_signals() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store.clone());

    let outcome = pipeline
        .scan_symbol("BTC-USD", bullish_scan(), &QuietShockFeed)
        .await;

    // Every setup scored, in range, with audit lines and risk annotation
    assert_eq!(outcome.scored.len(), 5);
    for scored in &outcome.scored {
        let score = scored.setup.edge_score.expect("edge score attached");
        assert!((0.0..=10.0).contains(&score));
        let breakdown = scored.setup.breakdown.as_ref().expect("breakdown attached");
        assert!(!breakdown.positives.is_empty());
        let sim = scored.simulation.as_ref().expect("risk annotation");
        let sum = sim.ruin_probability + sim.success_probability + sim.neutral_probability;
        assert!((sum - 100.0).abs() < 0.11);
    }

    // Aligned golden-confluence scan must clear the gate
    let signal = outcome.signal.expect("confluence signal");
    assert_eq!(signal.direction, Direction::Bullish);
    assert_eq!(signal.status, SignalStatus::Active);
    assert!(signal.confluence_score >= 75.0);
    assert_eq!(signal.timeframes.len(), 5);

    // Non-suppressed setups were published as pending predictions
    let published = store.query_prefix("pred:BTC-USD:").unwrap();
    assert_eq!(published.len(), 5);
}

#[tokio::test]
async fn high_severity_shock_blocks_publication() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store);

    // Weaken the scan so the -40 shock penalty decides the outcome
    let mut scan = bullish_scan();
    for input in &mut scan {
        input.snapshot.volume = None;
        input.snapshot.sentiment = None;
    }

    let baseline = pipeline
        .scan_symbol("BTC-USD", scan.clone(), &QuietShockFeed)
        .await;
    assert!(baseline.signal.is_some(), "baseline should pass the gate");

    let shocked = pipeline.scan_symbol("BTC-USD", scan, &ShockedFeed).await;
    assert!(shocked.signal.is_none(), "news shock should gate the signal");
}

#[tokio::test]
async fn lifecycle_manages_emitted_signal() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store);
    let mut signal = pipeline
        .scan_symbol("BTC-USD", bullish_scan(), &QuietShockFeed)
        .await
        .signal
        .expect("signal");

    let manager = SignalLifecycleManager::new();

    // First target (104) reached
    manager.update_status(&mut signal, 104.5, &make_bullish_trend(30, 100.0));
    assert_eq!(signal.status, SignalStatus::HitTp(1));

    // Deep in profit: trailing stop engages and only ever tightens
    manager.update_status(&mut signal, 380.0, &make_bullish_trend(30, 100.0));
    let trailed = signal.trailing_stop.expect("trailing stop");
    assert!(trailed > signal.stop);

    // Price collapses through the trailed stop: terminal, never resurrected
    manager.update_status(&mut signal, trailed - 1.0, &make_bullish_trend(30, 100.0));
    assert_eq!(signal.status, SignalStatus::StoppedOut);
    manager.update_status(&mut signal, 500.0, &make_bullish_trend(30, 100.0));
    assert_eq!(signal.status, SignalStatus::StoppedOut);
}

#[tokio::test]
async fn outcomes_close_the_adaptive_loop() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store.clone());

    pipeline
        .scan_symbol("BTC-USD", bullish_scan(), &QuietShockFeed)
        .await;

    // A candle through every target resolves all pending predictions as hits
    let winning_candle = Candle {
        timestamp: test_time() + Duration::hours(2),
        open: 100.0,
        high: 112.0,
        low: 99.5,
        close: 111.0,
        volume: 100.0,
    };
    let resolved = pipeline
        .predictions
        .evaluate_pending("BTC-USD", &winning_candle);
    assert_eq!(resolved.len(), 5);
    assert!(resolved
        .iter()
        .all(|p| p.outcome == PredictionOutcome::Hit));

    // Terminal outcomes are idempotent on re-evaluation
    let again = pipeline
        .predictions
        .evaluate_pending("BTC-USD", &winning_candle);
    assert!(again.is_empty());

    // Feed the wins back: streak builds, dynamic weight rises
    pipeline.apply_outcomes(&resolved);
    let weight = pipeline.performance.dynamic_weight("breaker");
    assert!(
        weight > 1.0,
        "five straight wins should lift the weight, got {weight}"
    );

    // Aggregates now feed the credibility prior on the next cycle
    let stats = pipeline.predictions.stats("BTC-USD");
    assert_eq!(stats.hits, 5);
    assert!((stats.overall_accuracy - 1.0).abs() < 1e-9);
    assert_eq!(stats.last_10, vec![true; 5]);
}
