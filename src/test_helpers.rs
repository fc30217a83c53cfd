use chrono::{DateTime, Duration, Utc};

use crate::models::{
    Bias, Candle, CandleSeries, Direction, EntryZone, MarketStateSnapshot, MtfState,
    SentimentState, Setup, Timeframe, TrendState, VolumeState,
};

pub fn test_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Create candles from (open, high, low, close) tuples with auto-incrementing
/// 1m timestamps.
pub fn make_candles(data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let base = test_time();
    let candles: Vec<Candle> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle {
            timestamp: base + Duration::minutes(i as i64),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect();
    CandleSeries::new(candles)
}

/// Create n rising (bullish) candles starting from `start` price.
pub fn make_bullish_trend(n: usize, start: f64) -> CandleSeries {
    let base = test_time();
    let candles: Vec<Candle> = (0..n)
        .map(|i| {
            let open = start + i as f64 * 10.0;
            let close = open + 8.0;
            Candle {
                timestamp: base + Duration::minutes(i as i64),
                open,
                high: close + 2.0,
                low: open - 1.0,
                close,
                volume: 100.0,
            }
        })
        .collect();
    CandleSeries::new(candles)
}

/// Create n falling (bearish) candles starting from `start` price.
pub fn make_bearish_trend(n: usize, start: f64) -> CandleSeries {
    let base = test_time();
    let candles: Vec<Candle> = (0..n)
        .map(|i| {
            let open = start - i as f64 * 10.0;
            let close = open - 8.0;
            Candle {
                timestamp: base + Duration::minutes(i as i64),
                open,
                high: open + 1.0,
                low: close - 2.0,
                close,
                volume: 100.0,
            }
        })
        .collect();
    CandleSeries::new(candles)
}

/// A bullish 1h setup around entry 100: stop 98, targets 104/108, R:R 4.
pub fn make_setup(direction: Direction) -> Setup {
    let (stop, targets) = match direction {
        Direction::Bullish => (98.0, vec![104.0, 108.0]),
        Direction::Bearish => (102.0, vec![96.0, 92.0]),
    };
    Setup {
        symbol: "BTC-USD".to_string(),
        timeframe: Timeframe::H1,
        direction,
        strategy: "breaker".to_string(),
        entry: EntryZone {
            optimal: 100.0,
            tolerance: 0.3,
        },
        stop,
        targets,
        risk_reward: 4.0,
        confidence: 0.7,
        edge_score: None,
        breakdown: None,
    }
}

/// Snapshot with the four golden-confluence families aligned to `bias`.
pub fn make_aligned_snapshot(bias: Bias) -> MarketStateSnapshot {
    let mut snap = MarketStateSnapshot::bare("BTC-USD", Timeframe::H1, test_time());
    snap.trend = Some(TrendState {
        direction: bias,
        strength: Some(0.8),
    });
    snap.mtf = Some(MtfState { global_bias: bias });
    snap.sentiment = Some(SentimentState {
        label: bias,
        confidence: None,
    });
    snap.volume = Some(VolumeState {
        is_institutional: true,
        participation: Some(0.7),
    });
    snap
}
