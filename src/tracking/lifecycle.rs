use chrono::{DateTime, Utc};

use crate::models::{calc_atr, CandleSeries, Direction, Signal, SignalStatus};

const ATR_PERIOD: usize = 14;
const TRAIL_ATR_MULT: f64 = 2.5;
const MIN_CANDLES_FOR_MANAGEMENT: usize = 20;
const SWING_LOOKBACK: usize = 2;
const VOLUME_CLIMAX_MULT: f64 = 2.5;
const REJECTION_WICK_MULT: f64 = 1.5;
const MIN_PROFIT_ATR_MULT: f64 = 2.0;

/// Advances a published signal's status as new bars arrive: hard
/// invalidation first, then target progression, then trailing-stop and
/// partial-take-profit advisories.
pub struct SignalLifecycleManager {
    /// When set, used instead of Utc::now() (tests/backfills).
    pub sim_time: Option<DateTime<Utc>>,
}

impl SignalLifecycleManager {
    pub fn new() -> Self {
        Self { sim_time: None }
    }

    fn now(&self) -> DateTime<Utc> {
        self.sim_time.unwrap_or_else(Utc::now)
    }

    pub fn update_status(&self, signal: &mut Signal, current_price: f64, candles: &CandleSeries) {
        if signal.status.is_terminal() {
            return;
        }

        // Hard invalidation against the effective (trailing-aware) stop
        let stop = signal.effective_stop();
        let stopped = match signal.direction {
            Direction::Bullish => current_price <= stop,
            Direction::Bearish => current_price >= stop,
        };
        if stopped {
            signal.status = SignalStatus::StoppedOut;
            signal
                .management_updates
                .push(format!("Stopped out at {:.2} (stop {:.2})", current_price, stop));
            tracing::info!("{}: stopped out at {:.2}", signal.id, current_price);
            return;
        }

        if self.now() > signal.expires_at {
            signal.status = SignalStatus::Expired;
            signal
                .management_updates
                .push(format!("Expired at {}", signal.expires_at.to_rfc3339()));
            tracing::info!("{}: expired", signal.id);
            return;
        }

        self.advance_targets(signal, current_price);

        if candles.len() >= MIN_CANDLES_FOR_MANAGEMENT {
            let atr = calc_atr(candles, ATR_PERIOD);
            self.trail_stop(signal, current_price, candles, atr);
            self.advise_partial_tp(signal, current_price, candles, atr);
        }
    }

    fn advance_targets(&self, signal: &mut Signal, current_price: f64) {
        let mut highest_hit = None;
        for (i, &target) in signal.targets.iter().enumerate() {
            let reached = match signal.direction {
                Direction::Bullish => current_price >= target,
                Direction::Bearish => current_price <= target,
            };
            if reached {
                highest_hit = Some(i + 1);
            }
        }

        if let Some(n) = highest_hit {
            let already = match signal.status {
                SignalStatus::HitTp(m) => m >= n,
                _ => false,
            };
            if !already {
                signal.status = SignalStatus::HitTp(n);
                signal
                    .management_updates
                    .push(format!("Target {} reached at {:.2}", n, current_price));
                tracing::info!("{}: TP{} reached", signal.id, n);
            }
        }
    }

    /// Candidate is the tighter of the ATR-multiple stop and the structural
    /// swing stop; accepted only when it strictly locks in more profit.
    fn trail_stop(
        &self,
        signal: &mut Signal,
        current_price: f64,
        candles: &CandleSeries,
        atr: f64,
    ) {
        if atr <= 0.0 {
            return;
        }

        let atr_stop = match signal.direction {
            Direction::Bullish => current_price - TRAIL_ATR_MULT * atr,
            Direction::Bearish => current_price + TRAIL_ATR_MULT * atr,
        };
        let swing_stop = structural_stop(candles, signal.direction, current_price);

        let candidate = match (signal.direction, swing_stop) {
            (Direction::Bullish, Some(s)) => atr_stop.max(s),
            (Direction::Bearish, Some(s)) => atr_stop.min(s),
            (_, None) => atr_stop,
        };

        let current = signal.effective_stop();
        let improves = match signal.direction {
            Direction::Bullish => candidate > current && candidate < current_price,
            Direction::Bearish => candidate < current && candidate > current_price,
        };
        if improves {
            signal.trailing_stop = Some(round2(candidate));
            signal.management_updates.push(format!(
                "Trailing stop moved to {:.2} (was {:.2})",
                candidate, current
            ));
            tracing::debug!("{}: trailing stop -> {:.2}", signal.id, candidate);
        }
    }

    /// One-shot advisory: climax volume or a rejection wick against the
    /// trade, once the position is at least 2 ATR in profit.
    fn advise_partial_tp(
        &self,
        signal: &mut Signal,
        current_price: f64,
        candles: &CandleSeries,
        atr: f64,
    ) {
        if signal.partial_tp_advised || atr <= 0.0 {
            return;
        }

        let profit = match signal.direction {
            Direction::Bullish => current_price - signal.entry.optimal,
            Direction::Bearish => signal.entry.optimal - current_price,
        };
        if profit < MIN_PROFIT_ATR_MULT * atr {
            return;
        }

        let last = match candles.last() {
            Some(c) => c,
            None => return,
        };
        let prior = candles.slice(
            candles.len().saturating_sub(MIN_CANDLES_FOR_MANAGEMENT + 1),
            candles.len() - 1,
        );

        let volume_climax = prior.avg_volume() > 0.0 && last.volume > VOLUME_CLIMAX_MULT * prior.avg_volume();
        let rejection_wick = match signal.direction {
            Direction::Bullish => last.upper_wick() > REJECTION_WICK_MULT * last.body(),
            Direction::Bearish => last.lower_wick() > REJECTION_WICK_MULT * last.body(),
        };

        if volume_climax || rejection_wick {
            let trigger = if volume_climax {
                "volume climax"
            } else {
                "rejection wick"
            };
            signal.management_updates.push(format!(
                "Partial take-profit advised at {:.2} ({})",
                current_price, trigger
            ));
            signal.partial_tp_advised = true;
            tracing::debug!("{}: partial TP advised ({})", signal.id, trigger);
        }
    }
}

impl Default for SignalLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest protecting swing inside the management window: the highest swing
/// low below price for longs, the lowest swing high above price for shorts.
fn structural_stop(
    candles: &CandleSeries,
    direction: Direction,
    current_price: f64,
) -> Option<f64> {
    let window = candles.tail(MIN_CANDLES_FOR_MANAGEMENT);
    let len = window.len();
    if len < SWING_LOOKBACK * 2 + 1 {
        return None;
    }

    let mut best: Option<f64> = None;
    for i in SWING_LOOKBACK..(len - SWING_LOOKBACK) {
        let around = window.slice(i - SWING_LOOKBACK, i + SWING_LOOKBACK + 1);
        match direction {
            Direction::Bullish => {
                if window[i].low <= around.lows_min() && window[i].low < current_price {
                    best = Some(best.map_or(window[i].low, |b: f64| b.max(window[i].low)));
                }
            }
            Direction::Bearish => {
                if window[i].high >= around.highs_max() && window[i].high > current_price {
                    best = Some(best.map_or(window[i].high, |b: f64| b.min(window[i].high)));
                }
            }
        }
    }
    best
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candle, EntryZone, Timeframe};
    use crate::test_helpers::{make_bullish_trend, make_candles, test_time};
    use chrono::Duration;

    fn make_signal(direction: Direction) -> Signal {
        let (stop, targets) = match direction {
            Direction::Bullish => (95.0, vec![110.0, 120.0]),
            Direction::Bearish => (105.0, vec![90.0, 80.0]),
        };
        Signal {
            id: "BTC-USD-test-1".to_string(),
            symbol: "BTC-USD".to_string(),
            direction,
            timeframe: Timeframe::H1,
            entry: EntryZone {
                optimal: 100.0,
                tolerance: 0.3,
            },
            targets,
            stop,
            confluence_score: 80.0,
            breakdown: vec![],
            timeframes: vec![Timeframe::H1, Timeframe::H4, Timeframe::D1, Timeframe::W1],
            status: SignalStatus::Active,
            trailing_stop: None,
            management_updates: vec![],
            partial_tp_advised: false,
            created_at: test_time(),
            expires_at: test_time() + Duration::hours(24),
        }
    }

    fn manager() -> SignalLifecycleManager {
        let mut m = SignalLifecycleManager::new();
        m.sim_time = Some(test_time() + Duration::hours(1));
        m
    }

    #[test]
    fn stop_out_is_terminal_and_immediate() {
        let m = manager();
        let mut signal = make_signal(Direction::Bullish);
        m.update_status(&mut signal, 94.0, &make_candles(&[]));
        assert_eq!(signal.status, SignalStatus::StoppedOut);
        assert!(signal.management_updates[0].contains("Stopped out"));

        // Terminal signals never resurrect
        m.update_status(&mut signal, 130.0, &make_candles(&[]));
        assert_eq!(signal.status, SignalStatus::StoppedOut);
        assert_eq!(signal.management_updates.len(), 1);
    }

    #[test]
    fn expiry_is_terminal() {
        let mut m = SignalLifecycleManager::new();
        m.sim_time = Some(test_time() + Duration::hours(48));
        let mut signal = make_signal(Direction::Bullish);
        m.update_status(&mut signal, 101.0, &make_candles(&[]));
        assert_eq!(signal.status, SignalStatus::Expired);
    }

    #[test]
    fn targets_advance_monotonically() {
        let m = manager();
        let mut signal = make_signal(Direction::Bullish);

        m.update_status(&mut signal, 111.0, &make_candles(&[]));
        assert_eq!(signal.status, SignalStatus::HitTp(1));

        // Price pulls back: status stays at TP1
        m.update_status(&mut signal, 105.0, &make_candles(&[]));
        assert_eq!(signal.status, SignalStatus::HitTp(1));

        m.update_status(&mut signal, 121.0, &make_candles(&[]));
        assert_eq!(signal.status, SignalStatus::HitTp(2));
    }

    #[test]
    fn trailing_stop_only_tightens_for_longs() {
        let m = manager();
        let mut signal = make_signal(Direction::Bullish);
        let candles = make_bullish_trend(30, 100.0);
        let price = 400.0;

        m.update_status(&mut signal, price, &candles);
        let first = signal.trailing_stop.expect("trail should engage in profit");
        assert!(first > signal.stop);
        assert!(first < price);

        // Re-run with a slightly lower price: candidate would loosen, so no change
        let mut re_run = signal.clone();
        m.update_status(&mut re_run, 380.0, &candles);
        let second = re_run.trailing_stop.unwrap();
        assert!(
            second >= first,
            "trailing stop loosened from {first} to {second}"
        );
    }

    #[test]
    fn trailing_stop_only_tightens_for_shorts() {
        let m = manager();
        let mut signal = make_signal(Direction::Bearish);
        signal.entry = EntryZone {
            optimal: 500.0,
            tolerance: 0.5,
        };
        signal.stop = 510.0;
        signal.targets = vec![300.0, 250.0];
        let candles = crate::test_helpers::make_bearish_trend(30, 500.0);

        m.update_status(&mut signal, 210.0, &candles);
        let first = signal.trailing_stop.expect("trail should engage in profit");
        assert!(first < signal.stop);
        assert!(first > 210.0);
    }

    #[test]
    fn no_trailing_without_enough_candles() {
        let m = manager();
        let mut signal = make_signal(Direction::Bullish);
        let candles = make_bullish_trend(10, 100.0);
        m.update_status(&mut signal, 180.0, &candles);
        assert!(signal.trailing_stop.is_none());
    }

    #[test]
    fn partial_tp_advisory_fires_once_on_rejection_wick() {
        let m = manager();
        let mut signal = make_signal(Direction::Bullish);

        // Deep in profit with a final candle showing a long upper wick
        let mut candles = make_bullish_trend(25, 100.0);
        let last_ts = test_time() + Duration::minutes(30);
        candles.push(Candle {
            timestamp: last_ts,
            open: 340.0,
            high: 380.0,
            low: 339.0,
            close: 342.0,
            volume: 100.0,
        });

        m.update_status(&mut signal, 342.0, &candles);
        assert!(signal.partial_tp_advised);
        let advisories = signal
            .management_updates
            .iter()
            .filter(|u| u.contains("Partial take-profit"))
            .count();
        assert_eq!(advisories, 1);

        // Second pass must not duplicate the advisory
        m.update_status(&mut signal, 342.0, &candles);
        let advisories = signal
            .management_updates
            .iter()
            .filter(|u| u.contains("Partial take-profit"))
            .count();
        assert_eq!(advisories, 1);
    }

    #[test]
    fn no_partial_tp_without_profit() {
        let m = manager();
        let mut signal = make_signal(Direction::Bullish);
        // Barely above entry: under the 2-ATR profit gate
        let data: Vec<(f64, f64, f64, f64)> =
            (0..25).map(|_| (100.0, 101.0, 99.0, 100.5)).collect();
        let candles = make_candles(&data);
        m.update_status(&mut signal, 100.5, &candles);
        assert!(!signal.partial_tp_advised);
    }
}
