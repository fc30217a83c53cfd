use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::feeds::ShockFeed;
use crate::models::{
    Bias, Direction, MarketStateSnapshot, Setup, ShockSeverity, Signal, SignalStatus, Timeframe,
};

const MAX_ALIGNMENT_POINTS: f64 = 25.0;

/// One timeframe's scored scan output.
#[derive(Debug, Clone)]
pub struct TimeframeResult {
    pub timeframe: Timeframe,
    pub snapshot: MarketStateSnapshot,
    /// Setups with `edge_score` attached by the edge scorer.
    pub setups: Vec<Setup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupScore {
    total: f64,
    lines: Vec<String>,
}

/// Merges per-timeframe scored setups into one gated institutional-grade
/// signal, or nothing at all.
pub struct ConfluenceValidator {
    pub min_timeframes: usize,
    pub min_score: f64,
    pub cluster_tolerance: f64,
    pub signal_ttl_bars: u32,
    /// When set, used instead of Utc::now() (tests/backfills).
    pub sim_time: Option<DateTime<Utc>>,
}

impl ConfluenceValidator {
    pub fn new(cfg: &Config) -> Self {
        Self {
            min_timeframes: cfg.min_confluence_timeframes,
            min_score: cfg.min_confluence_score,
            cluster_tolerance: cfg.cluster_tolerance,
            signal_ttl_bars: cfg.signal_ttl_bars,
            sim_time: None,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.sim_time.unwrap_or_else(Utc::now)
    }

    /// Validate one symbol's multi-timeframe scan. Suspends only for the
    /// news-shock lookup; a lookup failure is treated as "no shock".
    pub async fn validate(
        &self,
        symbol: &str,
        results: &[TimeframeResult],
        shocks: &dyn ShockFeed,
    ) -> Option<Signal> {
        let bearing: Vec<&TimeframeResult> =
            results.iter().filter(|r| !r.setups.is_empty()).collect();
        if bearing.len() < self.min_timeframes {
            tracing::debug!(
                "{symbol}: {} timeframes with setups, need {}",
                bearing.len(),
                self.min_timeframes
            );
            return None;
        }

        let global_bias = global_bias(&bearing);

        // Partition by direction, best setup per timeframe per side
        let candidate = [Direction::Bullish, Direction::Bearish]
            .into_iter()
            .filter_map(|dir| self.direction_group(&bearing, dir, global_bias))
            .max_by(|a, b| {
                a.confirming
                    .len()
                    .cmp(&b.confirming.len())
                    .then(a.avg_edge.partial_cmp(&b.avg_edge).unwrap())
            })?;

        let shock_penalty = match shocks.active_shock(symbol).await {
            Ok(Some(shock)) => match shock.severity {
                ShockSeverity::High => Some((40.0, shock.message)),
                ShockSeverity::Medium => Some((20.0, shock.message)),
                ShockSeverity::Low => None,
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("{symbol}: shock lookup failed, scoring without it: {e}");
                None
            }
        };

        let score = self.score_group(&candidate, &bearing, global_bias, shock_penalty);
        if score.total < self.min_score {
            tracing::debug!(
                "{symbol}: confluence {:.0} below gate {:.0}",
                score.total,
                self.min_score
            );
            return None;
        }

        Some(self.build_signal(symbol, &candidate, score))
    }

    fn direction_group<'a>(
        &self,
        bearing: &[&'a TimeframeResult],
        direction: Direction,
        global_bias: Bias,
    ) -> Option<DirectionGroup<'a>> {
        let mut confirming: Vec<(Timeframe, &'a Setup)> = Vec::new();
        for result in bearing {
            let best = result
                .setups
                .iter()
                .filter(|s| s.direction == direction)
                .max_by(|a, b| {
                    edge_of(a).partial_cmp(&edge_of(b)).unwrap()
                });
            if let Some(setup) = best {
                confirming.push((result.timeframe, setup));
            }
        }

        if confirming.is_empty() || confirming.len() < self.min_timeframes {
            return None;
        }
        if global_bias != Bias::Neutral && !direction.agrees_with(global_bias) {
            return None;
        }

        let avg_edge =
            confirming.iter().map(|(_, s)| edge_of(s)).sum::<f64>() / confirming.len() as f64;

        Some(DirectionGroup {
            direction,
            confirming,
            avg_edge,
        })
    }

    fn score_group(
        &self,
        group: &DirectionGroup<'_>,
        bearing: &[&TimeframeResult],
        global_bias: Bias,
        shock_penalty: Option<(f64, String)>,
    ) -> GroupScore {
        let mut total = 0.0;
        let mut lines = Vec::new();
        let n = group.confirming.len();

        // Timeframe density
        let density = match n {
            n if n >= 7 => 25.0,
            6 => 20.0,
            5 => 15.0,
            _ => 10.0,
        };
        total += density;
        lines.push(format!("{} confirming timeframes (+{:.0})", n, density));

        // Weighted alignment: heavier timeframes count for more
        let confirming_weight: f64 = group
            .confirming
            .iter()
            .map(|(tf, _)| tf.confluence_weight())
            .sum();
        let supplied_weight: f64 = bearing
            .iter()
            .map(|r| r.timeframe.confluence_weight())
            .sum();
        let alignment = if supplied_weight > 0.0 {
            round1(confirming_weight / supplied_weight * MAX_ALIGNMENT_POINTS)
        } else {
            0.0
        };
        total += alignment;
        lines.push(format!(
            "Weighted timeframe alignment {:.0}/{:.0} (+{:.1})",
            confirming_weight, supplied_weight, alignment
        ));

        // HTF vs LTF consensus
        let htf = consensus(bearing, true);
        let ltf = consensus(bearing, false);
        match (htf, ltf) {
            (Some(h), Some(l)) if h != l => {
                total -= 30.0;
                lines.push(format!(
                    "HTF consensus {} diverges from LTF consensus {} (-30)",
                    h, l
                ));
            }
            (Some(h), Some(l)) if h == group.direction && l == group.direction => {
                total += 10.0;
                lines.push("HTF and LTF consensus both confirm (+10)".to_string());
            }
            _ => {}
        }

        // Entry-zone clustering
        let entries: Vec<f64> = group.confirming.iter().map(|(_, s)| s.entry.optimal).collect();
        let ratio = cluster_ratio(&entries, self.cluster_tolerance);
        let cluster_pts = if ratio >= 0.8 {
            30.0
        } else if ratio >= 0.5 {
            20.0
        } else if ratio >= 0.3 {
            10.0
        } else {
            -10.0
        };
        total += cluster_pts;
        lines.push(format!(
            "Entry clustering {:.0}% ({:+.0})",
            ratio * 100.0,
            cluster_pts
        ));

        // Average per-timeframe edge quality
        if group.avg_edge >= 8.0 {
            total += 15.0;
            lines.push(format!("Average edge {:.1} (+15)", group.avg_edge));
        } else if group.avg_edge >= 6.5 {
            total += 8.0;
            lines.push(format!("Average edge {:.1} (+8)", group.avg_edge));
        }

        // Institutional footprint across confirming timeframes
        let confirming_tfs: Vec<Timeframe> =
            group.confirming.iter().map(|(tf, _)| *tf).collect();
        let institutional = bearing
            .iter()
            .filter(|r| confirming_tfs.contains(&r.timeframe))
            .filter(|r| {
                r.snapshot
                    .volume
                    .as_ref()
                    .map_or(false, |v| v.is_institutional)
                    || r.snapshot.smt.as_ref().map_or(false, |s| s.confluence > 70.0)
            })
            .count();
        let footprint = institutional as f64 / n as f64;
        if footprint >= 0.6 {
            total += 10.0;
            lines.push(format!(
                "Institutional footprint on {:.0}% of timeframes (+10)",
                footprint * 100.0
            ));
        } else if footprint >= 0.3 {
            total += 5.0;
            lines.push(format!(
                "Institutional footprint on {:.0}% of timeframes (+5)",
                footprint * 100.0
            ));
        }

        if let Some((penalty, message)) = shock_penalty {
            total -= penalty;
            lines.push(format!("Active news shock: {} (-{:.0})", message, penalty));
        }

        if global_bias == Bias::Neutral {
            lines.push("Global bias neutral".to_string());
        }

        GroupScore { total, lines }
    }

    fn build_signal(
        &self,
        symbol: &str,
        group: &DirectionGroup<'_>,
        score: GroupScore,
    ) -> Signal {
        // Levels come from the single strongest confirming timeframe
        let (anchor_tf, anchor) = group
            .confirming
            .iter()
            .max_by(|(_, a), (_, b)| edge_of(a).partial_cmp(&edge_of(b)).unwrap())
            .expect("non-empty confirming group");

        let now = self.now();
        let ttl = Duration::seconds(
            anchor_tf.as_seconds() as i64 * i64::from(self.signal_ttl_bars),
        );

        let signal = Signal {
            id: format!("{}-{}-{}", symbol, group.direction, now.timestamp()),
            symbol: symbol.to_string(),
            direction: group.direction,
            timeframe: *anchor_tf,
            entry: anchor.entry,
            targets: anchor.targets.clone(),
            stop: anchor.stop,
            confluence_score: round1(score.total),
            breakdown: score.lines,
            timeframes: group.confirming.iter().map(|(tf, _)| *tf).collect(),
            status: SignalStatus::Active,
            trailing_stop: None,
            management_updates: Vec::new(),
            partial_tp_advised: false,
            created_at: now,
            expires_at: now + ttl,
        };

        tracing::info!(
            "{symbol}: {} signal from {} timeframes, confluence {:.0}",
            signal.direction,
            signal.timeframes.len(),
            signal.confluence_score
        );
        signal
    }
}

struct DirectionGroup<'a> {
    direction: Direction,
    confirming: Vec<(Timeframe, &'a Setup)>,
    avg_edge: f64,
}

fn edge_of(setup: &Setup) -> f64 {
    setup.edge_score.unwrap_or(0.0)
}

/// Bias read from the highest supplied higher-timeframe analysis.
fn global_bias(bearing: &[&TimeframeResult]) -> Bias {
    bearing
        .iter()
        .filter(|r| r.timeframe.is_higher_timeframe())
        .max_by_key(|r| r.timeframe)
        .map(|r| {
            r.snapshot
                .trend
                .as_ref()
                .map(|t| t.direction)
                .or_else(|| r.snapshot.mtf.as_ref().map(|m| m.global_bias))
                .unwrap_or(Bias::Neutral)
        })
        .unwrap_or(Bias::Neutral)
}

/// Majority direction of best setups in the HTF or LTF half.
fn consensus(bearing: &[&TimeframeResult], higher: bool) -> Option<Direction> {
    let mut bullish = 0i32;
    let mut bearish = 0i32;
    for result in bearing
        .iter()
        .filter(|r| r.timeframe.is_higher_timeframe() == higher)
    {
        let best = result
            .setups
            .iter()
            .max_by(|a, b| edge_of(a).partial_cmp(&edge_of(b)).unwrap());
        match best.map(|s| s.direction) {
            Some(Direction::Bullish) => bullish += 1,
            Some(Direction::Bearish) => bearish += 1,
            None => {}
        }
    }
    if bullish > bearish {
        Some(Direction::Bullish)
    } else if bearish > bullish {
        Some(Direction::Bearish)
    } else {
        None
    }
}

/// Fraction of entries within tolerance of the group median.
fn cluster_ratio(entries: &[f64], tolerance: f64) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = sorted[sorted.len() / 2];
    if median == 0.0 {
        return 0.0;
    }
    let close = entries
        .iter()
        .filter(|&&e| ((e - median).abs() / median) <= tolerance)
        .count();
    close as f64 / entries.len() as f64
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
