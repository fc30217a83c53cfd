use crate::core::credibility::PosteriorCredibility;
use crate::core::performance::PerformanceTracker;
use crate::models::{
    Bias, CyclePhase, Direction, EngineStatus, MacroAction, MarketStateSnapshot, Regime,
    ScoreBreakdown, Setup, ShockSeverity, TraderProfile,
};

/// Traps within 0.3% of the entry veto the setup.
const TRAP_ADJACENCY: f64 = 0.003;
/// Iceberg walls and POC count as "at entry" within 0.5%.
const LEVEL_ADJACENCY: f64 = 0.005;
/// Liquidity magnets above this urgency are an active draw.
const MAGNET_URGENCY_FLOOR: f64 = 80.0;
/// A vetoed setup can never score above this.
const VETO_SCORE_CAP: f64 = 1.0;

/// One scored contribution. Every factor that fires appends exactly one
/// audit line to either positives or risks.
#[derive(Debug, Clone)]
pub struct Factor {
    pub points: f64,
    pub label: String,
    pub risk: bool,
    pub veto: bool,
}

impl Factor {
    fn plus(points: f64, label: impl Into<String>) -> Factor {
        Factor {
            points,
            label: label.into(),
            risk: false,
            veto: false,
        }
    }

    fn minus(points: f64, label: impl Into<String>) -> Factor {
        Factor {
            points: -points.abs(),
            label: label.into(),
            risk: true,
            veto: false,
        }
    }

    /// A risk line that also caps the final score.
    fn hard_veto(points: f64, label: impl Into<String>) -> Factor {
        Factor {
            points: -points.abs(),
            label: label.into(),
            risk: true,
            veto: true,
        }
    }

    /// A risk flag that carries no point change.
    fn warn(label: impl Into<String>) -> Factor {
        Factor {
            points: 0.0,
            label: label.into(),
            risk: true,
            veto: false,
        }
    }
}

/// Inputs shared by every factor function.
pub struct FactorCtx<'a> {
    pub setup: &'a Setup,
    pub market: &'a MarketStateSnapshot,
    pub credibility: &'a PosteriorCredibility,
    pub dynamic_weight: f64,
    pub profile: TraderProfile,
    pub trend_weight: f64,
    pub osc_weight: f64,
}

type FactorFn = fn(&FactorCtx) -> Vec<Factor>;

/// Fixed priority order. The sum of every fired factor, scaled to 0-10,
/// is the edge score.
const FACTOR_PIPELINE: &[FactorFn] = &[
    golden_confluence,
    strategy_credibility,
    adaptive_performance,
    risk_reward,
    htf_alignment,
    institutional_cluster,
    magnet_pressure,
    order_flow,
    volume_profile_confluence,
    macro_alignment,
    correlation_risk,
    order_book_depth,
    news_shock,
    trap_zones,
    cycle_phase,
    liquidity_sweep,
    alpha_engines,
    momentum_cluster,
    crowd_sentiment,
    fractal_pattern,
    directional_confidence,
];

/// Multi-factor quality scorer. Pure given its inputs: identical setup,
/// snapshot, credibility and tracker state always produce identical output.
pub struct EdgeScorer;

impl EdgeScorer {
    pub fn new() -> Self {
        EdgeScorer
    }

    pub fn calculate(
        &self,
        setup: Option<&Setup>,
        market: Option<&MarketStateSnapshot>,
        credibility: &PosteriorCredibility,
        tracker: &PerformanceTracker,
    ) -> ScoreBreakdown {
        let setup = match setup {
            Some(s) => s,
            None => {
                return ScoreBreakdown {
                    score: 0.0,
                    positives: Vec::new(),
                    risks: vec!["No active setup".to_string()],
                }
            }
        };
        let market = match market {
            Some(m) => m,
            None => {
                return ScoreBreakdown {
                    score: 0.0,
                    positives: Vec::new(),
                    risks: vec!["Missing market context".to_string()],
                }
            }
        };

        let (trend_weight, osc_weight) = match market.regime {
            Some(Regime::Trending) => (1.3, 0.7),
            Some(Regime::Ranging) => (0.7, 1.3),
            Some(Regime::Volatile) => (1.0, 1.0),
            None => (1.0, 1.0),
        };

        let ctx = FactorCtx {
            setup,
            market,
            credibility,
            dynamic_weight: tracker.dynamic_weight(&setup.strategy),
            profile: TraderProfile::from_timeframe(setup.timeframe),
            trend_weight,
            osc_weight,
        };

        let mut total = 0.0;
        let mut vetoed = false;
        let mut positives = Vec::new();
        let mut risks = Vec::new();

        for factor_fn in FACTOR_PIPELINE {
            for factor in factor_fn(&ctx) {
                total += factor.points;
                vetoed |= factor.veto;
                if factor.risk {
                    risks.push(factor.label);
                } else {
                    positives.push(factor.label);
                }
            }
        }

        let mut score = round1(total / 100.0 * 10.0).clamp(0.0, 10.0);
        if vetoed {
            score = score.min(VETO_SCORE_CAP);
        }

        tracing::debug!(
            "{} {} {}: {} pts -> edge {:.1} ({} positives, {} risks)",
            setup.symbol,
            setup.timeframe,
            setup.direction,
            total,
            score,
            positives.len(),
            risks.len(),
        );

        ScoreBreakdown {
            score,
            positives,
            risks,
        }
    }
}

impl Default for EdgeScorer {
    fn default() -> Self {
        Self::new()
    }
}

// --- Factor functions, in pipeline order ---

/// HTF bias, local trend, sentiment and institutional volume all pointing
/// the same way is the strongest single read the scorer knows.
fn golden_confluence(ctx: &FactorCtx) -> Vec<Factor> {
    let (mtf, trend, sentiment, volume) = match (
        &ctx.market.mtf,
        &ctx.market.trend,
        &ctx.market.sentiment,
        &ctx.market.volume,
    ) {
        (Some(m), Some(t), Some(s), Some(v)) => (m, t, s, v),
        _ => return Vec::new(),
    };

    let dir = ctx.setup.direction;
    if dir.agrees_with(mtf.global_bias)
        && dir.agrees_with(trend.direction)
        && dir.agrees_with(sentiment.label)
        && volume.is_institutional
    {
        vec![Factor::plus(
            50.0,
            "Golden confluence: HTF bias + trend + sentiment + institutional volume (+50)",
        )]
    } else {
        Vec::new()
    }
}

fn strategy_credibility(ctx: &FactorCtx) -> Vec<Factor> {
    let p = ctx.credibility.probability;
    if p >= 0.80 {
        vec![Factor::plus(
            40.0,
            format!("Premium strategy credibility {:.0}% (+40)", p * 100.0),
        )]
    } else if p >= 0.65 {
        vec![Factor::plus(
            25.0,
            format!("Strong strategy credibility {:.0}% (+25)", p * 100.0),
        )]
    } else if p < 0.50 {
        vec![Factor::warn(format!(
            "Low strategy credibility {:.0}%",
            p * 100.0
        ))]
    } else {
        Vec::new()
    }
}

/// Discrete bands, not a linear scale: only clearly hot or clearly cold
/// recent performance moves the score.
fn adaptive_performance(ctx: &FactorCtx) -> Vec<Factor> {
    let w = ctx.dynamic_weight;
    if w > 1.1 {
        vec![Factor::plus(
            15.0,
            format!("Strategy running hot, weight {:.2} (+15)", w),
        )]
    } else if w < 0.9 {
        vec![Factor::minus(
            25.0,
            format!("Strategy underperforming, weight {:.2} (-25)", w),
        )]
    } else {
        Vec::new()
    }
}

fn risk_reward(ctx: &FactorCtx) -> Vec<Factor> {
    let rr = ctx.setup.risk_reward;
    let min_rr = ctx.profile.min_rr();
    if rr >= min_rr * 2.0 {
        vec![Factor::plus(
            20.0,
            format!("R:R {:.1} doubles the {} minimum (+20)", rr, ctx.profile),
        )]
    } else if rr >= min_rr * 1.5 {
        vec![Factor::plus(
            15.0,
            format!("R:R {:.1} well above {} minimum (+15)", rr, ctx.profile),
        )]
    } else if rr >= min_rr {
        vec![Factor::plus(
            8.0,
            format!("R:R {:.1} clears {} minimum (+8)", rr, ctx.profile),
        )]
    } else if rr >= min_rr * 0.8 {
        vec![Factor::plus(
            3.0,
            format!("R:R {:.1} near {} minimum (+3)", rr, ctx.profile),
        )]
    } else {
        vec![Factor::warn(format!(
            "R:R {:.1} below {} minimum {:.1}",
            rr, ctx.profile, min_rr
        ))]
    }
}

fn htf_alignment(ctx: &FactorCtx) -> Vec<Factor> {
    let mtf = match &ctx.market.mtf {
        Some(m) => m,
        None => return Vec::new(),
    };
    let weight = ctx.profile.htf_weight() * ctx.trend_weight;
    let dir = ctx.setup.direction;

    if mtf.global_bias == Bias::Neutral {
        vec![Factor::plus(5.0, "HTF bias neutral, no headwind (+5)")]
    } else if dir.agrees_with(mtf.global_bias) {
        let pts = 25.0 * weight;
        vec![Factor::plus(
            pts,
            format!("Aligned with {} HTF bias (+{:.1})", mtf.global_bias, pts),
        )]
    } else {
        let pts = 15.0 * weight;
        vec![Factor::minus(
            pts,
            format!("Against {} HTF bias (-{:.1})", mtf.global_bias, pts),
        )]
    }
}

/// Volume participation, SMT divergence, killzone timing and obligation
/// targets, scored together as the institutional footprint.
fn institutional_cluster(ctx: &FactorCtx) -> Vec<Factor> {
    let mut out = Vec::new();
    let dir = ctx.setup.direction;

    if let Some(volume) = &ctx.market.volume {
        if volume.is_institutional {
            out.push(Factor::plus(10.0, "Institutional volume participation (+10)"));
        } else if ctx.market.regime == Some(Regime::Trending) {
            out.push(Factor::minus(
                15.0,
                "Trending regime without institutional volume (-15)",
            ));
        }
    }

    if let Some(smt) = &ctx.market.smt {
        match smt.direction {
            Some(b) if dir.agrees_with(b) => out.push(Factor::plus(
                35.0,
                format!("SMT divergence confirms {} (+35)", dir),
            )),
            Some(b) if dir.conflicts_with(b) => out.push(Factor::minus(
                20.0,
                format!("SMT divergence points {} (-20)", b),
            )),
            _ => {
                if smt.confluence > 70.0 {
                    out.push(Factor::plus(
                        25.0,
                        format!("Broad SMT confluence {:.0} (+25)", smt.confluence),
                    ));
                } else {
                    out.push(Factor::plus(
                        15.0,
                        format!("SMT confluence {:.0} (+15)", smt.confluence),
                    ));
                }
            }
        }
    }

    if let Some(session) = &ctx.market.session {
        if session.in_killzone {
            if session.is_power_hour() {
                let pts = 20.0 * ctx.profile.killzone_weight();
                out.push(Factor::plus(
                    pts,
                    format!("Power hour {:02}:00 UTC killzone (+{:.1})", session.utc_hour, pts),
                ));
            } else {
                let pts = 10.0 * ctx.profile.killzone_weight();
                out.push(Factor::plus(
                    pts,
                    format!("Killzone session active (+{:.1})", pts),
                ));
            }
        }
    }

    if let Some(magnets) = &ctx.market.magnets {
        let obligation = magnets
            .iter()
            .any(|m| m.urgency <= MAGNET_URGENCY_FLOOR && dir.agrees_with(m.implied));
        if obligation {
            out.push(Factor::plus(
                15.0,
                "Obligation target resting in trade direction (+15)",
            ));
        }
    }

    out
}

/// A magnet pulling hard the other way overrides path-of-least-resistance
/// logic; one pulling with us confirms it.
fn magnet_pressure(ctx: &FactorCtx) -> Vec<Factor> {
    let magnets = match &ctx.market.magnets {
        Some(m) => m,
        None => return Vec::new(),
    };
    let strongest = magnets
        .iter()
        .filter(|m| m.urgency > MAGNET_URGENCY_FLOOR)
        .max_by(|a, b| a.urgency.partial_cmp(&b.urgency).unwrap());

    match strongest {
        Some(m) if ctx.setup.direction.conflicts_with(m.implied) => vec![Factor::minus(
            40.0,
            format!(
                "High-urgency magnet {:.0} pulling {} (-40)",
                m.urgency, m.implied
            ),
        )],
        Some(m) if ctx.setup.direction.agrees_with(m.implied) => vec![Factor::plus(
            15.0,
            format!("High-urgency magnet {:.0} in trade direction (+15)", m.urgency),
        )],
        _ => Vec::new(),
    }
}

fn order_flow(ctx: &FactorCtx) -> Vec<Factor> {
    let flow = match &ctx.market.order_flow {
        Some(f) => f,
        None => return Vec::new(),
    };
    let mut out = Vec::new();
    let dir = ctx.setup.direction;
    let entry = ctx.setup.entry.optimal;

    let nearest_wall = flow
        .icebergs
        .iter()
        .filter(|w| entry > 0.0 && ((w.price - entry).abs() / entry) <= LEVEL_ADJACENCY)
        .min_by(|a, b| {
            (a.price - entry)
                .abs()
                .partial_cmp(&(b.price - entry).abs())
                .unwrap()
        });
    if let Some(wall) = nearest_wall {
        if dir.agrees_with(wall.side) {
            out.push(Factor::plus(
                25.0,
                format!("Iceberg wall defending entry at {:.2} (+25)", wall.price),
            ));
        } else if dir.conflicts_with(wall.side) {
            out.push(Factor::minus(
                30.0,
                format!("Iceberg wall opposing entry at {:.2} (-30)", wall.price),
            ));
        }
    }

    let absorption_aligned = matches!(flow.absorption, Some(b) if dir.agrees_with(b));
    if absorption_aligned {
        out.push(Factor::plus(20.0, "Absorption in trade direction (+20)"));
    }

    if let Some(cvd) = flow.cvd_bias {
        if dir.agrees_with(cvd) {
            out.push(Factor::plus(10.0, "CVD confirms trade direction (+10)"));
        } else if dir.conflicts_with(cvd) && !absorption_aligned {
            out.push(Factor::minus(
                5.0,
                "CVD against trade without absorption cover (-5)",
            ));
        }
    }

    out
}

fn volume_profile_confluence(ctx: &FactorCtx) -> Vec<Factor> {
    let profile = match &ctx.market.volume_profile {
        Some(p) => p,
        None => return Vec::new(),
    };
    let mut out = Vec::new();
    let entry = ctx.setup.entry.optimal;

    if let Some(poc) = profile.poc {
        if entry > 0.0 && ((poc - entry).abs() / entry) <= LEVEL_ADJACENCY {
            out.push(Factor::plus(5.0, format!("Entry at POC {:.2} (+5)", poc)));
        }
    }

    if let Some(npoc) = profile.npoc {
        let on_target_side = match ctx.setup.direction {
            Direction::Bullish => npoc > entry,
            Direction::Bearish => npoc < entry,
        };
        if on_target_side {
            out.push(Factor::plus(
                5.0,
                format!("Naked POC magnet at {:.2} (+5)", npoc),
            ));
        }
    }

    if matches!(profile.dom_wall, Some(b) if ctx.setup.direction.agrees_with(b)) {
        out.push(Factor::plus(5.0, "DOM wall backing the trade (+5)"));
    }

    out
}

fn macro_alignment(ctx: &FactorCtx) -> Vec<Factor> {
    let state = match &ctx.market.macro_bias {
        Some(m) => m,
        None => return Vec::new(),
    };
    let dir = ctx.setup.direction;

    if dir.conflicts_with(state.verdict) {
        if state.action == MacroAction::Veto {
            vec![Factor::minus(
                50.0,
                format!("Macro veto: cross-asset verdict {} (-50)", state.verdict),
            )]
        } else {
            vec![Factor::minus(
                15.0,
                format!("Macro verdict {} conflicts (-15)", state.verdict),
            )]
        }
    } else if dir.agrees_with(state.verdict) {
        if state.action == MacroAction::Boost {
            vec![Factor::plus(25.0, "Macro boost: cross-asset tailwind (+25)")]
        } else {
            vec![Factor::plus(15.0, "Macro verdict aligned (+15)")]
        }
    } else {
        Vec::new()
    }
}

fn correlation_risk(ctx: &FactorCtx) -> Vec<Factor> {
    use crate::models::CorrelationRisk::*;
    match ctx.market.correlation.as_ref().map(|c| c.risk) {
        Some(Extreme) => vec![Factor::minus(
            25.0,
            "Extreme correlation-cluster exposure (-25)",
        )],
        Some(High) => vec![Factor::minus(10.0, "High correlation-cluster exposure (-10)")],
        _ => Vec::new(),
    }
}

fn order_book_depth(ctx: &FactorCtx) -> Vec<Factor> {
    let book = match &ctx.market.order_book {
        Some(b) => b,
        None => return Vec::new(),
    };
    if ctx.setup.direction.agrees_with(book.alignment) {
        let pts = book.depth_score * 1.5;
        vec![Factor::plus(
            pts,
            format!("Order-book depth aligned (+{:.1})", pts),
        )]
    } else {
        Vec::new()
    }
}

fn news_shock(ctx: &FactorCtx) -> Vec<Factor> {
    match &ctx.market.news_shock {
        Some(shock) if shock.severity == ShockSeverity::High => vec![Factor::minus(
            35.0,
            format!("High-severity news shock: {} (-35)", shock.message),
        )],
        _ => Vec::new(),
    }
}

/// An entry sitting on a mapped trap in the trade's own direction is a
/// hard veto: no stack of positives rescues it.
fn trap_zones(ctx: &FactorCtx) -> Vec<Factor> {
    let traps = match &ctx.market.trap_zones {
        Some(t) => t,
        None => return Vec::new(),
    };
    let entry = ctx.setup.entry.optimal;
    let adverse = traps.against(ctx.setup.direction);

    let adjacent = adverse
        .iter()
        .find(|t| entry > 0.0 && ((t.price - entry).abs() / entry) <= TRAP_ADJACENCY);
    if let Some(trap) = adjacent {
        return vec![Factor::hard_veto(
            100.0,
            format!(
                "Entry inside mapped {} trap at {:.2} (-100)",
                ctx.setup.direction, trap.price
            ),
        )];
    }

    if !adverse.is_empty() {
        return vec![Factor::minus(
            10.0,
            format!("{} trap zones mapped nearby (-10)", adverse.len()),
        )];
    }

    Vec::new()
}

fn cycle_phase(ctx: &FactorCtx) -> Vec<Factor> {
    let cycle = match &ctx.market.cycle {
        Some(c) => c,
        None => return Vec::new(),
    };
    let dir = ctx.setup.direction;

    match cycle.phase {
        CyclePhase::Manipulation => match cycle.direction {
            Some(b) if dir.agrees_with(b) => vec![Factor::minus(
                40.0,
                "Judas swing risk: entering with the manipulation move (-40)",
            )],
            Some(b) if dir.conflicts_with(b) => vec![Factor::plus(
                25.0,
                "Counter-manipulation fade (+25)",
            )],
            _ => Vec::new(),
        },
        CyclePhase::Distribution | CyclePhase::Expansion => match cycle.direction {
            Some(b) if dir.agrees_with(b) => vec![Factor::plus(
                20.0,
                format!("{:?} phase aligned (+20)", cycle.phase),
            )],
            Some(b) if dir.conflicts_with(b) => vec![Factor::minus(
                30.0,
                format!("{:?} phase conflicts (-30)", cycle.phase),
            )],
            _ => Vec::new(),
        },
        CyclePhase::Accumulation => vec![Factor::minus(
            10.0,
            "Accumulation phase: range-bound conditions (-10)",
        )],
    }
}

fn liquidity_sweep(ctx: &FactorCtx) -> Vec<Factor> {
    match &ctx.market.sweep {
        Some(s) if s.recent && ctx.setup.direction.agrees_with(s.direction) => vec![Factor::plus(
            30.0,
            format!("Recent liquidity sweep fuels {} (+30)", s.direction),
        )],
        _ => Vec::new(),
    }
}

fn alpha_engines(ctx: &FactorCtx) -> Vec<Factor> {
    let alpha = match &ctx.market.alpha {
        Some(a) => a,
        None => return Vec::new(),
    };
    let mut out = Vec::new();

    for (name, status) in &alpha.engines {
        match status {
            EngineStatus::Institutional => out.push(Factor::plus(
                15.0,
                format!("{} engine: institutional grade (+15)", name),
            )),
            EngineStatus::HighAlpha => out.push(Factor::plus(
                8.0,
                format!("{} engine: high alpha (+8)", name),
            )),
            EngineStatus::Degrading => out.push(Factor::minus(
                12.0,
                format!("{} engine degrading (-12)", name),
            )),
            EngineStatus::Stable => {}
        }
    }

    for leak in &alpha.leaks {
        if leak.severity == ShockSeverity::High {
            out.push(Factor::minus(
                20.0,
                format!("Active alpha leak: {} (-20)", leak.source),
            ));
        } else {
            out.push(Factor::minus(
                10.0,
                format!("Alpha leak: {} (-10)", leak.source),
            ));
        }
    }

    out
}

fn momentum_cluster(ctx: &FactorCtx) -> Vec<Factor> {
    let momentum = match &ctx.market.momentum {
        Some(m) => m,
        None => return Vec::new(),
    };
    let mut out = Vec::new();
    let w = ctx.osc_weight;
    let dir = ctx.setup.direction;

    if let Some(stoch) = &momentum.stochastic {
        let fires = match dir {
            Direction::Bullish => stoch.bullish_cross || stoch.oversold,
            Direction::Bearish => stoch.bearish_cross || stoch.overbought,
        };
        if fires {
            let pts = 10.0 * w;
            out.push(Factor::plus(
                pts,
                format!("Stochastic setup in trade direction (+{:.1})", pts),
            ));
        }
    }

    if let Some(rsi) = momentum.rsi {
        match dir {
            Direction::Bullish => {
                if rsi > 80.0 {
                    let pts = 15.0 * w;
                    out.push(Factor::minus(
                        pts,
                        format!("RSI {:.0} overextended (-{:.1})", rsi, pts),
                    ));
                } else if (45.0..=65.0).contains(&rsi) {
                    let pts = 5.0 * w;
                    out.push(Factor::plus(
                        pts,
                        format!("RSI {:.0} in healthy zone (+{:.1})", rsi, pts),
                    ));
                }
            }
            Direction::Bearish => {
                if rsi < 20.0 {
                    let pts = 15.0 * w;
                    out.push(Factor::minus(
                        pts,
                        format!("RSI {:.0} overextended (-{:.1})", rsi, pts),
                    ));
                } else if (35.0..=55.0).contains(&rsi) {
                    let pts = 5.0 * w;
                    out.push(Factor::plus(
                        pts,
                        format!("RSI {:.0} in healthy zone (+{:.1})", rsi, pts),
                    ));
                }
            }
        }
    }

    if let Some(slope) = momentum.macd_hist_slope {
        let aligned = match dir {
            Direction::Bullish => slope > 0.0,
            Direction::Bearish => slope < 0.0,
        };
        if aligned {
            let pts = 10.0 * w;
            out.push(Factor::plus(
                pts,
                format!("MACD histogram turning with trade (+{:.1})", pts),
            ));
        }
    }

    out
}

fn crowd_sentiment(ctx: &FactorCtx) -> Vec<Factor> {
    let sentiment = match &ctx.market.sentiment {
        Some(s) => s,
        None => return Vec::new(),
    };
    let dir = ctx.setup.direction;
    let confident = sentiment.confidence.map_or(false, |c| c >= 0.7);

    if dir.agrees_with(sentiment.label) {
        if confident {
            vec![Factor::plus(10.0, "Confident sentiment aligned (+10)")]
        } else {
            vec![Factor::plus(5.0, "Sentiment leaning with trade (+5)")]
        }
    } else if dir.conflicts_with(sentiment.label) {
        if confident {
            vec![Factor::minus(10.0, "Confident sentiment against trade (-10)")]
        } else {
            vec![Factor::minus(5.0, "Sentiment leaning against trade (-5)")]
        }
    } else {
        Vec::new()
    }
}

fn fractal_pattern(ctx: &FactorCtx) -> Vec<Factor> {
    let fractal = match &ctx.market.fractal {
        Some(f) => f,
        None => return Vec::new(),
    };
    let dir = ctx.setup.direction;

    if dir.agrees_with(fractal.direction) {
        let pts = round1(fractal.confidence.clamp(0.0, 1.0) * 20.0);
        if pts > 0.0 {
            return vec![Factor::plus(
                pts,
                format!(
                    "Fractal match {:.0}% in trade direction (+{:.1})",
                    fractal.confidence * 100.0,
                    pts
                ),
            )];
        }
    } else if dir.conflicts_with(fractal.direction) && fractal.confidence >= 0.7 {
        return vec![Factor::minus(
            15.0,
            format!(
                "Confident fractal match {:.0}% against trade (-15)",
                fractal.confidence * 100.0
            ),
        )];
    }
    Vec::new()
}

fn directional_confidence(ctx: &FactorCtx) -> Vec<Factor> {
    let c = ctx.setup.confidence;
    if c >= 0.7 {
        vec![Factor::plus(
            15.0,
            format!("Detector confidence {:.0}% (+15)", c * 100.0),
        )]
    } else if c < 0.5 {
        vec![Factor::minus(
            20.0,
            format!("Weak detector confidence {:.0}% (-20)", c * 100.0),
        )]
    } else {
        Vec::new()
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
