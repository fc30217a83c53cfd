use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{Bias, Direction, Regime, Timeframe};

/// Per-symbol/timeframe analytics captured at one instant by the upstream
/// feature engines. Every family is optional: an absent field means the
/// corresponding scoring factor simply does not apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStateSnapshot {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub trend: Option<TrendState>,
    #[serde(default)]
    pub regime: Option<Regime>,
    #[serde(default)]
    pub mtf: Option<MtfState>,
    #[serde(default)]
    pub sentiment: Option<SentimentState>,
    #[serde(default)]
    pub volume: Option<VolumeState>,
    #[serde(default)]
    pub smt: Option<SmtState>,
    #[serde(default)]
    pub session: Option<SessionState>,
    #[serde(default)]
    pub magnets: Option<Vec<LiquidityMagnet>>,
    #[serde(default)]
    pub order_flow: Option<OrderFlowState>,
    #[serde(default)]
    pub volume_profile: Option<VolumeProfileState>,
    #[serde(default)]
    pub macro_bias: Option<MacroState>,
    #[serde(default)]
    pub correlation: Option<CorrelationState>,
    #[serde(default)]
    pub order_book: Option<OrderBookState>,
    #[serde(default)]
    pub news_shock: Option<NewsShock>,
    #[serde(default)]
    pub trap_zones: Option<TrapZones>,
    #[serde(default)]
    pub cycle: Option<CycleState>,
    #[serde(default)]
    pub sweep: Option<SweepState>,
    #[serde(default)]
    pub alpha: Option<AlphaState>,
    #[serde(default)]
    pub momentum: Option<MomentumState>,
    #[serde(default)]
    pub fractal: Option<FractalState>,
}

impl MarketStateSnapshot {
    /// An empty snapshot: every factor reads as "does not apply".
    pub fn bare(symbol: &str, timeframe: Timeframe, captured_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe,
            captured_at,
            trend: None,
            regime: None,
            mtf: None,
            sentiment: None,
            volume: None,
            smt: None,
            session: None,
            magnets: None,
            order_flow: None,
            volume_profile: None,
            macro_bias: None,
            correlation: None,
            order_book: None,
            news_shock: None,
            trap_zones: None,
            cycle: None,
            sweep: None,
            alpha: None,
            momentum: None,
            fractal: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendState {
    pub direction: Bias,
    #[serde(default)]
    pub strength: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MtfState {
    pub global_bias: Bias,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentState {
    pub label: Bias,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeState {
    pub is_institutional: bool,
    #[serde(default)]
    pub participation: Option<f64>,
}

/// Inter-market (SMT) divergence read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtState {
    #[serde(default)]
    pub direction: Option<Bias>,
    /// 0-100 agreement across correlated pairs.
    pub confluence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub in_killzone: bool,
    pub utc_hour: u32,
}

impl SessionState {
    /// London/NY opens where institutional participation peaks.
    pub fn is_power_hour(&self) -> bool {
        matches!(self.utc_hour, 8 | 9 | 13 | 14)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityMagnet {
    pub price: f64,
    /// 0-100; above 80 the magnet is treated as an active draw.
    pub urgency: f64,
    pub implied: Bias,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFlowState {
    #[serde(default)]
    pub icebergs: Vec<IcebergWall>,
    #[serde(default)]
    pub absorption: Option<Bias>,
    #[serde(default)]
    pub cvd_bias: Option<Bias>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcebergWall {
    pub price: f64,
    pub side: Bias,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeProfileState {
    #[serde(default)]
    pub poc: Option<f64>,
    #[serde(default)]
    pub npoc: Option<f64>,
    #[serde(default)]
    pub dom_wall: Option<Bias>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroState {
    pub verdict: Bias,
    pub action: MacroAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroAction {
    Veto,
    Boost,
    #[serde(rename = "none")]
    None_,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationState {
    pub risk: CorrelationRisk,
    #[serde(default)]
    pub cluster: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationRisk {
    Normal,
    High,
    Extreme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookState {
    pub alignment: Bias,
    /// Depth imbalance strength, 0-10.
    pub depth_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsShock {
    pub severity: ShockSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShockSeverity {
    High,
    Medium,
    Low,
}

impl fmt::Display for ShockSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShockSeverity::High => write!(f, "high"),
            ShockSeverity::Medium => write!(f, "medium"),
            ShockSeverity::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrapZones {
    #[serde(default)]
    pub bull_traps: Vec<TrapZone>,
    #[serde(default)]
    pub bear_traps: Vec<TrapZone>,
}

impl TrapZones {
    /// Traps that punish entries in the given direction.
    pub fn against(&self, direction: Direction) -> &[TrapZone] {
        match direction {
            Direction::Bullish => &self.bull_traps,
            Direction::Bearish => &self.bear_traps,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bull_traps.is_empty() && self.bear_traps.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrapZone {
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleState {
    pub phase: CyclePhase,
    #[serde(default)]
    pub direction: Option<Bias>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Accumulation,
    Manipulation,
    Distribution,
    Expansion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepState {
    pub direction: Bias,
    pub recent: bool,
}

/// Aggregated sub-engine health from the alpha monitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlphaState {
    #[serde(default)]
    pub engines: BTreeMap<String, EngineStatus>,
    #[serde(default)]
    pub leaks: Vec<AlphaLeak>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Institutional,
    HighAlpha,
    Stable,
    Degrading,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaLeak {
    pub source: String,
    pub severity: ShockSeverity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MomentumState {
    #[serde(default)]
    pub stochastic: Option<StochasticState>,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub macd_hist_slope: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StochasticState {
    #[serde(default)]
    pub bullish_cross: bool,
    #[serde(default)]
    pub bearish_cross: bool,
    #[serde(default)]
    pub oversold: bool,
    #[serde(default)]
    pub overbought: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FractalState {
    pub direction: Bias,
    /// Pattern-match confidence, 0..1.
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn bare_snapshot_has_no_factors() {
        let snap = MarketStateSnapshot::bare("BTC-USD", Timeframe::H1, Utc::now());
        assert!(snap.trend.is_none());
        assert!(snap.alpha.is_none());
        assert!(snap.trap_zones.is_none());
    }

    #[test]
    fn power_hours() {
        for hour in [8, 9, 13, 14] {
            let s = SessionState {
                in_killzone: true,
                utc_hour: hour,
            };
            assert!(s.is_power_hour(), "hour {hour}");
        }
        let s = SessionState {
            in_killzone: true,
            utc_hour: 11,
        };
        assert!(!s.is_power_hour());
    }

    #[test]
    fn traps_select_by_direction() {
        let traps = TrapZones {
            bull_traps: vec![TrapZone { price: 100.0 }],
            bear_traps: vec![],
        };
        assert_eq!(traps.against(Direction::Bullish).len(), 1);
        assert!(traps.against(Direction::Bearish).is_empty());
    }
}
