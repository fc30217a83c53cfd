use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Direction, EntryZone, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Active,
    /// Highest take-profit index reached so far (1-based).
    HitTp(usize),
    StoppedOut,
    Expired,
}

impl SignalStatus {
    /// Stopped-out and expired signals are never resurrected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SignalStatus::StoppedOut | SignalStatus::Expired)
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStatus::Active => write!(f, "active"),
            SignalStatus::HitTp(n) => write!(f, "hit_tp{}", n),
            SignalStatus::StoppedOut => write!(f, "stopped_out"),
            SignalStatus::Expired => write!(f, "expired"),
        }
    }
}

/// A gated cross-timeframe publication. Created only by the confluence
/// validator; mutated only by the lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    /// Timeframe whose setup supplied the entry/targets/stop.
    pub timeframe: Timeframe,
    pub entry: EntryZone,
    pub targets: Vec<f64>,
    pub stop: f64,
    pub confluence_score: f64,
    pub breakdown: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    pub status: SignalStatus,
    /// Only ever tightens toward price; never loosens.
    #[serde(default)]
    pub trailing_stop: Option<f64>,
    #[serde(default)]
    pub management_updates: Vec<String>,
    #[serde(default)]
    pub partial_tp_advised: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Signal {
    /// The stop the market has to cross to invalidate the signal.
    pub fn effective_stop(&self) -> f64 {
        self.trailing_stop.unwrap_or(self.stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!SignalStatus::Active.is_terminal());
        assert!(!SignalStatus::HitTp(2).is_terminal());
        assert!(SignalStatus::StoppedOut.is_terminal());
        assert!(SignalStatus::Expired.is_terminal());
    }

    #[test]
    fn status_display() {
        assert_eq!(SignalStatus::HitTp(3).to_string(), "hit_tp3");
        assert_eq!(SignalStatus::StoppedOut.to_string(), "stopped_out");
    }
}
