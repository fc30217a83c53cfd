use serde::{Deserialize, Serialize};

use crate::models::{Direction, Timeframe};

/// Preferred entry price with an acceptance band around it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntryZone {
    pub optimal: f64,
    pub tolerance: f64,
}

impl EntryZone {
    pub fn contains(&self, price: f64) -> bool {
        (price - self.optimal).abs() <= self.tolerance
    }
}

/// A candidate trade produced by upstream strategy detection. Read-only in
/// the core except for the scorer output slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setup {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub direction: Direction,
    pub strategy: String,
    pub entry: EntryZone,
    pub stop: f64,
    pub targets: Vec<f64>,
    pub risk_reward: f64,
    /// Directional confidence from the detector, 0..1.
    pub confidence: f64,
    #[serde(default)]
    pub edge_score: Option<f64>,
    #[serde(default)]
    pub breakdown: Option<ScoreBreakdown>,
}

impl Setup {
    pub fn first_target(&self) -> Option<f64> {
        self.targets.first().copied()
    }
}

/// Scorer output: clamped 0-10 score plus the audit trail shown to users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub positives: Vec<String>,
    pub risks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_zone_band() {
        let zone = EntryZone {
            optimal: 100.0,
            tolerance: 0.5,
        };
        assert!(zone.contains(100.4));
        assert!(zone.contains(99.5));
        assert!(!zone.contains(100.6));
    }
}
