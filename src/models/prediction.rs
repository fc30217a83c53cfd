use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Bias, EdgeLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PredictionOutcome {
    #[default]
    Pending,
    Hit,
    Fail,
    Expired,
}

impl PredictionOutcome {
    /// Terminal outcomes are write-once.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PredictionOutcome::Pending)
    }
}

impl fmt::Display for PredictionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionOutcome::Pending => write!(f, "pending"),
            PredictionOutcome::Hit => write!(f, "hit"),
            PredictionOutcome::Fail => write!(f, "fail"),
            PredictionOutcome::Expired => write!(f, "expired"),
        }
    }
}

/// A scored, non-suppressed setup frozen at publish time, evaluated later
/// against realized price action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub symbol: String,
    pub bias: Bias,
    pub target_price: f64,
    pub invalidation_price: f64,
    pub published_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub strategy: String,
    pub edge_label: EdgeLabel,
    pub snapshot_price: f64,
    #[serde(default)]
    pub outcome: PredictionOutcome,
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_only_open_state() {
        assert!(!PredictionOutcome::Pending.is_terminal());
        assert!(PredictionOutcome::Hit.is_terminal());
        assert!(PredictionOutcome::Fail.is_terminal());
        assert!(PredictionOutcome::Expired.is_terminal());
    }
}
