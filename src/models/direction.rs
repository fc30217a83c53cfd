use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
        }
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
        }
    }

    pub fn as_bias(&self) -> Bias {
        match self {
            Direction::Bullish => Bias::Bullish,
            Direction::Bearish => Bias::Bearish,
        }
    }

    /// True when `bias` points the same way as this trade direction.
    pub fn agrees_with(&self, bias: Bias) -> bool {
        self.as_bias() == bias
    }

    /// True when `bias` points the opposite way (neutral is neither).
    pub fn conflicts_with(&self, bias: Bias) -> bool {
        self.opposite().as_bias() == bias
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Bullish => write!(f, "bullish"),
            Bias::Bearish => write!(f, "bearish"),
            Bias::Neutral => write!(f, "neutral"),
        }
    }
}

impl Bias {
    pub fn to_direction(self) -> Option<Direction> {
        match self {
            Bias::Bullish => Some(Direction::Bullish),
            Bias::Bearish => Some(Direction::Bearish),
            Bias::Neutral => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Trending,
    Ranging,
    Volatile,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Trending => write!(f, "trending"),
            Regime::Ranging => write!(f, "ranging"),
            Regime::Volatile => write!(f, "volatile"),
        }
    }
}

/// Confidence tier reported by the credibility engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredibilityLabel {
    Premium,
    Strong,
    Neutral,
}

impl fmt::Display for CredibilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredibilityLabel::Premium => write!(f, "premium"),
            CredibilityLabel::Strong => write!(f, "strong"),
            CredibilityLabel::Neutral => write!(f, "neutral"),
        }
    }
}

/// Quality tier attached to a published prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeLabel {
    Premium,
    Strong,
    Tradable,
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeLabel::Premium => write!(f, "premium"),
            EdgeLabel::Strong => write!(f, "strong"),
            EdgeLabel::Tradable => write!(f, "tradable"),
        }
    }
}

impl EdgeLabel {
    /// Tier for a 0-10 edge score.
    pub fn from_score(score: f64) -> EdgeLabel {
        if score >= 8.5 {
            EdgeLabel::Premium
        } else if score >= 7.0 {
            EdgeLabel::Strong
        } else {
            EdgeLabel::Tradable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_bias_bridges() {
        assert_eq!(Direction::Bullish.as_bias(), Bias::Bullish);
        assert_eq!(Direction::Bullish.opposite(), Direction::Bearish);
        assert_eq!(Bias::Bearish.to_direction(), Some(Direction::Bearish));
        assert_eq!(Bias::Neutral.to_direction(), None);
    }

    #[test]
    fn agreement_checks() {
        assert!(Direction::Bullish.agrees_with(Bias::Bullish));
        assert!(!Direction::Bullish.agrees_with(Bias::Neutral));
        assert!(Direction::Bullish.conflicts_with(Bias::Bearish));
        assert!(!Direction::Bullish.conflicts_with(Bias::Neutral));
    }

    #[test]
    fn edge_label_tiers() {
        assert_eq!(EdgeLabel::from_score(9.0), EdgeLabel::Premium);
        assert_eq!(EdgeLabel::from_score(7.5), EdgeLabel::Strong);
        assert_eq!(EdgeLabel::from_score(4.0), EdgeLabel::Tradable);
    }
}
