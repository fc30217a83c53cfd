use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }

    pub fn as_duration(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::from_secs(60),
            Timeframe::M5 => Duration::from_secs(300),
            Timeframe::M15 => Duration::from_secs(900),
            Timeframe::H1 => Duration::from_secs(3600),
            Timeframe::H4 => Duration::from_secs(14400),
            Timeframe::D1 => Duration::from_secs(86400),
            Timeframe::W1 => Duration::from_secs(604800),
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Timeframe> {
        match s {
            "1m" => Some(Timeframe::M1),
            "5m" => Some(Timeframe::M5),
            "15m" => Some(Timeframe::M15),
            "1h" => Some(Timeframe::H1),
            "4h" => Some(Timeframe::H4),
            "1d" => Some(Timeframe::D1),
            "1w" => Some(Timeframe::W1),
            _ => None,
        }
    }

    pub fn as_seconds(&self) -> u64 {
        self.as_duration().as_secs()
    }

    /// Confluence weight: weekly counts most, sub-hourly least.
    pub fn confluence_weight(&self) -> f64 {
        match self {
            Timeframe::W1 => 5.0,
            Timeframe::D1 => 4.0,
            Timeframe::H4 => 3.0,
            Timeframe::H1 => 2.0,
            Timeframe::M15 | Timeframe::M5 | Timeframe::M1 => 1.0,
        }
    }

    /// 4h and above participate in higher-timeframe consensus.
    pub fn is_higher_timeframe(&self) -> bool {
        matches!(self, Timeframe::H4 | Timeframe::D1 | Timeframe::W1)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trading horizon implied by a setup's timeframe. Drives the minimum
/// acceptable risk:reward and the killzone / higher-timeframe factor weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraderProfile {
    Scalper,
    DayTrader,
    Swing,
}

impl TraderProfile {
    pub fn from_timeframe(tf: Timeframe) -> TraderProfile {
        match tf {
            Timeframe::M1 | Timeframe::M5 | Timeframe::M15 => TraderProfile::Scalper,
            Timeframe::H1 => TraderProfile::DayTrader,
            Timeframe::H4 | Timeframe::D1 | Timeframe::W1 => TraderProfile::Swing,
        }
    }

    pub fn min_rr(&self) -> f64 {
        match self {
            TraderProfile::Scalper => 1.2,
            TraderProfile::DayTrader => 1.5,
            TraderProfile::Swing => 2.0,
        }
    }

    pub fn killzone_weight(&self) -> f64 {
        match self {
            TraderProfile::Scalper => 1.5,
            TraderProfile::DayTrader => 1.2,
            TraderProfile::Swing => 0.5,
        }
    }

    pub fn htf_weight(&self) -> f64 {
        match self {
            TraderProfile::Scalper => 0.7,
            TraderProfile::DayTrader => 1.0,
            TraderProfile::Swing => 1.3,
        }
    }
}

impl fmt::Display for TraderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraderProfile::Scalper => write!(f, "scalper"),
            TraderProfile::DayTrader => write!(f, "day_trader"),
            TraderProfile::Swing => write!(f, "swing"),
        }
    }
}
