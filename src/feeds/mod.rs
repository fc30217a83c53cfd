use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CandleSeries, NewsShock, Timeframe};

/// Economic-calendar / news-shock collaborator. Implementations may hit a
/// network or cache; callers treat a failure as "no active shock".
#[async_trait]
pub trait ShockFeed: Send + Sync {
    async fn active_shock(&self, symbol: &str) -> Result<Option<NewsShock>>;
}

/// Market-data collaborator used by lifecycle and risk callers.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn fetch_ohlcv(&self, symbol: &str, tf: Timeframe, limit: usize) -> Result<CandleSeries>;
    async fn current_price(&self, symbol: &str) -> Result<f64>;
}

/// A shock feed that never reports a shock. Useful default for tests and
/// offline scoring runs.
pub struct QuietShockFeed;

#[async_trait]
impl ShockFeed for QuietShockFeed {
    async fn active_shock(&self, _symbol: &str) -> Result<Option<NewsShock>> {
        Ok(None)
    }
}
