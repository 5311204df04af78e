use async_trait::async_trait;

use crate::{Result, Series, Timeframe};

/// Abstraction over the candlestick data provider.
///
/// `BinanceClient` in `crates/engine` implements this against the public
/// klines endpoint. Tests substitute in-memory sources.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch the most recent `limit` bars for a symbol/timeframe pair,
    /// oldest first. The returned series is already validated.
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize)
        -> Result<Series>;
}
