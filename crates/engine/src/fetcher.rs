use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use common::{CandleSource, Error, Series, Timeframe};

use crate::clock::Clock;

/// Fixed-delay retry: `attempts` tries, `delay` between consecutive tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Every attempt failed; `error` is the last one seen.
#[derive(Debug)]
pub struct FetchFailure {
    pub attempts: u32,
    pub error: Error,
}

/// Fetches a fresh series per call, retrying transient failures.
/// An empty response counts as a failure.
pub struct Fetcher {
    source: Arc<dyn CandleSource>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    limit: usize,
}

impl Fetcher {
    pub fn new(
        source: Arc<dyn CandleSource>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
        limit: usize,
    ) -> Self {
        Self {
            source,
            clock,
            policy,
            limit,
        }
    }

    pub async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<Series, FetchFailure> {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.source.fetch_candles(symbol, timeframe, self.limit).await {
                Ok(series) if !series.is_empty() => return Ok(series),
                Ok(_) => Error::Exchange(format!("no candles returned for {symbol}")),
                Err(e) => e,
            };

            if attempt >= attempts {
                return Err(FetchFailure { attempts: attempt, error });
            }
            warn!(%symbol, attempt, of = attempts, error = %error, "Fetch failed, retrying");
            self.clock.sleep(self.policy.delay).await;
        }
    }
}
