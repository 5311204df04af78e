use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use common::{CandleSource, Error, Result, Series, Timeframe};

use super::kline::parse_klines;

/// Relative so that a path prefix on the base URL (a proxy mount) is kept.
const KLINES_PATH: &str = "api/v3/klines";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Error bodies are truncated to keep log lines readable.
const MAX_ERROR_BODY: usize = 200;

/// REST client for Binance's public market-data endpoints.
pub struct BinanceClient {
    base_url: Url,
    http: Client,
}

impl BinanceClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid Binance base URL '{base_url}': {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    pub fn klines_url(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Url> {
        let mut url = self
            .base_url
            .join(KLINES_PATH)
            .map_err(|e| Error::Config(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("symbol", symbol)
            .append_pair("interval", timeframe.as_str())
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }
}

#[async_trait]
impl CandleSource for BinanceClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Series> {
        let url = self.klines_url(symbol, timeframe, limit)?;
        debug!(%symbol, %timeframe, limit, "Fetching klines");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(Error::Exchange(format!("HTTP {status}: {snippet}")));
        }

        parse_klines(symbol, timeframe, &body)
    }
}
