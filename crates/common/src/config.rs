use std::time::Duration;

use crate::{DuplicatePolicy, Error, Result, Timeframe};

const DEFAULT_SYMBOLS: &str = "BTCUSDT,ETHUSDT,SOLUSDT";
const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";

/// Telegram alert destination. Present only when both token and chat id are set.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    /// Numeric chat id or `@channelusername`.
    pub chat_id: String,
    /// Send a test message at startup.
    pub test_on_start: bool,
}

/// Dashboard settings. Present only when `DASHBOARD_TOKEN` is set.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub token: String,
    pub port: u16,
}

/// All process configuration, loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Market
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    pub binance_base_url: String,

    // Polling
    pub poll_interval: Duration,
    pub fetch_limit: usize,
    pub fetch_retries: u32,
    pub fetch_retry_delay: Duration,

    // Alerts
    pub telegram: Option<TelegramConfig>,
    pub duplicate_policy: DuplicatePolicy,

    // Dashboard
    pub dashboard: Option<DashboardConfig>,

    // Strategy parameter file path
    pub strategy_config_path: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut symbols: Vec<String> = Vec::new();
        for symbol in get("SYMBOLS")
            .unwrap_or_else(|| DEFAULT_SYMBOLS.to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
        {
            // first occurrence wins, order kept
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        if symbols.is_empty() {
            return Err(Error::Config("SYMBOLS must name at least one pair".into()));
        }

        let timeframe = match get("TIMEFRAME") {
            Some(v) => v.parse()?,
            None => Timeframe::M15,
        };

        let telegram = match (get("TELEGRAM_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig {
                token,
                chat_id: chat_id.trim().to_string(),
                test_on_start: parse_or("TELEGRAM_TEST_ON_START", get("TELEGRAM_TEST_ON_START"), false)?,
            }),
            _ => None,
        };

        let dashboard = match get("DASHBOARD_TOKEN") {
            Some(token) => Some(DashboardConfig {
                token,
                port: parse_or("DASHBOARD_PORT", get("DASHBOARD_PORT"), 8080)?,
            }),
            None => None,
        };

        let duplicate_policy = match get("SIGNAL_DUPLICATES") {
            Some(v) => v.parse()?,
            None => DuplicatePolicy::default(),
        };

        let fetch_retries: u32 = parse_or("FETCH_RETRIES", get("FETCH_RETRIES"), 3)?;
        if fetch_retries == 0 {
            return Err(Error::Config("FETCH_RETRIES must be at least 1".into()));
        }

        let fetch_limit: usize = parse_or("FETCH_LIMIT", get("FETCH_LIMIT"), 100)?;
        if !(1..=1000).contains(&fetch_limit) {
            return Err(Error::Config(format!(
                "FETCH_LIMIT must be between 1 and 1000, got {fetch_limit}"
            )));
        }

        let poll_secs: u64 = parse_or("POLL_INTERVAL_SECS", get("POLL_INTERVAL_SECS"), 60)?;
        if poll_secs == 0 {
            return Err(Error::Config("POLL_INTERVAL_SECS must be positive".into()));
        }

        Ok(Config {
            symbols,
            timeframe,
            binance_base_url: get("BINANCE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BINANCE_URL.to_string()),
            poll_interval: Duration::from_secs(poll_secs),
            fetch_limit,
            fetch_retries,
            fetch_retry_delay: Duration::from_secs(parse_or(
                "FETCH_RETRY_DELAY_SECS",
                get("FETCH_RETRY_DELAY_SECS"),
                5,
            )?),
            telegram,
            duplicate_policy,
            dashboard,
            strategy_config_path: get("STRATEGY_CONFIG_PATH"),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{}'", v.trim()))),
        None => Ok(default),
    }
}
