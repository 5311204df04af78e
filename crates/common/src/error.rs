use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A kline row did not have the number of fields the schema expects.
    #[error("Kline row {row} has {found} fields, expected {expected}")]
    KlineSchema {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A kline field was present but could not be decoded.
    #[error("Kline row {row}, field '{field}' (index {index}): {reason}")]
    KlineField {
        row: usize,
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error("Invalid bar at {timestamp}: {reason}")]
    InvalidBar {
        timestamp: DateTime<Utc>,
        reason: String,
    },

    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
