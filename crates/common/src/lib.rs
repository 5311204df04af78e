pub mod config;
pub mod error;
pub mod market;
pub mod notify;
pub mod types;

pub use config::{Config, DashboardConfig, TelegramConfig};
pub use error::{Error, Result};
pub use market::CandleSource;
pub use notify::{DisabledNotifier, Notifier};
pub use types::*;
