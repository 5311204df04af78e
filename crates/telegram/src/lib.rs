pub mod message;
pub mod notifier;

pub use message::format_signal_alert;
pub use notifier::{parse_recipient, TelegramNotifier};
