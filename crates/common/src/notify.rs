use async_trait::async_trait;
use tracing::debug;

use crate::Signal;

/// Push-notification sink for signal alerts.
///
/// Delivery failures are reported through the return value only. Callers log
/// them and carry on; a failed send never un-detects a signal.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a text message. Returns `true` if the message was accepted.
    async fn send(&self, message: &str) -> bool;

    /// Deliver a signal alert. The default renders the signal as plain text.
    async fn notify_signal(&self, signal: &Signal) -> bool {
        self.send(&signal.to_string()).await
    }

    /// `false` when messages are dropped unconditionally.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Notifier used when alerts are switched off. Drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, message: &str) -> bool {
        debug!(len = message.len(), "Alerts disabled, message dropped");
        false
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_notifier_reports_failure() {
        assert!(!DisabledNotifier.send("hello").await);
    }
}
