use std::collections::HashMap;

use chrono::{DateTime, Utc};

use common::{DuplicatePolicy, Signal, Timeframe};

/// Decides whether a detected signal should be delivered again.
///
/// The exchange keeps returning the same still-forming bar until it closes,
/// so an unchanged (symbol, timeframe, bar) pair can re-fire on every poll.
#[derive(Debug, Default)]
pub struct SignalGate {
    policy: DuplicatePolicy,
    last_delivered: HashMap<(String, Timeframe), DateTime<Utc>>,
}

impl SignalGate {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            last_delivered: HashMap::new(),
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Returns `true` if the signal should go out. Does not record anything;
    /// call `record` once the alert has actually been delivered.
    pub fn should_send(&self, signal: &Signal) -> bool {
        if self.policy == DuplicatePolicy::Resend {
            return true;
        }
        let key = (signal.symbol.clone(), signal.timeframe);
        self.last_delivered.get(&key) != Some(&signal.timestamp)
    }

    /// Mark the signal's bar as delivered.
    pub fn record(&mut self, signal: &Signal) {
        self.last_delivered
            .insert((signal.symbol.clone(), signal.timeframe), signal.timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::SignalKind;

    fn signal(symbol: &str, minute: i64) -> Signal {
        Signal {
            kind: SignalKind::Buy,
            symbol: symbol.into(),
            timeframe: Timeframe::H4,
            timestamp: Utc.timestamp_opt(minute * 60, 0).unwrap(),
            entry_price: 10.0,
            stop_loss: 9.0,
            take_profit_1: 11.0,
            take_profit_2: 11.5,
            rsi_at_signal: 55.0,
            volume: 100.0,
        }
    }

    #[test]
    fn suppress_drops_repeat_for_same_bar() {
        let mut gate = SignalGate::new(DuplicatePolicy::Suppress);
        assert!(gate.should_send(&signal("BTCUSDT", 0)));
        gate.record(&signal("BTCUSDT", 0));
        assert!(!gate.should_send(&signal("BTCUSDT", 0)));
    }

    #[test]
    fn unrecorded_signal_stays_sendable() {
        let gate = SignalGate::new(DuplicatePolicy::Suppress);
        assert!(gate.should_send(&signal("BTCUSDT", 0)));
        assert!(gate.should_send(&signal("BTCUSDT", 0)));
    }

    #[test]
    fn suppress_admits_new_bar_and_other_symbols() {
        let mut gate = SignalGate::new(DuplicatePolicy::Suppress);
        gate.record(&signal("BTCUSDT", 0));
        assert!(gate.should_send(&signal("ETHUSDT", 0)));
        assert!(gate.should_send(&signal("BTCUSDT", 240)));
    }

    #[test]
    fn resend_always_admits() {
        let mut gate = SignalGate::new(DuplicatePolicy::Resend);
        gate.record(&signal("BTCUSDT", 0));
        assert!(gate.should_send(&signal("BTCUSDT", 0)));
    }
}
