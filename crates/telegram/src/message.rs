use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use common::Signal;

/// Render a signal as a Telegram HTML message.
///
/// `now` is the wall-clock time shown at the bottom of the alert.
pub fn format_signal_alert<Tz>(signal: &Signal, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut text = format!(
        "🚀 <b>{kind} SIGNAL - {symbol}</b> 🚀\n\
         ⏳ Timeframe: {timeframe}\n\
         💵 Price: {entry:.2}\n\
         🔴 Stop Loss: {stop:.2}\n\
         🟢 Take Profit 1: {tp1:.2}\n\
         🟢 Take Profit 2: {tp2:.2}\n\
         📊 Volume: {volume:.0}\n\
         📈 RSI: {rsi:.1}\n",
        kind = signal.kind,
        symbol = escape_html(&signal.symbol),
        timeframe = signal.timeframe,
        entry = signal.entry_price,
        stop = signal.stop_loss,
        tp1 = signal.take_profit_1,
        tp2 = signal.take_profit_2,
        volume = signal.volume,
        rsi = signal.rsi_at_signal,
    );
    if !signal.has_positive_risk() {
        text.push_str(&format!(
            "⚠️ Support is at or above entry (risk {:.2}); targets are not above entry.\n",
            signal.risk()
        ));
    }
    text.push_str(&format!("⏰ {}", now.format("%d/%m %H:%M")));
    text
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
