use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Candlestick interval, using Binance's interval notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(Error::Config(format!(
                "unsupported timeframe '{other}' (expected one of 1m, 5m, 15m, 30m, 1h, 4h, 1d)"
            ))),
        }
    }
}

/// A single OHLCV candlestick. `timestamp` is the bar's open time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Check the bar's price/volume invariants.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(self.invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }

        if self.high < self.open.max(self.close) {
            return Err(self.invalid(format!(
                "high {} is below open/close",
                self.high
            )));
        }
        if self.low > self.open.min(self.close) {
            return Err(self.invalid(format!("low {} is above open/close", self.low)));
        }
        if self.high < self.low {
            return Err(self.invalid(format!(
                "high {} is below low {}",
                self.high, self.low
            )));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidBar {
            timestamp: self.timestamp,
            reason,
        }
    }
}

/// Ordered OHLCV bars for one (symbol, timeframe) pair.
///
/// Construction validates every bar and requires strictly increasing
/// timestamps. A series is an immutable snapshot: each poll builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<Bar>) -> Result<Self> {
        for bar in &bars {
            bar.validate()?;
        }
        if let Some(w) = bars.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(Error::InvalidSeries(format!(
                "timestamps must be strictly increasing ({} followed by {})",
                w[0].timestamp, w[1].timestamp
            )));
        }

        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        })
    }

    pub fn empty(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

/// Derived indicator values for one bar. `None` means "not enough history"
/// (or, for RSI, a flat window where gain and loss are both zero).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub resistance: Option<f64>,
    pub support: Option<f64>,
}

/// A series with one `IndicatorRow` attached to every bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedSeries {
    series: Series,
    rows: Vec<IndicatorRow>,
}

/// Owned bar + indicators pair, flattened for charting and tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalyzedBar {
    #[serde(flatten)]
    pub bar: Bar,
    #[serde(flatten)]
    pub indicators: IndicatorRow,
}

impl AnalyzedSeries {
    /// Attach indicator rows to a series. Lengths must match.
    pub fn from_parts(series: Series, rows: Vec<IndicatorRow>) -> Result<Self> {
        if series.len() != rows.len() {
            return Err(Error::InvalidSeries(format!(
                "{} bars but {} indicator rows",
                series.len(),
                rows.len()
            )));
        }
        Ok(Self { series, rows })
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }

    pub fn timeframe(&self) -> Timeframe {
        self.series.timeframe()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bar and indicators at `index`, counted from the oldest bar.
    pub fn get(&self, index: usize) -> Option<AnalyzedBar> {
        Some(AnalyzedBar {
            bar: *self.series.bars().get(index)?,
            indicators: *self.rows.get(index)?,
        })
    }

    /// Bar and indicators `back` positions before the latest (0 = latest).
    pub fn from_end(&self, back: usize) -> Option<AnalyzedBar> {
        let index = self.len().checked_sub(back + 1)?;
        self.get(index)
    }

    pub fn latest(&self) -> Option<AnalyzedBar> {
        self.from_end(0)
    }

    /// The last `n` bars, oldest first. `n == 0` returns the whole series.
    pub fn tail(&self, n: usize) -> Vec<AnalyzedBar> {
        let start = if n == 0 { 0 } else { self.len().saturating_sub(n) };
        (start..self.len()).filter_map(|i| self.get(i)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
        }
    }
}

/// Entry signal produced by the breakout evaluator.
///
/// `timestamp` is the open time of the bar the signal was evaluated on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub rsi_at_signal: f64,
    pub volume: f64,
}

impl Signal {
    /// Distance from entry to stop. Zero or negative when support sits at or
    /// above the close.
    pub fn risk(&self) -> f64 {
        self.entry_price - self.stop_loss
    }

    pub fn has_positive_risk(&self) -> bool {
        self.risk() > 0.0
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} [{}] entry {:.2} | SL {:.2} | TP1 {:.2} | TP2 {:.2} | RSI {:.1}",
            self.kind,
            self.symbol,
            self.timeframe,
            self.entry_price,
            self.stop_loss,
            self.take_profit_1,
            self.take_profit_2,
            self.rsi_at_signal,
        )
    }
}

/// What the scheduler does when the same bar produces a signal again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Drop repeats for an unchanged (symbol, timeframe, bar).
    #[default]
    Suppress,
    /// Re-emit on every evaluation.
    Resend,
}

impl FromStr for DuplicatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "suppress" => Ok(DuplicatePolicy::Suppress),
            "resend" => Ok(DuplicatePolicy::Resend),
            other => Err(Error::Config(format!(
                "duplicate policy must be 'suppress' or 'resend', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::Suppress => write!(f, "suppress"),
            DuplicatePolicy::Resend => write!(f, "resend"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(minute: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.timestamp_opt(minute * 60, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn series_accepts_ordered_valid_bars() {
        let bars = vec![bar(0, 10.0, 11.0, 9.0, 10.5), bar(1, 10.5, 12.0, 10.0, 11.0)];
        let series = Series::new("BTCUSDT", Timeframe::M15, bars).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.5, 11.0]);
    }

    #[test]
    fn series_rejects_duplicate_timestamps() {
        let bars = vec![bar(1, 10.0, 11.0, 9.0, 10.5), bar(1, 10.5, 12.0, 10.0, 11.0)];
        assert!(matches!(
            Series::new("BTCUSDT", Timeframe::M15, bars),
            Err(Error::InvalidSeries(_))
        ));
    }

    #[test]
    fn series_rejects_out_of_order_timestamps() {
        let bars = vec![bar(2, 10.0, 11.0, 9.0, 10.5), bar(1, 10.5, 12.0, 10.0, 11.0)];
        assert!(Series::new("BTCUSDT", Timeframe::M15, bars).is_err());
    }

    #[test]
    fn bar_rejects_close_above_high() {
        let b = bar(0, 10.0, 10.5, 9.0, 11.0);
        assert!(matches!(b.validate(), Err(Error::InvalidBar { .. })));
    }

    #[test]
    fn bar_rejects_low_above_open() {
        let b = bar(0, 10.0, 12.0, 10.5, 11.0);
        assert!(b.validate().is_err());
    }

    #[test]
    fn bar_rejects_non_finite_and_negative_values() {
        let mut b = bar(0, 10.0, 11.0, 9.0, 10.0);
        b.volume = f64::NAN;
        assert!(b.validate().is_err());
        b.volume = -1.0;
        assert!(b.validate().is_err());
    }

    #[test]
    fn analyzed_series_requires_matching_lengths() {
        let series =
            Series::new("ETHUSDT", Timeframe::H1, vec![bar(0, 1.0, 1.0, 1.0, 1.0)]).unwrap();
        assert!(AnalyzedSeries::from_parts(series.clone(), vec![]).is_err());
        let analyzed = AnalyzedSeries::from_parts(series, vec![IndicatorRow::default()]).unwrap();
        assert_eq!(analyzed.latest().unwrap().bar.close, 1.0);
        assert!(analyzed.from_end(1).is_none());
    }

    #[test]
    fn tail_zero_returns_everything() {
        let bars = (0..5).map(|i| bar(i, 1.0, 1.0, 1.0, 1.0)).collect();
        let series = Series::new("SOLUSDT", Timeframe::M15, bars).unwrap();
        let analyzed = AnalyzedSeries::from_parts(series, vec![IndicatorRow::default(); 5]).unwrap();
        assert_eq!(analyzed.tail(0).len(), 5);
        assert_eq!(analyzed.tail(2).len(), 2);
        assert_eq!(analyzed.tail(10).len(), 5);
    }

    #[test]
    fn timeframe_round_trips_through_str() {
        for tf in ["1m", "5m", "15m", "30m", "1h", "4h", "1d"] {
            assert_eq!(tf.parse::<Timeframe>().unwrap().as_str(), tf);
        }
        assert!("2w".parse::<Timeframe>().is_err());
    }

    #[test]
    fn signal_risk_may_be_negative() {
        let signal = Signal {
            kind: SignalKind::Buy,
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M15,
            timestamp: Utc::now(),
            entry_price: 100.0,
            stop_loss: 101.0,
            take_profit_1: 99.0,
            take_profit_2: 98.5,
            rsi_at_signal: 55.0,
            volume: 10.0,
        };
        assert_eq!(signal.risk(), -1.0);
        assert!(!signal.has_positive_risk());
    }
}
