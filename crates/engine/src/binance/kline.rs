use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use common::{Bar, Error, Result, Series, Timeframe};

/// Number of positional fields in a `/api/v3/klines` row.
pub const KLINE_FIELDS: usize = 12;

// ─── Row schema ───────────────────────────────────────────────────────────────

const OPEN_TIME: (usize, &str) = (0, "open_time");
const OPEN: (usize, &str) = (1, "open");
const HIGH: (usize, &str) = (2, "high");
const LOW: (usize, &str) = (3, "low");
const CLOSE: (usize, &str) = (4, "close");
const VOLUME: (usize, &str) = (5, "volume");
const CLOSE_TIME: (usize, &str) = (6, "close_time");
const QUOTE_VOLUME: (usize, &str) = (7, "quote_asset_volume");
const TRADES: (usize, &str) = (8, "number_of_trades");
const TAKER_BUY_BASE: (usize, &str) = (9, "taker_buy_base_volume");
const TAKER_BUY_QUOTE: (usize, &str) = (10, "taker_buy_quote_volume");
// index 11 is an unused field Binance always sends

/// One decoded kline row, every field addressed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct KlineRow {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
    pub quote_volume: f64,
    pub trades: u64,
    pub taker_buy_base_volume: f64,
    pub taker_buy_quote_volume: f64,
}

impl KlineRow {
    /// Decode a positional row. Fails fast when the field count differs from
    /// the schema or any field has the wrong shape.
    pub fn from_values(row: usize, values: &[Value]) -> Result<Self> {
        if values.len() != KLINE_FIELDS {
            return Err(Error::KlineSchema {
                row,
                expected: KLINE_FIELDS,
                found: values.len(),
            });
        }
        let cells = Cells { row, values };

        Ok(Self {
            open_time: cells.millis(OPEN_TIME)?,
            open: cells.decimal(OPEN)?,
            high: cells.decimal(HIGH)?,
            low: cells.decimal(LOW)?,
            close: cells.decimal(CLOSE)?,
            volume: cells.decimal(VOLUME)?,
            close_time: cells.millis(CLOSE_TIME)?,
            quote_volume: cells.decimal(QUOTE_VOLUME)?,
            trades: cells.integer(TRADES)?,
            taker_buy_base_volume: cells.decimal(TAKER_BUY_BASE)?,
            taker_buy_quote_volume: cells.decimal(TAKER_BUY_QUOTE)?,
        })
    }

    pub fn to_bar(&self) -> Bar {
        Bar {
            timestamp: self.open_time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

struct Cells<'a> {
    row: usize,
    values: &'a [Value],
}

impl Cells<'_> {
    fn error(&self, (index, field): (usize, &'static str), reason: String) -> Error {
        Error::KlineField {
            row: self.row,
            index,
            field,
            reason,
        }
    }

    /// Prices and volumes arrive as decimal strings; bare numbers are accepted too.
    fn decimal(&self, at: (usize, &'static str)) -> Result<f64> {
        let parsed = match &self.values[at.0] {
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            other => return Err(self.error(at, format!("expected decimal, got {other}"))),
        };
        match parsed {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(self.error(at, format!("not a finite number: {}", self.values[at.0]))),
        }
    }

    fn integer(&self, at: (usize, &'static str)) -> Result<u64> {
        self.values[at.0]
            .as_u64()
            .ok_or_else(|| self.error(at, format!("expected integer, got {}", self.values[at.0])))
    }

    fn millis(&self, at: (usize, &'static str)) -> Result<DateTime<Utc>> {
        let ms = self.values[at.0]
            .as_i64()
            .ok_or_else(|| self.error(at, format!("expected epoch millis, got {}", self.values[at.0])))?;
        Utc.timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| self.error(at, format!("timestamp out of range: {ms}")))
    }
}

/// Parse a klines response body into a validated series.
pub fn parse_klines(symbol: &str, timeframe: Timeframe, body: &str) -> Result<Series> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    let bars = rows
        .iter()
        .enumerate()
        .map(|(i, values)| KlineRow::from_values(i, values).map(|k| k.to_bar()))
        .collect::<Result<Vec<_>>>()?;
    Series::new(symbol, timeframe, bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[
        [1700000000000, "37000.10", "37100.00", "36950.00", "37050.55", "12.5",
         1700000899999, "463000.0", 420, "6.1", "226000.0", "0"],
        [1700000900000, "37050.55", "37200.00", "37000.00", "37180.00", "20.25",
         1700001799999, "752000.0", 512, "11.0", "409000.0", "0"]
    ]"#;

    #[test]
    fn parses_named_fields() {
        let series = parse_klines("BTCUSDT", Timeframe::M15, BODY).unwrap();
        assert_eq!(series.len(), 2);
        let first = series.bars()[0];
        assert_eq!(first.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(first.open, 37000.10);
        assert_eq!(first.high, 37100.00);
        assert_eq!(first.low, 36950.00);
        assert_eq!(first.close, 37050.55);
        assert_eq!(first.volume, 12.5);
        assert_eq!(series.symbol(), "BTCUSDT");
    }

    #[test]
    fn row_keeps_auxiliary_fields() {
        let rows: Vec<Vec<Value>> = serde_json::from_str(BODY).unwrap();
        let row = KlineRow::from_values(1, &rows[1]).unwrap();
        assert_eq!(row.trades, 512);
        assert_eq!(row.quote_volume, 752000.0);
        assert_eq!(row.close_time.timestamp_millis(), 1_700_001_799_999);
    }

    #[test]
    fn empty_array_is_empty_series() {
        let series = parse_klines("BTCUSDT", Timeframe::H1, "[]").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn wrong_field_count_is_schema_error() {
        let body = r#"[[1700000000000, "1", "1", "1", "1", "1", 1700000899999]]"#;
        match parse_klines("BTCUSDT", Timeframe::M15, body) {
            Err(Error::KlineSchema { row, expected, found }) => {
                assert_eq!((row, expected, found), (0, 12, 7));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn unparsable_price_names_the_field() {
        let body = r#"[[1700000000000, "1", "abc", "1", "1", "1",
                        1700000899999, "1", 1, "1", "1", "0"]]"#;
        match parse_klines("BTCUSDT", Timeframe::M15, body) {
            Err(Error::KlineField { field, index, .. }) => {
                assert_eq!(field, "high");
                assert_eq!(index, 2);
            }
            other => panic!("expected field error, got {other:?}"),
        }
    }

    #[test]
    fn string_timestamp_rejected() {
        let body = r#"[["1700000000000", "1", "1", "1", "1", "1",
                        1700000899999, "1", 1, "1", "1", "0"]]"#;
        assert!(matches!(
            parse_klines("BTCUSDT", Timeframe::M15, body),
            Err(Error::KlineField { field: "open_time", .. })
        ));
    }

    #[test]
    fn non_array_body_is_json_error() {
        let body = r#"{"code": -1121, "msg": "Invalid symbol."}"#;
        assert!(matches!(
            parse_klines("NOPE", Timeframe::M15, body),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn inconsistent_bar_rejected() {
        // high below close
        let body = r#"[[1700000000000, "10", "10", "9", "11", "1",
                        1700000899999, "1", 1, "1", "1", "0"]]"#;
        assert!(matches!(
            parse_klines("BTCUSDT", Timeframe::M15, body),
            Err(Error::InvalidBar { .. })
        ));
    }
}
