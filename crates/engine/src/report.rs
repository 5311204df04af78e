use chrono::{DateTime, Utc};
use serde::Serialize;

use common::{AnalyzedSeries, Signal, Timeframe};

/// What happened to a detected signal on its way to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Sent,
    Failed,
    /// Alerts are switched off.
    Skipped,
    /// Same bar already alerted on a previous cycle.
    Duplicate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Analyzed {
        analysis: AnalyzedSeries,
        signal: Option<Signal>,
        delivery: Option<Delivery>,
    },
    FetchFailed {
        attempts: u32,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolReport {
    pub symbol: String,
    #[serde(flatten)]
    pub outcome: SymbolOutcome,
}

impl SymbolReport {
    pub fn analysis(&self) -> Option<&AnalyzedSeries> {
        match &self.outcome {
            SymbolOutcome::Analyzed { analysis, .. } => Some(analysis),
            SymbolOutcome::FetchFailed { .. } => None,
        }
    }

    pub fn signal(&self) -> Option<&Signal> {
        match &self.outcome {
            SymbolOutcome::Analyzed { signal, .. } => signal.as_ref(),
            SymbolOutcome::FetchFailed { .. } => None,
        }
    }

    pub fn delivery(&self) -> Option<Delivery> {
        match &self.outcome {
            SymbolOutcome::Analyzed { delivery, .. } => *delivery,
            SymbolOutcome::FetchFailed { .. } => None,
        }
    }

    /// One-line human summary for the console.
    pub fn summary(&self) -> String {
        match &self.outcome {
            SymbolOutcome::FetchFailed { attempts, error } => {
                format!("{}: no data after {attempts} attempt(s): {error}", self.symbol)
            }
            SymbolOutcome::Analyzed { analysis, signal, .. } => {
                let Some(latest) = analysis.latest() else {
                    return format!("{}: empty series", self.symbol);
                };
                let ind = latest.indicators;
                let mut line = format!(
                    "{} close {:.2} | EMA {} / {} | RSI {} | R {} | S {}",
                    self.symbol,
                    latest.bar.close,
                    fmt_opt(ind.ema_fast, 2),
                    fmt_opt(ind.ema_slow, 2),
                    fmt_opt(ind.rsi, 1),
                    fmt_opt(ind.resistance, 2),
                    fmt_opt(ind.support, 2),
                );
                if signal.is_some() {
                    line.push_str(" | BUY");
                }
                line
            }
        }
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

/// Result of one poll cycle across all symbols.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub timeframe: Timeframe,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub symbols: Vec<SymbolReport>,
}

impl CycleReport {
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.symbols.iter().filter_map(SymbolReport::signal)
    }

    pub fn failed_symbols(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| matches!(s.outcome, SymbolOutcome::FetchFailed { .. }))
            .count()
    }
}
