use serde::Serialize;
use tracing::debug;

use common::{AnalyzedBar, AnalyzedSeries, Signal, SignalKind};

use crate::config::{BreakoutLevel, StrategyParams};
use crate::indicators::rolling_mean;

/// Per-condition outcome of the breakout rule on the latest bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuyConditions {
    /// Close above rolling resistance.
    pub breakout: bool,
    /// Volume above the rolling volume average times the multiplier.
    pub volume_surge: bool,
    /// Fast EMA above slow EMA.
    pub trend: bool,
    /// RSI accepted by the configured filter.
    pub momentum: bool,
    /// Fast EMA was at or below slow EMA on the previous bar.
    pub crossover: bool,
}

impl BuyConditions {
    pub fn all(&self) -> bool {
        self.breakout && self.volume_surge && self.trend && self.momentum && self.crossover
    }
}

/// Long-only breakout evaluator.
///
/// Stateless: evaluating the same series twice returns the same result.
/// De-duplication across poll cycles is the scheduler's job.
#[derive(Debug, Clone)]
pub struct BreakoutEvaluator {
    params: StrategyParams,
}

impl BreakoutEvaluator {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Check each condition on the latest two bars. `None` when the series is
    /// shorter than `min_history`.
    pub fn conditions(&self, analyzed: &AnalyzedSeries) -> Option<BuyConditions> {
        if analyzed.len() < self.params.min_history.max(2) {
            return None;
        }
        let latest = analyzed.latest()?;
        let prev = analyzed.from_end(1)?;

        let volumes = analyzed.series().volumes();
        let avg_volume = rolling_mean(&volumes, self.params.volume_window)
            .last()
            .copied()
            .flatten();

        let level = match self.params.breakout_level {
            BreakoutLevel::Inclusive => latest.indicators.resistance,
            BreakoutLevel::Prior => prev.indicators.resistance,
        };

        Some(BuyConditions {
            breakout: level.is_some_and(|r| latest.bar.close > r),
            volume_surge: avg_volume
                .is_some_and(|avg| latest.bar.volume > avg * self.params.volume_multiplier),
            trend: gt(latest.indicators.ema_fast, latest.indicators.ema_slow),
            momentum: latest
                .indicators
                .rsi
                .is_some_and(|rsi| self.params.rsi_filter.accepts(rsi)),
            crossover: le(prev.indicators.ema_fast, prev.indicators.ema_slow),
        })
    }

    /// Evaluate the latest bar and build a BUY signal if every condition holds.
    pub fn evaluate(&self, analyzed: &AnalyzedSeries) -> Option<Signal> {
        let conditions = self.conditions(analyzed)?;
        if !conditions.all() {
            debug!(symbol = %analyzed.symbol(), ?conditions, "No entry");
            return None;
        }
        build_signal(analyzed, &analyzed.latest()?)
    }
}

fn build_signal(analyzed: &AnalyzedSeries, latest: &AnalyzedBar) -> Option<Signal> {
    let close = latest.bar.close;
    let support = latest.indicators.support?;
    let rsi = latest.indicators.rsi?;
    // may be zero or negative in flat markets; passed through unchanged
    let risk = close - support;

    Some(Signal {
        kind: SignalKind::Buy,
        symbol: analyzed.symbol().to_string(),
        timeframe: analyzed.timeframe(),
        timestamp: latest.bar.timestamp,
        entry_price: close,
        stop_loss: support,
        take_profit_1: close + risk,
        take_profit_2: close + 1.5 * risk,
        rsi_at_signal: rsi,
        volume: latest.bar.volume,
    })
}

fn gt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

fn le(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a <= b)
}
