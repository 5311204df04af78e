pub mod analysis;
pub mod config;
pub mod evaluator;
pub mod indicators;

pub use analysis::{analyze, compute_indicators};
pub use config::{BreakoutLevel, RsiFilter, StrategyParams};
pub use evaluator::{BreakoutEvaluator, BuyConditions};

use common::{AnalyzedSeries, Series, Signal};

/// A signal strategy: derives indicators from a series snapshot and decides
/// whether the latest bar is an entry.
pub trait Strategy: Send + Sync {
    /// Human-readable name used in logs and the dashboard.
    fn name(&self) -> &str;

    /// Compute indicators for a fresh series snapshot.
    fn analyze(&self, series: Series) -> AnalyzedSeries;

    /// Evaluate the latest bar. Returns `None` if no entry is present.
    fn evaluate(&self, analyzed: &AnalyzedSeries) -> Option<Signal>;

    /// Parameters in effect, for display.
    fn params(&self) -> &StrategyParams;
}

/// The EMA-crossover breakout strategy.
#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    evaluator: BreakoutEvaluator,
}

impl BreakoutStrategy {
    pub fn new(params: StrategyParams) -> Self {
        Self {
            evaluator: BreakoutEvaluator::new(params),
        }
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &str {
        "ema-breakout"
    }

    fn analyze(&self, series: Series) -> AnalyzedSeries {
        analyze(series, self.evaluator.params())
    }

    fn evaluate(&self, analyzed: &AnalyzedSeries) -> Option<Signal> {
        self.evaluator.evaluate(analyzed)
    }

    fn params(&self) -> &StrategyParams {
        self.evaluator.params()
    }
}
