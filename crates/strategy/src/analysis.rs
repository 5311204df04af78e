use common::{AnalyzedSeries, IndicatorRow, Series};

use crate::config::StrategyParams;
use crate::indicators::{ema, resistance, rsi, support};

/// Compute one `IndicatorRow` per bar. Empty input yields empty output.
pub fn compute_indicators(series: &Series, params: &StrategyParams) -> Vec<IndicatorRow> {
    if series.is_empty() {
        return Vec::new();
    }

    let closes = series.closes();
    let ema_fast = ema(&closes, params.ema_fast_span);
    let ema_slow = ema(&closes, params.ema_slow_span);
    let rsi = rsi(&closes, params.rsi_period);
    let resistance = resistance(&series.highs(), params.sr_period);
    let support = support(&series.lows(), params.sr_period);

    (0..series.len())
        .map(|i| IndicatorRow {
            ema_fast: ema_fast.get(i).copied(),
            ema_slow: ema_slow.get(i).copied(),
            rsi: rsi[i],
            resistance: resistance[i],
            support: support[i],
        })
        .collect()
}

/// Attach freshly computed indicators to a series snapshot.
pub fn analyze(series: Series, params: &StrategyParams) -> AnalyzedSeries {
    let rows = compute_indicators(&series, params);
    // lengths match by construction
    match AnalyzedSeries::from_parts(series, rows) {
        Ok(analyzed) => analyzed,
        Err(e) => unreachable!("indicator rows out of step with bars: {e}"),
    }
}
