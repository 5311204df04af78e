/// RSI (Relative Strength Index) with a simple rolling mean of gains/losses.
///
/// This is the cutler-style variant, not Wilder smoothing. Position `i` uses
/// the `period` price changes ending at `i`, so it is defined from
/// `i == period` onwards.
///
/// Division policy:
/// - avg_loss == 0, avg_gain > 0 → 100.0
/// - avg_loss == 0, avg_gain == 0 (flat window) → `None`
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    for (i, slot) in out.iter_mut().enumerate().skip(period) {
        // deltas[j] is the change into bar j + 1
        let window = &deltas[i - period..i];
        let avg_gain = window.iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
        let avg_loss = window.iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;
        *slot = from_averages(avg_gain, avg_loss);
    }
    out
}

fn from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { None } else { Some(100.0) };
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}
