/// Exponential moving average, recursive ("adjust=false") form.
///
/// α = 2 / (span + 1), seeded with the first value:
/// `ema[0] = x[0]`, `ema[i] = α·x[i] + (1 − α)·ema[i−1]`.
///
/// Returns an empty vec when `span == 0`.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);

    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &x in values {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}
