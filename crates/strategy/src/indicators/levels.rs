//! Rolling window helpers and support/resistance levels.
//!
//! Windows are trailing and include the current element; position `i` is
//! defined once `i + 1 >= window`.

fn rolling(values: &[f64], window: usize, reduce: impl Fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                Some(reduce(&values[i + 1 - window..=i]))
            }
        })
        .collect()
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Simple arithmetic mean over the trailing window.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Rolling high of the bar highs.
pub fn resistance(highs: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_max(highs, window)
}

/// Rolling low of the bar lows.
pub fn support(lows: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_min(lows, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resistance_window_3() {
        let out = resistance(&[1.0, 5.0, 3.0, 7.0, 2.0], 3);
        assert_eq!(out, vec![None, None, Some(5.0), Some(7.0), Some(7.0)]);
    }

    #[test]
    fn support_window_3() {
        let out = support(&[4.0, 2.0, 3.0, 6.0, 5.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn window_longer_than_input_is_all_none() {
        assert!(rolling_max(&[1.0, 2.0], 5).iter().all(Option::is_none));
    }

    #[test]
    fn zero_window_is_all_none() {
        assert!(rolling_min(&[1.0, 2.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn rolling_mean_known_values() {
        let out = rolling_mean(&[2.0, 4.0, 6.0, 8.0], 2);
        assert_eq!(out, vec![None, Some(3.0), Some(5.0), Some(7.0)]);
    }
}
