use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// RSI acceptance predicate for the momentum condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RsiFilter {
    /// `lower < rsi < upper`
    Band { lower: f64, upper: f64 },
    /// `rsi > threshold`
    Above { threshold: f64 },
}

impl RsiFilter {
    pub fn accepts(&self, rsi: f64) -> bool {
        match *self {
            RsiFilter::Band { lower, upper } => lower < rsi && rsi < upper,
            RsiFilter::Above { threshold } => rsi > threshold,
        }
    }

    fn validate(&self) -> Result<()> {
        let in_scale = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        match *self {
            RsiFilter::Band { lower, upper } => {
                if !in_scale(lower) || !in_scale(upper) || lower >= upper {
                    return Err(Error::Config(format!(
                        "rsi band must satisfy 0 <= lower < upper <= 100, got ({lower}, {upper})"
                    )));
                }
            }
            RsiFilter::Above { threshold } => {
                if !in_scale(threshold) {
                    return Err(Error::Config(format!(
                        "rsi threshold must be within [0, 100], got {threshold}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for RsiFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RsiFilter::Band { lower, upper } => write!(f, "{lower} < RSI < {upper}"),
            RsiFilter::Above { threshold } => write!(f, "RSI > {threshold}"),
        }
    }
}

/// Which resistance value the breakout condition compares the close against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakoutLevel {
    /// The latest row's resistance (window includes the latest bar's high).
    #[default]
    Inclusive,
    /// The previous row's resistance (window ending one bar earlier).
    Prior,
}

/// Indicator and signal parameters.
///
/// Example `config/strategy.toml`:
/// ```toml
/// ema_fast_span = 9
/// ema_slow_span = 20
/// rsi_period = 14
/// sr_period = 20
/// volume_multiplier = 1.2
///
/// [rsi_filter]
/// type = "above"
/// threshold = 50.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    pub ema_fast_span: usize,
    pub ema_slow_span: usize,
    pub rsi_period: usize,
    /// Support/resistance lookback.
    pub sr_period: usize,
    /// Lookback of the volume average the latest volume is compared to.
    pub volume_window: usize,
    pub volume_multiplier: f64,
    pub rsi_filter: RsiFilter,
    /// Minimum series length before any signal is considered.
    pub min_history: usize,
    pub breakout_level: BreakoutLevel,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            ema_fast_span: 9,
            ema_slow_span: 20,
            rsi_period: 14,
            sr_period: 20,
            volume_window: 20,
            volume_multiplier: 1.5,
            rsi_filter: RsiFilter::Band {
                lower: 40.0,
                upper: 70.0,
            },
            min_history: 50,
            breakout_level: BreakoutLevel::Inclusive,
        }
    }
}

impl StrategyParams {
    pub const EMA_FAST_RANGE: RangeInclusive<usize> = 5..=20;
    pub const EMA_SLOW_RANGE: RangeInclusive<usize> = 10..=50;
    pub const RSI_PERIOD_RANGE: RangeInclusive<usize> = 5..=21;
    pub const SR_PERIOD_RANGE: RangeInclusive<usize> = 10..=50;

    /// Load from a TOML file and validate. Missing keys take defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("strategy config at '{path}': {e}")))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let params: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Range checks on each field. Fields are not checked against each other,
    /// so a fast span above the slow span is accepted.
    pub fn validate(&self) -> Result<()> {
        check_range("ema_fast_span", self.ema_fast_span, Self::EMA_FAST_RANGE)?;
        check_range("ema_slow_span", self.ema_slow_span, Self::EMA_SLOW_RANGE)?;
        check_range("rsi_period", self.rsi_period, Self::RSI_PERIOD_RANGE)?;
        check_range("sr_period", self.sr_period, Self::SR_PERIOD_RANGE)?;

        if self.volume_window == 0 {
            return Err(Error::Config("volume_window must be at least 1".into()));
        }
        if !self.volume_multiplier.is_finite() || self.volume_multiplier <= 0.0 {
            return Err(Error::Config(format!(
                "volume_multiplier must be a positive number, got {}",
                self.volume_multiplier
            )));
        }
        if self.min_history < 2 {
            return Err(Error::Config("min_history must be at least 2".into()));
        }
        self.rsi_filter.validate()
    }
}

fn check_range(name: &str, value: usize, range: RangeInclusive<usize>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{name} must be within {}..={}, got {value}",
            range.start(),
            range.end()
        )))
    }
}
