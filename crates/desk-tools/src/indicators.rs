//! Technical indicator derivation
//!
//! Pure, stateless helpers over a close-price series: SMA/EMA/RSI/MACD via
//! the `ta` crate, plus KDJ computed over high/low/close. Consumed by the
//! market data tool; not part of the orchestration logic.

use ta::Next;
use ta::indicators::{
    ExponentialMovingAverage, MovingAverageConvergenceDivergence, RelativeStrengthIndex,
    SimpleMovingAverage,
};
use thiserror::Error;

const SMA_PERIOD: usize = 10;
const EMA_PERIOD: usize = 10;
const RSI_PERIOD: usize = 14;
const KDJ_K_PERIOD: usize = 14;
const KDJ_D_PERIOD: usize = 3;

/// Minimum closes needed for a full summary (MACD slow period + signal)
pub const MIN_SERIES_LEN: usize = 35;

/// Indicator calculation errors
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// Not enough data points for the requested indicators
    #[error("need at least {required} closes, got {got}")]
    SeriesTooShort { required: usize, got: usize },

    /// Indicator construction rejected its parameters
    #[error("indicator construction failed: {0}")]
    Construction(String),
}

/// Latest indicator values over a close-price series
#[derive(Debug, Clone)]
pub struct IndicatorSummary {
    pub latest_close: f64,
    pub sma_10: f64,
    pub ema_10: f64,
    pub rsi_14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
}

impl IndicatorSummary {
    /// Human-readable momentum read used in tool output
    pub fn signal(&self) -> &'static str {
        if self.rsi_14 > 70.0 {
            "overbought"
        } else if self.rsi_14 < 30.0 {
            "oversold"
        } else if self.macd_histogram > 0.0 && self.latest_close > self.sma_10 {
            "bullish momentum"
        } else if self.macd_histogram < 0.0 && self.latest_close < self.sma_10 {
            "bearish momentum"
        } else {
            "neutral"
        }
    }
}

/// Compute the indicator summary for a close-price series
pub fn summarize(closes: &[f64]) -> Result<IndicatorSummary, IndicatorError> {
    if closes.len() < MIN_SERIES_LEN {
        return Err(IndicatorError::SeriesTooShort {
            required: MIN_SERIES_LEN,
            got: closes.len(),
        });
    }

    let mut sma = SimpleMovingAverage::new(SMA_PERIOD)
        .map_err(|e| IndicatorError::Construction(e.to_string()))?;
    let mut ema = ExponentialMovingAverage::new(EMA_PERIOD)
        .map_err(|e| IndicatorError::Construction(e.to_string()))?;
    let mut rsi = RelativeStrengthIndex::new(RSI_PERIOD)
        .map_err(|e| IndicatorError::Construction(e.to_string()))?;
    let mut macd = MovingAverageConvergenceDivergence::new(12, 26, 9)
        .map_err(|e| IndicatorError::Construction(e.to_string()))?;

    let mut sma_v = sma.next(closes[0]);
    let mut ema_v = ema.next(closes[0]);
    let mut rsi_v = rsi.next(closes[0]);
    let mut macd_out = macd.next(closes[0]);
    for &close in &closes[1..] {
        sma_v = sma.next(close);
        ema_v = ema.next(close);
        rsi_v = rsi.next(close);
        macd_out = macd.next(close);
    }

    Ok(IndicatorSummary {
        latest_close: *closes.last().unwrap_or(&0.0),
        sma_10: sma_v,
        ema_10: ema_v,
        rsi_14: rsi_v,
        macd: macd_out.macd,
        macd_signal: macd_out.signal,
        macd_histogram: macd_out.histogram,
    })
}

/// Latest KDJ values and their signal classification
#[derive(Debug, Clone)]
pub struct Kdj {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

impl Kdj {
    /// Classify the K/D/J constellation
    pub fn signal(&self) -> &'static str {
        if self.j > 100.0 {
            "overbought"
        } else if self.j < 0.0 {
            "oversold"
        } else if self.k > self.d && self.k > 50.0 && self.d > 50.0 {
            "strong upward"
        } else if self.k > self.d {
            "weak upward"
        } else if self.k < self.d && self.k < 50.0 && self.d < 50.0 {
            "strong downward"
        } else {
            "weak downward"
        }
    }
}

/// Compute the latest KDJ values over high/low/close series
///
/// Returns None when the series is shorter than the K period.
pub fn kdj(highs: &[f64], lows: &[f64], closes: &[f64]) -> Option<Kdj> {
    let len = closes.len();
    if len < KDJ_K_PERIOD + KDJ_D_PERIOD || highs.len() != len || lows.len() != len {
        return None;
    }

    // Raw K per bar: position of the close inside the trailing K-period range
    let mut k_values = Vec::with_capacity(len - KDJ_K_PERIOD);
    for x in KDJ_K_PERIOD..len {
        let window = (x - KDJ_K_PERIOD)..x;
        let highest = highs[window.clone()].iter().copied().fold(f64::MIN, f64::max);
        let lowest = lows[window].iter().copied().fold(f64::MAX, f64::min);
        let k = if (highest - lowest).abs() < f64::EPSILON {
            50.0
        } else {
            (closes[x] - lowest) * 100.0 / (highest - lowest)
        };
        k_values.push(k);
    }

    if k_values.len() < KDJ_D_PERIOD {
        return None;
    }

    // D is the D-period mean of K; J = 3K - 2D
    let k = *k_values.last()?;
    let d = k_values[k_values.len() - KDJ_D_PERIOD..].iter().sum::<f64>() / KDJ_D_PERIOD as f64;
    let j = 3.0 * k - 2.0 * d;

    Some(Kdj { k, d, j })
}
