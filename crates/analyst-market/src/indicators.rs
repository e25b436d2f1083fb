//! Technical indicator engine
//!
//! Pure functions over an ordered price history. Values are kept at full
//! precision through every comparison and only rounded to two decimals
//! when the [`IndicatorReport`] is built.

use crate::error::{MarketError, Result};
use crate::types::PriceBar;
use analyst_utils::round2;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage};

/// Bars of history requested for a technical analysis
pub const LOOKBACK_PERIOD: crate::types::Period = crate::types::Period::SixMonths;

/// RSI averaging window
pub const RSI_WINDOW: usize = 14;

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Unrounded indicator values for the most recent bar
#[derive(Debug, Clone, PartialEq)]
pub struct Indicators {
    pub current_price: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: f64,
    pub macd_signal: f64,
}

/// Output of a technical analysis, rounded for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub symbol: String,
    pub current_price: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: f64,
    pub macd_signal: f64,
    pub signals: Vec<String>,
    /// Local time the analysis ran, `YYYY-MM-DD HH:MM`
    pub analysis_date: String,
}

/// Compute every indicator over `bars` (ascending by date).
pub fn compute(symbol: &str, bars: &[PriceBar]) -> Result<Indicators> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let Some(&current_price) = closes.last() else {
        return Err(MarketError::no_data(symbol, "No data available"));
    };

    let (macd, macd_signal) = macd(&closes)?;

    Ok(Indicators {
        current_price,
        sma_20: sma(&closes, 20)?,
        sma_50: sma(&closes, 50)?,
        sma_200: sma(&closes, 200)?,
        rsi: rsi(&closes, RSI_WINDOW),
        macd,
        macd_signal,
    })
}

/// Run the analysis and build a rounded report stamped with `as_of`.
pub fn analyze(symbol: &str, bars: &[PriceBar], as_of: NaiveDateTime) -> Result<IndicatorReport> {
    let indicators = compute(symbol, bars)?;
    let signals = signals(&indicators);

    Ok(IndicatorReport {
        symbol: symbol.to_uppercase(),
        current_price: round2(indicators.current_price),
        sma_20: indicators.sma_20.map(round2),
        sma_50: indicators.sma_50.map(round2),
        sma_200: indicators.sma_200.map(round2),
        rsi: indicators.rsi.map(round2),
        macd: round2(indicators.macd),
        macd_signal: round2(indicators.macd_signal),
        signals,
        analysis_date: as_of.format("%Y-%m-%d %H:%M").to_string(),
    })
}

/// Mean of the last `window` values; `None` with fewer values than that.
pub fn sma(values: &[f64], window: usize) -> Result<Option<f64>> {
    if values.len() < window {
        return Ok(None);
    }
    let mut indicator =
        SimpleMovingAverage::new(window).map_err(|e| MarketError::IndicatorError(e.to_string()))?;
    let mut last = None;
    for &value in values {
        last = Some(indicator.next(value));
    }
    Ok(last)
}

/// Exponential moving average series seeded with the first value.
pub fn ema_series(values: &[f64], span: usize) -> Result<Vec<f64>> {
    let mut indicator = ExponentialMovingAverage::new(span)
        .map_err(|e| MarketError::IndicatorError(e.to_string()))?;
    Ok(values.iter().map(|&v| indicator.next(v)).collect())
}

/// Relative strength index from simple averages of the last `window`
/// one-period gains and losses.
///
/// A window with gains and no losses is 100; a window without movement is
/// 50. Returns `None` when fewer than `window + 1` values are available.
pub fn rsi(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window + 1 {
        return None;
    }

    let tail = &values[values.len() - (window + 1)..];
    let (gains, losses) = tail
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gains / window as f64;
    let avg_loss = losses / window as f64;

    let value = if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };
    Some(value)
}

/// Latest MACD line value and its signal line value.
pub fn macd(values: &[f64]) -> Result<(f64, f64)> {
    let fast = ema_series(values, MACD_FAST)?;
    let slow = ema_series(values, MACD_SLOW)?;
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema_series(&line, MACD_SIGNAL)?;

    match (line.last(), signal.last()) {
        (Some(&m), Some(&s)) => Ok((m, s)),
        _ => Err(MarketError::IndicatorError(
            "MACD needs at least one value".to_string(),
        )),
    }
}

/// Human-readable signals in fixed order: SMA-20, SMA-50, RSI, MACD.
///
/// A signal whose indicator is absent is left out.
pub fn signals(indicators: &Indicators) -> Vec<String> {
    let mut out = Vec::with_capacity(4);
    let price = indicators.current_price;

    for (window, sma) in [(20, indicators.sma_20), (50, indicators.sma_50)] {
        if let Some(sma) = sma {
            out.push(if price > sma {
                format!("Above {window}-day SMA (Bullish)")
            } else {
                format!("Below {window}-day SMA (Bearish)")
            });
        }
    }

    if let Some(rsi) = indicators.rsi {
        out.push(interpret_rsi(rsi).to_string());
    }

    out.push(if indicators.macd > indicators.macd_signal {
        "MACD Bullish Crossover".to_string()
    } else {
        "MACD Bearish Crossover".to_string()
    });

    out
}

/// Interpret RSI value
fn interpret_rsi(rsi: f64) -> &'static str {
    if rsi > RSI_OVERBOUGHT {
        "RSI Overbought"
    } else if rsi < RSI_OVERSOLD {
        "RSI Oversold"
    } else {
        "RSI Neutral"
    }
}
