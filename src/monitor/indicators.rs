//! Moving average and relative strength index over close prices
//!
//! Series are chronological, most recent last. Too-short input is not an
//! error: it yields [`InsufficientData`], which callers treat as a normal
//! outcome.

use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::common::errors::Result;
use crate::common::traits::MarketDataProvider;
use crate::common::types::IndicatorAnalysis;

/// Default RSI lookback
pub const RSI_PERIOD: usize = 14;
/// Short simple moving average
pub const SMA_SHORT_PERIOD: usize = 20;
/// Long simple moving average
pub const SMA_LONG_PERIOD: usize = 50;
/// Closes needed for a full analysis: the long average plus one extra point
/// for the RSI's first difference
pub const ANALYSIS_MIN_CANDLES: usize = SMA_LONG_PERIOD + 1;

/// Not enough points to compute an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient data: need {required} points, have {available}")]
pub struct InsufficientData {
    pub required: usize,
    pub available: usize,
}

/// Outcome of a technical analysis request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TechnicalAnalysis {
    Complete(IndicatorAnalysis),
    InsufficientData(InsufficientData),
}

/// Arithmetic mean of the last `period` closes
pub fn moving_average(
    closes: &[Decimal],
    period: usize,
) -> std::result::Result<Decimal, InsufficientData> {
    let required = period.max(1);
    if closes.len() < required {
        return Err(InsufficientData {
            required,
            available: closes.len(),
        });
    }

    let window = &closes[closes.len() - required..];
    let sum: Decimal = window.iter().sum();
    Ok(sum / Decimal::from(required))
}

/// Relative strength index with Wilder smoothing
///
/// Averages are seeded from the first `period` differences, then smoothed
/// over the rest of the series. A zero average loss yields 100.
pub fn relative_strength(
    closes: &[Decimal],
    period: usize,
) -> std::result::Result<Decimal, InsufficientData> {
    let period = period.max(1);
    let required = period + 1;
    if closes.len() < required {
        return Err(InsufficientData {
            required,
            available: closes.len(),
        });
    }

    let n = Decimal::from(period);
    let carry = Decimal::from(period - 1);

    let split = |diff: Decimal| -> (Decimal, Decimal) {
        if diff > Decimal::ZERO {
            (diff, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -diff)
        }
    };

    let mut diffs = closes.windows(2).map(|w| w[1] - w[0]);

    let (mut gains, mut losses) = (Decimal::ZERO, Decimal::ZERO);
    for diff in diffs.by_ref().take(period) {
        let (gain, loss) = split(diff);
        gains += gain;
        losses += loss;
    }
    let mut avg_gain = gains / n;
    let mut avg_loss = losses / n;

    for diff in diffs {
        let (gain, loss) = split(diff);
        avg_gain = (avg_gain * carry + gain) / n;
        avg_loss = (avg_loss * carry + loss) / n;
    }

    if avg_loss.is_zero() {
        return Ok(Decimal::ONE_HUNDRED);
    }

    let rs = avg_gain / avg_loss;
    Ok(Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs))
}

/// RSI(14), SMA(20) and SMA(50) over one close series
///
/// Either all three indicators are produced or none: a short series is
/// reported as insufficient rather than partially analysed.
pub fn analyze_closes(closes: &[Decimal], min_candles: usize) -> TechnicalAnalysis {
    let required = min_candles.max(ANALYSIS_MIN_CANDLES);
    if closes.len() < required {
        return TechnicalAnalysis::InsufficientData(InsufficientData {
            required,
            available: closes.len(),
        });
    }

    TechnicalAnalysis::Complete(IndicatorAnalysis {
        rsi: relative_strength(closes, RSI_PERIOD).ok(),
        sma20: moving_average(closes, SMA_SHORT_PERIOD).ok(),
        sma50: moving_average(closes, SMA_LONG_PERIOD).ok(),
    })
}

/// Fetch closes for an instrument and analyse them
#[instrument(skip(provider))]
pub async fn technical_analysis(
    provider: &dyn MarketDataProvider,
    instrument: &str,
    candles: usize,
) -> Result<TechnicalAnalysis> {
    let closes = provider.get_historical_candles(instrument, candles).await?;
    debug!("Fetched {} closes for {}", closes.len(), instrument);
    Ok(analyze_closes(&closes, candles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn series(values: impl IntoIterator<Item = i64>) -> Vec<Decimal> {
        values.into_iter().map(Decimal::from).collect()
    }

    #[test]
    fn test_moving_average_of_last_period() {
        assert_eq!(moving_average(&series([10, 20, 30]), 3), Ok(dec!(20)));
        assert_eq!(moving_average(&series([5, 10, 20, 30]), 3), Ok(dec!(20)));
    }

    #[test]
    fn test_moving_average_insufficient() {
        assert_eq!(
            moving_average(&series([10, 20]), 3),
            Err(InsufficientData {
                required: 3,
                available: 2
            })
        );
    }

    #[test]
    fn test_rsi_increasing_is_100() {
        assert_eq!(relative_strength(&series(1..=15), 14), Ok(dec!(100)));
        assert_eq!(relative_strength(&series(1..=60), 14), Ok(dec!(100)));
    }

    #[test]
    fn test_rsi_decreasing_is_0() {
        assert_eq!(relative_strength(&series((1..=15).rev()), 14), Ok(dec!(0)));
        assert_eq!(relative_strength(&series((1..=60).rev()), 14), Ok(dec!(0)));
    }

    #[test]
    fn test_rsi_constant_is_100() {
        assert_eq!(relative_strength(&vec![dec!(42); 15], 14), Ok(dec!(100)));
    }

    #[test]
    fn test_rsi_needs_period_plus_one() {
        assert_eq!(
            relative_strength(&series(1..=14), 14),
            Err(InsufficientData {
                required: 15,
                available: 14
            })
        );
    }

    #[test]
    fn test_rsi_wilder_smoothing() {
        // Seed: +1, -1 -> 0.5 / 0.5 -> RSI 50
        assert_eq!(relative_strength(&series([1, 2, 1]), 2), Ok(dec!(50)));
        // Next +1: gain (0.5 + 1) / 2 = 0.75, loss 0.5 / 2 = 0.25 -> RS 3 -> RSI 75
        assert_eq!(relative_strength(&series([1, 2, 1, 2]), 2), Ok(dec!(75)));
    }

    #[test]
    fn test_analysis_requires_51_closes() {
        let short = series(1..=50);
        assert_eq!(
            analyze_closes(&short, ANALYSIS_MIN_CANDLES),
            TechnicalAnalysis::InsufficientData(InsufficientData {
                required: 51,
                available: 50
            })
        );
    }

    #[test]
    fn test_analysis_complete() {
        let closes = series(1..=51);
        let TechnicalAnalysis::Complete(result) = analyze_closes(&closes, ANALYSIS_MIN_CANDLES)
        else {
            panic!("expected complete analysis");
        };

        assert_eq!(result.rsi, Some(dec!(100)));
        // mean of 32..=51
        assert_eq!(result.sma20, Some(dec!(41.5)));
        // mean of 2..=51
        assert_eq!(result.sma50, Some(dec!(26.5)));
    }
}
