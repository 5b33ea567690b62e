//! Feature extraction for the on-device trend model
//!
//! Turns a raw OHLCV history into the fixed 10-slot [`FeatureVector`]
//! described by the feature registry:
//! - Window statistics (mean close, volume, high/low, range)
//! - Momentum (RSI, MACD proxy, short-term return, close ratio)

use crate::domain::ml::{FEATURE_COUNT, FeatureVector, PricePoint};

/// Trailing points used for the window statistics.
pub const FEATURE_WINDOW: usize = 10;

/// Below this many points the extractor returns an all-zero vector.
pub const MIN_FEATURE_POINTS: usize = 5;

const RSI_LOSS_EPSILON: f64 = 0.001;
const MACD_FAST_WINDOW: usize = 12;
const MACD_SLOW_WINDOW: usize = 26;

/// Extract the model input from a chronologically ordered series.
///
/// # Arguments
/// * `series` - Price history, oldest first
///
/// # Returns
/// * A vector of exactly 10 features. Fewer than 5 points yields all zeros.
pub fn extract(series: &[PricePoint]) -> FeatureVector {
    let start = series.len().saturating_sub(FEATURE_WINDOW);
    let recent = &series[start..];
    if recent.len() < MIN_FEATURE_POINTS {
        return FeatureVector::zeros();
    }

    let closes: Vec<f64> = recent.iter().map(|p| p.close).collect();
    let first_close = closes[0];
    let last_close = closes[closes.len() - 1];
    let close_ratio = if first_close != 0.0 {
        last_close / first_close
    } else {
        1.0
    };

    let window_high = recent
        .iter()
        .map(|p| p.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let window_low = recent.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);

    let values: [f32; FEATURE_COUNT] = [
        mean(closes.iter().copied()) as f32,
        (mean(recent.iter().map(|p| p.volume)) / 1_000_000.0) as f32,
        calculate_rsi(&closes) as f32,
        calculate_macd_proxy(recent) as f32,
        (close_ratio - 1.0) as f32,
        window_high as f32,
        window_low as f32,
        mean(recent.iter().map(|p| p.high - p.low)) as f32,
        mean(recent.iter().map(|p| {
            if p.open != 0.0 {
                (p.close - p.open) / p.open
            } else {
                0.0
            }
        })) as f32,
        close_ratio as f32,
    ];

    FeatureVector::new(values)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// RSI from close-to-close deltas over the window.
///
/// Flat deltas count as zero losses. Without any loss sample the loss
/// average falls back to a small epsilon; a loss average of exactly zero
/// pins the value at 100.
pub fn calculate_rsi(closes: &[f64]) -> f64 {
    if closes.len() < 2 {
        return 50.0;
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains.push(change);
        } else {
            losses.push(change.abs());
        }
    }

    let avg_gain = if gains.is_empty() {
        0.0
    } else {
        mean(gains.into_iter())
    };
    let avg_loss = if losses.is_empty() {
        RSI_LOSS_EPSILON
    } else {
        mean(losses.into_iter())
    };

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Difference between the trailing 12- and 26-point average close.
///
/// Uses whatever is available up to each window length, so short series
/// compare two averages over overlapping (possibly identical) spans.
/// [`extract`] passes only the 10-point window, which keeps this slot at
/// zero as the packaged model was trained on.
pub fn calculate_macd_proxy(series: &[PricePoint]) -> f64 {
    let trailing_mean = |window: usize| {
        let start = series.len().saturating_sub(window);
        mean(series[start..].iter().map(|p| p.close))
    };
    trailing_mean(MACD_FAST_WINDOW) - trailing_mean(MACD_SLOW_WINDOW)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_from_closes(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                timestamp: i as i64 * 86_400_000,
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 2_000_000.0,
            })
            .collect()
    }

    #[test]
    fn test_short_series_yields_zero_vector() {
        for len in 0..MIN_FEATURE_POINTS {
            let series = series_from_closes(&vec![100.0; len]);
            let fv = extract(&series);
            assert_eq!(fv.len(), FEATURE_COUNT);
            assert!(fv.is_degenerate(), "len {} should be degenerate", len);
        }
    }

    #[test]
    fn test_vector_always_has_ten_entries() {
        for len in [5, 7, 10, 30, 120] {
            let closes: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
            assert_eq!(extract(&series_from_closes(&closes)).len(), 10);
        }
    }

    #[test]
    fn test_extract_is_deterministic() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let series = series_from_closes(&closes);
        let a = extract(&series);
        let b = extract(&series);
        let a_bits: Vec<u32> = a.as_slice().iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u32> = b.as_slice().iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn test_window_statistics() {
        // 12 points, only the trailing 10 (102..=111) are in the window
        let closes: Vec<f64> = (100..112).map(|c| c as f64).collect();
        let fv = extract(&series_from_closes(&closes));

        assert!((fv.mean_close() - 106.5).abs() < 1e-4);
        assert!((fv.get(1).unwrap() - 2.0).abs() < 1e-6);
        assert_eq!(fv.get(5).unwrap(), 112.0);
        assert_eq!(fv.get(6).unwrap(), 101.0);
        assert!((fv.get(7).unwrap() - 2.0).abs() < 1e-6);
        assert!((fv.price_change() - (111.0 / 102.0 - 1.0) as f32).abs() < 1e-6);
        assert!((fv.get(9).unwrap() - (111.0 / 102.0) as f32).abs() < 1e-6);
    }

    #[test]
    fn test_rsi_all_gains_uses_epsilon_denominator() {
        let rsi = calculate_rsi(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        // avg gain 1.0 / epsilon 0.001 => RS 1000
        assert!((rsi - (100.0 - 100.0 / 1001.0)).abs() < 1e-9);
        assert!(rsi < 100.0);
    }

    #[test]
    fn test_rsi_flat_series_is_capped() {
        assert_eq!(calculate_rsi(&[10.0, 10.0, 10.0, 10.0, 10.0]), 100.0);
    }

    #[test]
    fn test_rsi_balanced_moves() {
        let rsi = calculate_rsi(&[10.0, 11.0, 10.0, 11.0, 10.0]);
        assert!((rsi - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_macd_proxy_uses_available_prefix() {
        // Fewer than 12 points: both averages span the same points
        let short = series_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(calculate_macd_proxy(&short), 0.0);

        // Rising series: short average above long average
        let closes: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let macd = calculate_macd_proxy(&series_from_closes(&closes));
        // mean(18..30) = 23.5, mean(4..30) = 16.5
        assert!((macd - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_macd_slot_only_sees_window() {
        let closes: Vec<f64> = (1..=30).map(|c| c as f64).collect();
        let fv = extract(&series_from_closes(&closes));
        assert_eq!(fv.macd(), 0.0);
        assert_eq!(fv.get(3), Some(0.0));
    }
}
