//! Forecast synthesis helpers shared by the router paths

use crate::domain::ml::{FORECAST_HORIZON_DAYS, TrendDirection};
use rand::Rng;

/// Daily drift at full confidence.
const DRIFT_PER_CONFIDENCE: f64 = 0.005;
/// Total width of the uniform daily jitter (+/-0.5%).
const NOISE_WIDTH: f64 = 0.01;
const CONFIDENCE_DECAY_PER_DAY: f64 = 0.1;
const CONFIDENCE_FLOOR: f64 = 0.5;

pub const CLOUD_WEIGHT: f64 = 0.7;
pub const ON_DEVICE_WEIGHT: f64 = 0.3;

pub fn daily_drift(direction: TrendDirection, confidence: f32) -> f64 {
    match direction {
        TrendDirection::Up => DRIFT_PER_CONFIDENCE * confidence as f64,
        TrendDirection::Down => -DRIFT_PER_CONFIDENCE * confidence as f64,
        TrendDirection::Neutral => 0.0,
    }
}

/// Compound a 7-day price path from the last close.
///
/// Each day moves by the trend drift plus uniform jitter in [-0.5%, +0.5%).
pub fn synthesize_path<R: Rng + ?Sized>(
    last_price: f64,
    direction: TrendDirection,
    confidence: f32,
    rng: &mut R,
) -> Vec<f64> {
    let drift = daily_drift(direction, confidence);
    let mut price = last_price;
    (0..FORECAST_HORIZON_DAYS)
        .map(|_| {
            let noise = (rng.random::<f64>() - 0.5) * NOISE_WIDTH;
            price *= 1.0 + drift + noise;
            price
        })
        .collect()
}

/// Per-day confidence: 10% decay per day out, never below 0.5.
pub fn confidence_schedule(confidence: f32, days: usize) -> Vec<f64> {
    (0..days)
        .map(|i| {
            (confidence as f64 * (1.0 - i as f64 * CONFIDENCE_DECAY_PER_DAY)).max(CONFIDENCE_FLOOR)
        })
        .collect()
}

/// Day-by-day weighted blend, cloud weighted higher.
pub fn blend_predictions(cloud: &[f64], on_device: &[f64]) -> Vec<f64> {
    cloud
        .iter()
        .zip(on_device)
        .map(|(c, l)| c * CLOUD_WEIGHT + l * ON_DEVICE_WEIGHT)
        .collect()
}
