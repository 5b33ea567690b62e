use crate::domain::ml::{FeatureVector, TechnicalIndicators, TrendDirection, TrendPrediction};
use std::collections::HashMap;

/// Interface for on-device trend classifiers
pub trait TrendPredictor: Send + Sync {
    /// Classify the feature vector into UP/DOWN/NEUTRAL.
    /// Returns `None` when the model is unavailable or inference fails.
    fn predict(&self, features: &FeatureVector) -> Option<TrendPrediction>;

    fn is_loaded(&self) -> bool;

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> &str;
}

const FALLBACK_CHANGE_THRESHOLD: f32 = 0.02;
const RSI_OVERBOUGHT: f32 = 70.0;
const RSI_OVERSOLD: f32 = 30.0;

/// Deterministic trend estimate used when the model yields nothing.
///
/// Direction comes from the window return crossing +/-2% with RSI inside
/// the 30/70 band; confidence is `|change| * 10` clamped to [0.5, 0.9].
pub fn rule_based_trend(features: &FeatureVector) -> TrendPrediction {
    let price_change = features.price_change();
    let rsi = features.rsi();

    let direction = if price_change > FALLBACK_CHANGE_THRESHOLD && rsi < RSI_OVERBOUGHT {
        TrendDirection::Up
    } else if price_change < -FALLBACK_CHANGE_THRESHOLD && rsi > RSI_OVERSOLD {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };

    TrendPrediction {
        direction,
        confidence: (price_change.abs() * 10.0).clamp(0.5, 0.9),
        indicators: None,
    }
}

/// Indicators readable straight off the feature vector.
pub fn indicators_from_features(features: &FeatureVector) -> TechnicalIndicators {
    let rsi = features.rsi();
    let rsi_signal = if rsi > RSI_OVERBOUGHT {
        "overbought"
    } else if rsi < RSI_OVERSOLD {
        "oversold"
    } else {
        "neutral"
    };

    let mut signals = HashMap::new();
    signals.insert("rsi".to_string(), rsi_signal.to_string());

    TechnicalIndicators {
        rsi: Some(rsi as f64),
        macd: Some(features.macd() as f64),
        sma_20: None,
        ema_12: Some(features.mean_close() as f64),
        bollinger_upper: None,
        bollinger_lower: None,
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::FEATURE_COUNT;
    use crate::domain::ml::feature_registry::{IDX_PRICE_CHANGE, IDX_RSI};

    fn features(price_change: f32, rsi: f32) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[IDX_PRICE_CHANGE] = price_change;
        values[IDX_RSI] = rsi;
        FeatureVector::new(values)
    }

    #[test]
    fn test_fallback_up_with_floor_confidence() {
        let trend = rule_based_trend(&features(0.03, 50.0));
        assert_eq!(trend.direction, TrendDirection::Up);
        assert!((trend.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_fallback_down() {
        let trend = rule_based_trend(&features(-0.07, 45.0));
        assert_eq!(trend.direction, TrendDirection::Down);
        assert!((trend.confidence - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_fallback_rsi_band_blocks_direction() {
        assert_eq!(
            rule_based_trend(&features(0.05, 75.0)).direction,
            TrendDirection::Neutral
        );
        assert_eq!(
            rule_based_trend(&features(-0.05, 25.0)).direction,
            TrendDirection::Neutral
        );
    }

    #[test]
    fn test_fallback_confidence_ceiling() {
        let trend = rule_based_trend(&features(0.5, 50.0));
        assert!((trend.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_fallback_on_degenerate_vector_is_neutral() {
        let trend = rule_based_trend(&FeatureVector::zeros());
        assert_eq!(trend.direction, TrendDirection::Neutral);
        assert!((trend.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_indicator_signals() {
        let ind = indicators_from_features(&features(0.0, 80.0));
        assert_eq!(ind.signals.get("rsi").map(String::as_str), Some("overbought"));
        let ind = indicators_from_features(&features(0.0, 20.0));
        assert_eq!(ind.signals.get("rsi").map(String::as_str), Some("oversold"));
        assert_eq!(ind.rsi, Some(20.0));
    }
}
