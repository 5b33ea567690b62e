use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Number of days every forecast covers, whatever produced it.
pub const FORECAST_HORIZON_DAYS: usize = 7;

/// History length below which a detail-view prediction is not attempted.
pub const DEFAULT_MIN_HISTORY: usize = 10;

/// One trading-interval observation of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    /// OHLCV row in the column order the cloud service expects.
    pub fn to_ohlcv_row(&self) -> [f32; 5] {
        [
            self.open as f32,
            self.high as f32,
            self.low as f32,
            self.close as f32,
            self.volume as f32,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

impl TrendDirection {
    /// Class index order of the packaged classifier output.
    pub fn from_class_index(index: usize) -> Self {
        match index {
            0 => Self::Up,
            1 => Self::Down,
            _ => Self::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of a single on-device classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPrediction {
    pub direction: TrendDirection,
    /// Probability of the winning class, 0.0 to 1.0
    pub confidence: f32,
    pub indicators: Option<TechnicalIndicators>,
}

/// Which inference path produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionSource {
    #[serde(rename = "cloud")]
    Cloud,
    #[serde(rename = "on-device")]
    OnDevice,
    #[serde(rename = "on-device-fallback")]
    OnDeviceFallback,
    #[serde(rename = "ensemble")]
    Ensemble,
}

impl PredictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::OnDevice => "on-device",
            Self::OnDeviceFallback => "on-device-fallback",
            Self::Ensemble => "ensemble",
        }
    }

    /// True when the number shown came from a reduced-fidelity path.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::OnDevice | Self::OnDeviceFallback)
    }
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Uniform forecast handed to the caller regardless of the path taken.
///
/// `predictions` and `confidence_scores` always have the same length, and
/// confidence never increases further out in the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub symbol: String,
    pub predictions: Vec<f64>,
    pub confidence_scores: Vec<f64>,
    pub trend: String,
    pub current_price: f64,
    pub predicted_change_percent: f64,
    pub predicted_high: f64,
    pub predicted_low: f64,
    pub generated_at: DateTime<Utc>,
    pub model_version: String,
    pub source: PredictionSource,
    pub is_offline: bool,
}

impl PredictionResult {
    /// Recompute change%, high and low from the current `predictions`.
    pub fn refresh_summary(&mut self) {
        let last = self
            .predictions
            .last()
            .copied()
            .unwrap_or(self.current_price);
        self.predicted_change_percent = if self.current_price != 0.0 {
            (last - self.current_price) / self.current_price * 100.0
        } else {
            0.0
        };
        self.predicted_high = self
            .predictions
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.max(p))))
            .unwrap_or(self.current_price);
        self.predicted_low = self
            .predictions
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.min(p))))
            .unwrap_or(self.current_price);
    }

    /// Clamp confidence so it never rises further out in the horizon.
    pub fn cap_confidence_decay(&mut self) {
        let mut ceiling = f64::INFINITY;
        for score in self.confidence_scores.iter_mut() {
            if *score > ceiling {
                *score = ceiling;
            }
            ceiling = *score;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentItem {
    pub text: String,
    pub label: String,
    pub score: f64,
    pub keywords: Vec<String>,
}

/// Aggregate sentiment over a batch of texts. Cloud only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub symbol: Option<String>,
    /// -1.0 (bearish) to 1.0 (bullish)
    pub overall_score: f64,
    pub overall_label: String,
    pub recommendation: String,
    pub confidence: f64,
    pub sentiments: Vec<SentimentItem>,
    pub bullish_count: u32,
    pub bearish_count: u32,
    pub neutral_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub sma_20: Option<f64>,
    pub ema_12: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub signals: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIndex {
    pub name: String,
    pub symbol: String,
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub indices: Vec<MarketIndex>,
    pub market_status: String,
}

/// Caller-supplied routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlConfig {
    pub prefer_cloud: bool,
    pub allow_on_device_fallback: bool,
    pub min_confidence_threshold: f32,
    /// Upper bound on a single cloud call made by the router
    pub max_latency_ms: u64,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            prefer_cloud: true,
            allow_on_device_fallback: true,
            min_confidence_threshold: 0.6,
            max_latency_ms: 2000,
        }
    }
}
