use serde::{Deserialize, Serialize};

/// Ordered list of feature names.
/// This order MUST match the input layout of the packaged trend model.
/// Any change here is a breaking change for the model artifact.
pub const FEATURE_NAMES: &[&str] = &[
    "mean_close",
    "mean_volume_millions",
    "rsi",
    "macd_proxy",
    "short_term_return",
    "window_high",
    "window_low",
    "mean_range",
    "mean_intrabar_return",
    "close_ratio",
];

pub const FEATURE_COUNT: usize = 10;

pub const IDX_MEAN_CLOSE: usize = 0;
pub const IDX_RSI: usize = 2;
pub const IDX_MACD: usize = 3;
pub const IDX_PRICE_CHANGE: usize = 4;

/// Fixed-length model input. An all-zero vector means "not enough history".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f32; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f32; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn zeros() -> Self {
        Self([0.0; FEATURE_COUNT])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_degenerate(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.0.get(index).copied()
    }

    /// Fractional return over the window (last / first - 1).
    pub fn price_change(&self) -> f32 {
        self.0[IDX_PRICE_CHANGE]
    }

    pub fn rsi(&self) -> f32 {
        self.0[IDX_RSI]
    }

    pub fn macd(&self) -> f32 {
        self.0[IDX_MACD]
    }

    pub fn mean_close(&self) -> f32 {
        self.0[IDX_MEAN_CLOSE]
    }
}
