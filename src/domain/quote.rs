use serde::{Deserialize, Serialize};

/// Latest quote for a symbol as returned by the upstream provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub open: f64,
    pub previous_close: f64,
    pub volume: u64,
}
