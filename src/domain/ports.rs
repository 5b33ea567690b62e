use crate::domain::device::DeviceStatus;
use crate::domain::errors::{MarketDataError, MlError};
use crate::domain::ml::{PricePoint, PredictionResult, SentimentResult, TechnicalIndicators};
use crate::domain::quote::Quote;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Remote prediction/sentiment/indicator service.
/// Implementations never retry; the router owns the fallback policy.
#[async_trait]
pub trait CloudInference: Send + Sync {
    async fn predict_trend(
        &self,
        symbol: &str,
        series: &[PricePoint],
    ) -> Result<PredictionResult, MlError>;

    async fn analyze_sentiment(
        &self,
        texts: &[String],
        symbol: Option<&str>,
    ) -> Result<SentimentResult, MlError>;

    async fn compute_indicators(
        &self,
        rows: &[PricePoint],
    ) -> Result<TechnicalIndicators, MlError>;

    /// Availability probe. Any failure means "unavailable".
    async fn is_available(&self) -> bool;
}

/// Connectivity and battery signals of the host device
pub trait DeviceSignals: Send + Sync {
    fn status(&self) -> DeviceStatus;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Upstream quote/time-series API (network bound, rate limited by the caller)
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;
    async fn fetch_daily_series(&self, symbol: &str) -> Result<Vec<PricePoint>, MarketDataError>;
}

/// Source of chronologically ordered history for a symbol
#[async_trait]
pub trait HistoricalDataSource: Send + Sync {
    async fn get_history(&self, symbol: &str) -> Result<Vec<PricePoint>, MarketDataError>;
}
