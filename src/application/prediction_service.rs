use crate::application::ml::HybridMlRouter;
use crate::domain::errors::MlError;
use crate::domain::ml::{
    DEFAULT_MIN_HISTORY, MlConfig, PredictionResult, SentimentResult, TechnicalIndicators,
};
use crate::domain::ports::{CloudInference, HistoricalDataSource};
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point for screens that need a forecast or news sentiment for a
/// symbol. Loads history, applies the caller-side data checks and hands
/// off to the router or the cloud client.
pub struct PredictionService {
    history: Arc<dyn HistoricalDataSource>,
    router: Arc<HybridMlRouter>,
    cloud: Arc<dyn CloudInference>,
    config: MlConfig,
    min_history: usize,
}

impl PredictionService {
    pub fn new(
        history: Arc<dyn HistoricalDataSource>,
        router: Arc<HybridMlRouter>,
        cloud: Arc<dyn CloudInference>,
        config: MlConfig,
    ) -> Self {
        Self {
            history,
            router,
            cloud,
            config,
            min_history: DEFAULT_MIN_HISTORY,
        }
    }

    pub fn with_min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history;
        self
    }

    pub fn config(&self) -> &MlConfig {
        &self.config
    }

    pub async fn predict(&self, symbol: &str) -> Result<PredictionResult, MlError> {
        self.predict_with(symbol, &self.config).await
    }

    /// Forecast with a per-request policy instead of the service default.
    pub async fn predict_with(
        &self,
        symbol: &str,
        config: &MlConfig,
    ) -> Result<PredictionResult, MlError> {
        let history = self.history.get_history(symbol).await?;
        if history.len() < self.min_history {
            warn!(
                "PredictionService: {} has {} points, need {}",
                symbol,
                history.len(),
                self.min_history
            );
            return Err(MlError::InsufficientData {
                required: self.min_history,
                available: history.len(),
            });
        }

        let result = self.router.get_prediction(symbol, &history, config).await?;
        info!(
            "PredictionService: {} forecast from {} ({:+.2}%)",
            symbol, result.source, result.predicted_change_percent
        );
        Ok(result)
    }

    /// Cloud sentiment over news headlines. An empty batch yields `None`.
    pub async fn analyze_headlines(
        &self,
        symbol: Option<&str>,
        texts: &[String],
    ) -> Result<Option<SentimentResult>, MlError> {
        if texts.is_empty() {
            return Ok(None);
        }
        self.cloud.analyze_sentiment(texts, symbol).await.map(Some)
    }

    pub async fn indicators(&self, symbol: &str) -> Result<TechnicalIndicators, MlError> {
        let history = self.history.get_history(symbol).await?;
        self.cloud.compute_indicators(&history).await
    }

    pub async fn backend_available(&self) -> bool {
        self.cloud.is_available().await
    }
}
