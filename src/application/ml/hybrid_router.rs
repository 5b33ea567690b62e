use super::feature_extractor;
use super::forecast::{blend_predictions, confidence_schedule, synthesize_path};
use super::predictor::{TrendPredictor, rule_based_trend};
use super::strategy_selector::{RoutingStrategy, StrategySelector};
use crate::domain::errors::MlError;
use crate::domain::ml::{
    FORECAST_HORIZON_DAYS, MlConfig, PredictionResult, PredictionSource, PricePoint,
};
use crate::domain::ports::{Clock, CloudInference, DeviceSignals, SystemClock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ENSEMBLE_MODEL_VERSION: &str = "ensemble-v1.0";
pub const RULE_BASED_MODEL_VERSION: &str = "rule-based-v1.0";

/// Routes each prediction request to the cloud service, the on-device
/// model, or both, and normalizes whatever comes back into a
/// [`PredictionResult`] tagged with its provenance.
pub struct HybridMlRouter {
    cloud: Arc<dyn CloudInference>,
    predictor: Arc<dyn TrendPredictor>,
    device: Arc<dyn DeviceSignals>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
}

impl HybridMlRouter {
    pub fn new(
        cloud: Arc<dyn CloudInference>,
        predictor: Arc<dyn TrendPredictor>,
        device: Arc<dyn DeviceSignals>,
    ) -> Self {
        Self {
            cloud,
            predictor,
            device,
            clock: Arc::new(SystemClock),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the jitter applied to synthetic on-device paths.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Produce a forecast for `symbol` from its history.
    ///
    /// Never panics. `Err` only when no path could produce a result (or the
    /// cloud failed and on-device fallback is disabled).
    pub async fn get_prediction(
        &self,
        symbol: &str,
        series: &[PricePoint],
        config: &MlConfig,
    ) -> Result<PredictionResult, MlError> {
        let strategy = StrategySelector::decide(series, config, &self.device.status());
        info!("HybridMlRouter: Using strategy {} for {}", strategy, symbol);

        let result = match strategy {
            RoutingStrategy::Cloud => match self.cloud_prediction(symbol, series, config).await {
                Ok(result) => Ok(result),
                Err(e) if config.allow_on_device_fallback => {
                    warn!(
                        "HybridMlRouter: Cloud failed for {} ({}), falling back to on-device",
                        symbol, e
                    );
                    self.on_device_prediction(
                        symbol,
                        series,
                        config,
                        PredictionSource::OnDeviceFallback,
                    )
                    .await
                }
                Err(e) => Err(e),
            },
            RoutingStrategy::OnDevice => {
                self.on_device_prediction(symbol, series, config, PredictionSource::OnDevice)
                    .await
            }
            RoutingStrategy::Hybrid => self.ensemble_prediction(symbol, series, config).await,
        };

        result.map(|mut prediction| {
            prediction.is_offline = !self.device.status().network_available;
            prediction
        })
    }

    async fn cloud_prediction(
        &self,
        symbol: &str,
        series: &[PricePoint],
        config: &MlConfig,
    ) -> Result<PredictionResult, MlError> {
        let limit = Duration::from_millis(config.max_latency_ms);
        let mut result = tokio::time::timeout(limit, self.cloud.predict_trend(symbol, series))
            .await
            .map_err(|_| MlError::Timeout {
                duration_ms: config.max_latency_ms,
            })??;
        result.source = PredictionSource::Cloud;
        Ok(result)
    }

    async fn on_device_prediction(
        &self,
        symbol: &str,
        series: &[PricePoint],
        config: &MlConfig,
        source: PredictionSource,
    ) -> Result<PredictionResult, MlError> {
        let last_price = series
            .last()
            .map(|p| p.close)
            .ok_or(MlError::InsufficientData {
                required: 1,
                available: 0,
            })?;

        let features = feature_extractor::extract(series);
        let predictor = Arc::clone(&self.predictor);
        let model_output = tokio::task::spawn_blocking(move || predictor.predict(&features))
            .await
            .unwrap_or_else(|e| {
                warn!("HybridMlRouter: On-device inference task failed: {}", e);
                None
            });

        let (trend, model_version) = match model_output {
            Some(trend) => (trend, self.predictor.version().to_string()),
            None => {
                debug!(
                    "HybridMlRouter: {} returned nothing, using rule-based trend",
                    self.predictor.name()
                );
                (rule_based_trend(&features), RULE_BASED_MODEL_VERSION.to_string())
            }
        };

        if trend.confidence < config.min_confidence_threshold {
            debug!(
                "HybridMlRouter: On-device confidence {:.2} below threshold {:.2} for {}",
                trend.confidence, config.min_confidence_threshold, symbol
            );
        }

        let predictions = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            synthesize_path(last_price, trend.direction, trend.confidence, &mut *rng)
        };

        let mut result = PredictionResult {
            symbol: symbol.to_string(),
            confidence_scores: confidence_schedule(trend.confidence, FORECAST_HORIZON_DAYS),
            predictions,
            trend: trend.direction.to_string(),
            current_price: last_price,
            predicted_change_percent: 0.0,
            predicted_high: last_price,
            predicted_low: last_price,
            generated_at: self.clock.now(),
            model_version,
            source,
            is_offline: !self.device.status().network_available,
        };
        result.refresh_summary();
        Ok(result)
    }

    async fn ensemble_prediction(
        &self,
        symbol: &str,
        series: &[PricePoint],
        config: &MlConfig,
    ) -> Result<PredictionResult, MlError> {
        let (cloud, local) = tokio::join!(
            self.cloud_prediction(symbol, series, config),
            self.on_device_prediction(symbol, series, config, PredictionSource::OnDeviceFallback)
        );

        match (cloud, local) {
            (Ok(cloud), Ok(local)) => {
                let mut blended = cloud;
                blended.predictions = blend_predictions(&blended.predictions, &local.predictions);
                blended.source = PredictionSource::Ensemble;
                blended.model_version = ENSEMBLE_MODEL_VERSION.to_string();
                blended.refresh_summary();
                Ok(blended)
            }
            (Ok(cloud), Err(e)) => {
                warn!("HybridMlRouter: On-device leg failed for {}: {}", symbol, e);
                Ok(cloud)
            }
            (Err(e), Ok(local)) => {
                warn!("HybridMlRouter: Cloud leg failed for {}: {}", symbol, e);
                Ok(local)
            }
            (Err(cloud), Err(local)) => Err(MlError::AllPathsFailed {
                cloud: cloud.to_string(),
                on_device: local.to_string(),
            }),
        }
    }
}
