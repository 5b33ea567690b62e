use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use stocktracker::application::ml::{HybridMlRouter, TrendPredictor};
use stocktracker::domain::device::{DeviceStatus, NetworkTransport};
use stocktracker::domain::errors::MlError;
use stocktracker::domain::ml::{
    FeatureVector, MlConfig, PredictionResult, PredictionSource, PricePoint, SentimentResult,
    TechnicalIndicators, TrendDirection, TrendPrediction,
};
use stocktracker::domain::ports::{CloudInference, DeviceSignals};
use stocktracker::infrastructure::DeviceStatusMonitor;

enum CloudBehavior {
    Succeed(Vec<f64>),
    Fail,
    Hang,
}

fn cloud_result(symbol: &str, series: &[PricePoint], predictions: &[f64]) -> PredictionResult {
    let mut result = PredictionResult {
        symbol: symbol.to_string(),
        predictions: predictions.to_vec(),
        confidence_scores: vec![0.9, 0.88, 0.86, 0.84, 0.82, 0.8, 0.78],
        trend: "up".to_string(),
        current_price: series.last().map(|p| p.close).unwrap_or_default(),
        predicted_change_percent: 0.0,
        predicted_high: 0.0,
        predicted_low: 0.0,
        generated_at: Utc::now(),
        model_version: "lstm-v2".to_string(),
        source: PredictionSource::Cloud,
        is_offline: false,
    };
    result.refresh_summary();
    result
}

struct StubCloud {
    behavior: CloudBehavior,
    calls: AtomicUsize,
}

impl StubCloud {
    fn new(behavior: CloudBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudInference for StubCloud {
    async fn predict_trend(
        &self,
        symbol: &str,
        series: &[PricePoint],
    ) -> Result<PredictionResult, MlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            CloudBehavior::Succeed(predictions) => Ok(cloud_result(symbol, series, predictions)),
            CloudBehavior::Fail => Err(MlError::Status {
                status: 503,
                body: "model warming up".to_string(),
            }),
            CloudBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(MlError::Transport {
                    reason: "unreachable".to_string(),
                })
            }
        }
    }

    async fn analyze_sentiment(
        &self,
        _texts: &[String],
        _symbol: Option<&str>,
    ) -> Result<SentimentResult, MlError> {
        Err(MlError::ModelUnavailable)
    }

    async fn compute_indicators(
        &self,
        _series: &[PricePoint],
    ) -> Result<TechnicalIndicators, MlError> {
        Ok(TechnicalIndicators::default())
    }

    async fn is_available(&self) -> bool {
        !matches!(self.behavior, CloudBehavior::Fail)
    }
}

/// Answers successfully, but the device drops off the network mid-call.
struct DisconnectingCloud {
    device: Arc<DeviceStatusMonitor>,
}

#[async_trait]
impl CloudInference for DisconnectingCloud {
    async fn predict_trend(
        &self,
        symbol: &str,
        series: &[PricePoint],
    ) -> Result<PredictionResult, MlError> {
        self.device.set_network_available(false);
        Ok(cloud_result(symbol, series, &CLOUD_PATH))
    }

    async fn analyze_sentiment(
        &self,
        _texts: &[String],
        _symbol: Option<&str>,
    ) -> Result<SentimentResult, MlError> {
        Err(MlError::ModelUnavailable)
    }

    async fn compute_indicators(
        &self,
        _series: &[PricePoint],
    ) -> Result<TechnicalIndicators, MlError> {
        Ok(TechnicalIndicators::default())
    }

    async fn is_available(&self) -> bool {
        true
    }
}

struct FixedPredictor(Option<TrendPrediction>);

impl TrendPredictor for FixedPredictor {
    fn predict(&self, _features: &FeatureVector) -> Option<TrendPrediction> {
        self.0.clone()
    }

    fn is_loaded(&self) -> bool {
        self.0.is_some()
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn version(&self) -> &str {
        "fixed-v1"
    }
}

fn up_predictor() -> Arc<FixedPredictor> {
    Arc::new(FixedPredictor(Some(TrendPrediction {
        direction: TrendDirection::Up,
        confidence: 0.8,
        indicators: None,
    })))
}

fn series(len: usize) -> Vec<PricePoint> {
    (0..len)
        .map(|i| PricePoint {
            timestamp: 1_700_000_000 + i as i64 * 86_400,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1_000_000.0,
        })
        .collect()
}

fn router(
    cloud: Arc<StubCloud>,
    predictor: Arc<FixedPredictor>,
    device: Arc<DeviceStatusMonitor>,
) -> HybridMlRouter {
    HybridMlRouter::new(cloud, predictor, device).with_seed(7)
}

const CLOUD_PATH: [f64; 7] = [110.0; 7];

#[tokio::test]
async fn test_cloud_success_is_tagged_cloud() {
    let cloud = StubCloud::new(CloudBehavior::Succeed(CLOUD_PATH.to_vec()));
    let device = Arc::new(DeviceStatusMonitor::default());
    let router = router(cloud.clone(), up_predictor(), device);

    let result = router
        .get_prediction("AAPL", &series(30), &MlConfig::default())
        .await
        .unwrap();

    assert_eq!(result.source, PredictionSource::Cloud);
    assert_eq!(result.predictions, CLOUD_PATH.to_vec());
    assert_eq!(result.model_version, "lstm-v2");
    assert!(!result.is_offline);
    assert_eq!(cloud.calls(), 1);
}

#[tokio::test]
async fn test_cloud_failure_falls_back_to_on_device() {
    let cloud = StubCloud::new(CloudBehavior::Fail);
    let device = Arc::new(DeviceStatusMonitor::default());
    let router = router(cloud.clone(), up_predictor(), device);

    let result = router
        .get_prediction("AAPL", &series(30), &MlConfig::default())
        .await
        .unwrap();

    assert_eq!(result.source, PredictionSource::OnDeviceFallback);
    assert!(result.source.is_degraded());
    assert_eq!(result.predictions.len(), 7);
    assert_eq!(result.current_price, 100.0);
    assert_eq!(result.model_version, "fixed-v1");
    assert_eq!(cloud.calls(), 1);
}

#[tokio::test]
async fn test_cloud_failure_without_fallback_is_error() {
    let cloud = StubCloud::new(CloudBehavior::Fail);
    let device = Arc::new(DeviceStatusMonitor::default());
    let router = router(cloud, up_predictor(), device);
    let config = MlConfig {
        allow_on_device_fallback: false,
        ..MlConfig::default()
    };

    let result = router.get_prediction("AAPL", &series(30), &config).await;

    assert!(matches!(result, Err(MlError::Status { status: 503, .. })));
}

#[tokio::test]
async fn test_slow_cloud_times_out_and_falls_back() {
    let cloud = StubCloud::new(CloudBehavior::Hang);
    let device = Arc::new(DeviceStatusMonitor::default());
    let router = router(cloud, up_predictor(), device);
    let config = MlConfig {
        max_latency_ms: 50,
        ..MlConfig::default()
    };

    let result = router
        .get_prediction("AAPL", &series(30), &config)
        .await
        .unwrap();
    assert_eq!(result.source, PredictionSource::OnDeviceFallback);

    let strict = MlConfig {
        allow_on_device_fallback: false,
        ..config
    };
    let err = router
        .get_prediction("AAPL", &series(30), &strict)
        .await
        .unwrap_err();
    assert_eq!(err, MlError::Timeout { duration_ms: 50 });
}

#[tokio::test]
async fn test_offline_device_never_calls_cloud() {
    let cloud = StubCloud::new(CloudBehavior::Succeed(CLOUD_PATH.to_vec()));
    let device = Arc::new(DeviceStatusMonitor::new(DeviceStatus {
        network_available: false,
        battery_percent: 90,
        transport: NetworkTransport::None,
    }));
    let router = router(cloud.clone(), up_predictor(), device);

    let result = router
        .get_prediction("AAPL", &series(80), &MlConfig::default())
        .await
        .unwrap();

    assert_eq!(result.source, PredictionSource::OnDevice);
    assert!(result.is_offline);
    assert_eq!(cloud.calls(), 0);
}

#[tokio::test]
async fn test_low_battery_and_metered_cellular_stay_local() {
    let cloud = StubCloud::new(CloudBehavior::Succeed(CLOUD_PATH.to_vec()));
    let device = Arc::new(DeviceStatusMonitor::new(DeviceStatus {
        network_available: true,
        battery_percent: 19,
        transport: NetworkTransport::Wifi,
    }));
    let router = router(cloud.clone(), up_predictor(), device.clone());

    let low_battery = router
        .get_prediction("AAPL", &series(30), &MlConfig::default())
        .await
        .unwrap();
    assert_eq!(low_battery.source, PredictionSource::OnDevice);
    assert!(!low_battery.is_offline);

    device.set_battery_percent(80);
    device.set_transport(NetworkTransport::Cellular { unmetered: false });
    let metered = router
        .get_prediction("AAPL", &series(30), &MlConfig::default())
        .await
        .unwrap();
    assert_eq!(metered.source, PredictionSource::OnDevice);

    device.set_transport(NetworkTransport::Cellular { unmetered: true });
    let unmetered = router
        .get_prediction("AAPL", &series(30), &MlConfig::default())
        .await
        .unwrap();
    assert_eq!(unmetered.source, PredictionSource::Cloud);
    assert_eq!(cloud.calls(), 1);
}

#[tokio::test]
async fn test_long_history_blends_both_paths() {
    let history = series(60);
    let cloud = StubCloud::new(CloudBehavior::Succeed(CLOUD_PATH.to_vec()));
    let device = Arc::new(DeviceStatusMonitor::default());

    let ensemble = router(cloud.clone(), up_predictor(), device.clone())
        .get_prediction("AAPL", &history, &MlConfig::default())
        .await
        .unwrap();

    // Same seed, same features: the local leg of the ensemble is reproducible.
    let local_only = MlConfig {
        prefer_cloud: false,
        ..MlConfig::default()
    };
    let local = router(cloud.clone(), up_predictor(), device)
        .get_prediction("AAPL", &history, &local_only)
        .await
        .unwrap();

    assert_eq!(ensemble.source, PredictionSource::Ensemble);
    assert_eq!(ensemble.model_version, "ensemble-v1.0");
    assert_eq!(ensemble.predictions.len(), 7);
    for (i, blended) in ensemble.predictions.iter().enumerate() {
        let expected = CLOUD_PATH[i] * 0.7 + local.predictions[i] * 0.3;
        assert!((blended - expected).abs() < 1e-9);
    }
    assert_eq!(
        ensemble.confidence_scores,
        vec![0.9, 0.88, 0.86, 0.84, 0.82, 0.8, 0.78]
    );

    let last = ensemble.predictions[6];
    assert!((ensemble.predicted_change_percent - (last - 100.0)).abs() < 1e-9);
    assert_eq!(cloud.calls(), 1);
}

#[tokio::test]
async fn test_long_history_with_cloud_down_uses_local_leg() {
    let cloud = StubCloud::new(CloudBehavior::Fail);
    let device = Arc::new(DeviceStatusMonitor::default());
    let router = router(cloud, up_predictor(), device);
    let config = MlConfig {
        allow_on_device_fallback: false,
        ..MlConfig::default()
    };

    let result = router
        .get_prediction("AAPL", &series(90), &config)
        .await
        .unwrap();

    assert_eq!(result.source, PredictionSource::OnDeviceFallback);
}

#[tokio::test]
async fn test_missing_model_uses_rule_based_trend() {
    let cloud = StubCloud::new(CloudBehavior::Fail);
    let device = Arc::new(DeviceStatusMonitor::default());
    let router = router(cloud, Arc::new(FixedPredictor(None)), device);

    let result = router
        .get_prediction("AAPL", &series(12), &MlConfig::default())
        .await
        .unwrap();

    assert_eq!(result.source, PredictionSource::OnDevice);
    assert_eq!(result.model_version, "rule-based-v1.0");
    assert_eq!(result.trend, "neutral");
    assert!(
        result
            .confidence_scores
            .windows(2)
            .all(|pair| pair[0] >= pair[1])
    );
    assert!(result.confidence_scores.iter().all(|c| *c >= 0.5));
}

#[tokio::test]
async fn test_empty_history_is_insufficient_data() {
    let cloud = StubCloud::new(CloudBehavior::Fail);
    let device = Arc::new(DeviceStatusMonitor::default());
    let router = router(cloud, up_predictor(), device);

    let result = router
        .get_prediction("AAPL", &[], &MlConfig::default())
        .await;

    assert!(matches!(result, Err(MlError::InsufficientData { .. })));
}

#[tokio::test]
async fn test_offline_flag_reflects_connectivity_after_the_call() {
    let device = Arc::new(DeviceStatusMonitor::default());
    let cloud = Arc::new(DisconnectingCloud {
        device: device.clone(),
    });
    let router = HybridMlRouter::new(cloud, up_predictor(), device.clone()).with_seed(7);

    let result = router
        .get_prediction("AAPL", &series(30), &MlConfig::default())
        .await
        .unwrap();

    assert_eq!(result.source, PredictionSource::Cloud);
    assert_eq!(result.predictions, CLOUD_PATH.to_vec());
    assert!(result.is_offline);
    assert!(!device.status().network_available);
}
