use super::predictor::{TrendPredictor, indicators_from_features};
use crate::domain::errors::MlError;
use crate::domain::ml::{FEATURE_COUNT, FeatureVector, TrendDirection, TrendPrediction};
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

const OUTPUT_CLASSES: usize = 3;

/// Packaged 3-way trend classifier running on ONNX Runtime.
///
/// The session is shared by every caller and guarded by a mutex; the
/// runtime gives no reentrancy guarantee, so each `predict` runs alone.
pub struct OnnxTrendPredictor {
    session: Option<Mutex<Session>>,
    model_path: PathBuf,
}

impl OnnxTrendPredictor {
    pub fn new(model_path: PathBuf) -> Self {
        let mut predictor = Self {
            session: None,
            model_path,
        };
        predictor.load_model();
        predictor
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn load_model(&mut self) {
        if !self.model_path.exists() {
            warn!(
                "ONNX trend model not found at {:?}; using the rule-based fallback.",
                self.model_path
            );
            return;
        }

        match Session::builder() {
            Ok(mut builder) => match builder.commit_from_file(&self.model_path) {
                Ok(session) => {
                    info!("Successfully loaded ONNX trend model from {:?}", self.model_path);
                    self.session = Some(Mutex::new(session));
                }
                Err(e) => {
                    error!("Failed to load ONNX trend model: {}", e);
                }
            },
            Err(e) => {
                error!("Failed to create ONNX session builder: {}", e);
            }
        }
    }

    fn run_inference(&self, features: &FeatureVector) -> Result<Vec<f32>, MlError> {
        let inference_error = |reason: String| MlError::Inference { reason };
        let mut session = match &self.session {
            Some(m) => m
                .lock()
                .map_err(|e| inference_error(format!("Mutex lock failed: {}", e)))?,
            None => return Err(MlError::ModelUnavailable),
        };

        let shape = vec![1, FEATURE_COUNT];
        let input_value = ort::value::Value::from_array((shape.as_slice(), features.to_vec()))
            .map_err(|e| inference_error(format!("Input value creation failed: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| inference_error(e.to_string()))?;
        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| inference_error("No output found".to_string()))?;
        let data = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error(e.to_string()))?;
        Ok(data.1.to_vec())
    }
}

/// Arg-max over the class probabilities (UP, DOWN, NEUTRAL).
pub fn classify(probabilities: &[f32]) -> Option<TrendPrediction> {
    if probabilities.len() < OUTPUT_CLASSES {
        return None;
    }

    let (index, confidence) = probabilities[..OUTPUT_CLASSES]
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

    if !confidence.is_finite() {
        return None;
    }

    Some(TrendPrediction {
        direction: TrendDirection::from_class_index(index),
        confidence: confidence.clamp(0.0, 1.0),
        indicators: None,
    })
}

impl TrendPredictor for OnnxTrendPredictor {
    fn predict(&self, features: &FeatureVector) -> Option<TrendPrediction> {
        match self.run_inference(features) {
            Ok(probabilities) => {
                let mut prediction = classify(&probabilities)?;
                prediction.indicators = Some(indicators_from_features(features));
                debug!(
                    "OnnxTrendPredictor: {} ({:.2})",
                    prediction.direction, prediction.confidence
                );
                Some(prediction)
            }
            // Already reported when the model failed to load.
            Err(MlError::ModelUnavailable) => None,
            Err(e) => {
                error!("OnnxTrendPredictor: Prediction failed: {}", e);
                None
            }
        }
    }

    fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    fn name(&self) -> &str {
        "ONNX Runtime (trend classifier)"
    }

    fn version(&self) -> &str {
        "onnx-v1.0"
    }
}
