//! Prediction backend and routing configuration parsing from environment variables.

use crate::domain::ml::MlConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://10.0.2.2:8000";
pub const DEFAULT_MODEL_PATH: &str = "models/trend_model.onnx";

/// ML environment configuration
#[derive(Debug, Clone)]
pub struct MlEnvConfig {
    pub api_base_url: Url,
    pub model_path: PathBuf,
    pub prefer_cloud: bool,
    pub allow_on_device_fallback: bool,
    pub min_confidence_threshold: f32,
    pub max_latency_ms: u64,
    pub http_timeout_secs: u64,
}

impl MlEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse from an arbitrary key lookup. Unparsable numbers and flags fall
    /// back to their defaults; an invalid base URL is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = MlConfig::default();
        let parse_or =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let raw_url = parse_or("ML_API_BASE_URL", DEFAULT_API_BASE_URL);
        let api_base_url = Url::parse(&raw_url)
            .with_context(|| format!("Invalid ML_API_BASE_URL: {}", raw_url))?;

        Ok(Self {
            api_base_url,
            model_path: PathBuf::from(parse_or("ML_MODEL_PATH", DEFAULT_MODEL_PATH)),
            prefer_cloud: parse_or("ML_PREFER_CLOUD", "true")
                .parse::<bool>()
                .unwrap_or(defaults.prefer_cloud),
            allow_on_device_fallback: parse_or("ML_ALLOW_ON_DEVICE_FALLBACK", "true")
                .parse::<bool>()
                .unwrap_or(defaults.allow_on_device_fallback),
            min_confidence_threshold: parse_or("ML_MIN_CONFIDENCE", "0.6")
                .parse::<f32>()
                .unwrap_or(defaults.min_confidence_threshold),
            max_latency_ms: parse_or("ML_MAX_LATENCY_MS", "2000")
                .parse::<u64>()
                .unwrap_or(defaults.max_latency_ms),
            http_timeout_secs: parse_or("ML_HTTP_TIMEOUT_SECS", "30")
                .parse::<u64>()
                .unwrap_or(30),
        })
    }

    pub fn routing_policy(&self) -> MlConfig {
        MlConfig {
            prefer_cloud: self.prefer_cloud,
            allow_on_device_fallback: self.allow_on_device_fallback,
            min_confidence_threshold: self.min_confidence_threshold,
            max_latency_ms: self.max_latency_ms,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
