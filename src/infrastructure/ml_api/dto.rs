//! Wire types for the prediction backend

use crate::domain::errors::MlError;
use crate::domain::ml::{
    FORECAST_HORIZON_DAYS, MarketIndex, MarketOverview, PredictionResult, PredictionSource,
    SentimentItem, SentimentResult, TechnicalIndicators,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_INDICATORS: &[&str] = &["rsi", "macd", "sma", "ema"];

#[derive(Debug, Serialize)]
pub struct PredictionRequestDto<'a> {
    pub symbol: &'a str,
    pub features: Vec<[f32; 5]>,
    pub days_to_predict: usize,
}

#[derive(Debug, Serialize)]
pub struct SentimentRequestDto<'a> {
    pub texts: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct IndicatorRequestDto {
    pub data: Vec<[f32; 5]>,
    pub indicators: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HealthCheckDto {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct PredictionResponseDto {
    pub symbol: String,
    pub predictions: Vec<f64>,
    pub confidence_scores: Vec<f64>,
    pub trend: String,
    pub current_price: f64,
    pub predicted_change_percent: f64,
    pub predicted_high: f64,
    pub predicted_low: f64,
    pub generated_at: String,
    pub model_version: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SentimentItemDto {
    pub text: String,
    pub label: String,
    pub score: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SentimentResponseDto {
    pub symbol: Option<String>,
    pub sentiments: Vec<SentimentItemDto>,
    pub overall_score: f64,
    pub overall_label: String,
    pub recommendation: String,
    pub confidence: f64,
    pub bullish_count: u32,
    pub bearish_count: u32,
    pub neutral_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct IndicatorResponseDto {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub sma_20: Option<f64>,
    pub ema_12: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
    #[serde(default)]
    pub signals: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct MarketIndexDto {
    pub name: String,
    pub symbol: String,
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Deserialize)]
pub struct MarketOverviewDto {
    pub indices: Vec<MarketIndexDto>,
    #[serde(default)]
    pub market_status: Option<String>,
}

/// Accepts RFC 3339 or a zone-less ISO timestamp (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl PredictionResponseDto {
    pub fn into_domain(self) -> Result<PredictionResult, MlError> {
        if self.predictions.len() != self.confidence_scores.len() {
            return Err(MlError::InvalidResponse {
                reason: format!(
                    "{} predictions but {} confidence scores",
                    self.predictions.len(),
                    self.confidence_scores.len()
                ),
            });
        }
        if self.predictions.len() != FORECAST_HORIZON_DAYS {
            return Err(MlError::InvalidResponse {
                reason: format!(
                    "expected {} forecast days, got {}",
                    FORECAST_HORIZON_DAYS,
                    self.predictions.len()
                ),
            });
        }
        let generated_at =
            parse_timestamp(&self.generated_at).ok_or_else(|| MlError::InvalidResponse {
                reason: format!("unreadable generated_at '{}'", self.generated_at),
            })?;

        let mut result = PredictionResult {
            symbol: self.symbol,
            predictions: self.predictions,
            confidence_scores: self.confidence_scores,
            trend: self.trend,
            current_price: self.current_price,
            predicted_change_percent: self.predicted_change_percent,
            predicted_high: self.predicted_high,
            predicted_low: self.predicted_low,
            generated_at,
            model_version: self.model_version,
            source: PredictionSource::Cloud,
            is_offline: false,
        };
        result.cap_confidence_decay();
        Ok(result)
    }
}

impl From<SentimentResponseDto> for SentimentResult {
    fn from(dto: SentimentResponseDto) -> Self {
        SentimentResult {
            symbol: dto.symbol,
            overall_score: dto.overall_score.clamp(-1.0, 1.0),
            overall_label: dto.overall_label,
            recommendation: dto.recommendation,
            confidence: dto.confidence,
            sentiments: dto
                .sentiments
                .into_iter()
                .map(|s| SentimentItem {
                    text: s.text,
                    label: s.label,
                    score: s.score,
                    keywords: s.keywords,
                })
                .collect(),
            bullish_count: dto.bullish_count,
            bearish_count: dto.bearish_count,
            neutral_count: dto.neutral_count,
        }
    }
}

impl From<IndicatorResponseDto> for TechnicalIndicators {
    fn from(dto: IndicatorResponseDto) -> Self {
        TechnicalIndicators {
            rsi: dto.rsi,
            macd: dto.macd,
            sma_20: dto.sma_20,
            ema_12: dto.ema_12,
            bollinger_upper: dto.bollinger_upper,
            bollinger_lower: dto.bollinger_lower,
            signals: dto.signals,
        }
    }
}

impl From<MarketOverviewDto> for MarketOverview {
    fn from(dto: MarketOverviewDto) -> Self {
        MarketOverview {
            indices: dto
                .indices
                .into_iter()
                .map(|i| MarketIndex {
                    name: i.name,
                    symbol: i.symbol,
                    value: i.value,
                    change: i.change,
                    change_percent: i.change_percent,
                })
                .collect(),
            market_status: dto.market_status.unwrap_or_else(|| "unknown".to_string()),
        }
    }
}
