use super::dto::{
    DEFAULT_INDICATORS, HealthCheckDto, IndicatorRequestDto, IndicatorResponseDto,
    MarketOverviewDto, PredictionRequestDto, PredictionResponseDto, SentimentRequestDto,
    SentimentResponseDto,
};
use crate::domain::errors::MlError;
use crate::domain::ml::{
    FORECAST_HORIZON_DAYS, MarketOverview, PredictionResult, PricePoint, SentimentResult,
    TechnicalIndicators,
};
use crate::domain::ports::CloudInference;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, endpoint_url};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

const HEALTH_PATH: &str = "/health";
const PREDICT_PATH: &str = "/api/v1/predict/lstm";
const SENTIMENT_PATH: &str = "/api/v1/analyze/sentiment";
const INDICATORS_PATH: &str = "/api/v1/indicators/calculate";
const MARKET_OVERVIEW_PATH: &str = "/api/v1/market/overview";

/// HTTP client for the prediction backend.
///
/// Stateless request/response mapper: every failure surfaces as an
/// [`MlError`] on the first attempt.
pub struct CloudMlClient {
    client: Client,
    base_url: Url,
}

impl CloudMlClient {
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, MlError> {
        endpoint_url(&self.base_url, path).map_err(|e| MlError::InvalidRequest {
            reason: format!("bad endpoint {}: {}", path, e),
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, MlError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MlError> {
        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    /// Major index snapshot shown on the dashboard
    pub async fn market_overview(&self) -> Result<MarketOverview, MlError> {
        let dto: MarketOverviewDto = self.get_json(MARKET_OVERVIEW_PATH).await.inspect_err(|e| {
            error!("CloudMlClient: Market overview failed: {}", e);
        })?;
        Ok(dto.into())
    }
}

fn transport_error(e: reqwest::Error) -> MlError {
    MlError::Transport {
        reason: e.to_string(),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, MlError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MlError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            MlError::Parse {
                reason: e.to_string(),
            }
        } else {
            transport_error(e)
        }
    })
}

fn ohlcv_rows(series: &[PricePoint]) -> Vec<[f32; 5]> {
    series.iter().map(PricePoint::to_ohlcv_row).collect()
}

#[async_trait]
impl CloudInference for CloudMlClient {
    async fn predict_trend(
        &self,
        symbol: &str,
        series: &[PricePoint],
    ) -> Result<PredictionResult, MlError> {
        info!("CloudMlClient: Requesting LSTM prediction for {}", symbol);
        let request = PredictionRequestDto {
            symbol,
            features: ohlcv_rows(series),
            days_to_predict: FORECAST_HORIZON_DAYS,
        };

        let dto: PredictionResponseDto = self
            .post_json(PREDICT_PATH, &request)
            .await
            .inspect_err(|e| error!("CloudMlClient: LSTM prediction failed: {}", e))?;
        dto.into_domain()
    }

    async fn analyze_sentiment(
        &self,
        texts: &[String],
        symbol: Option<&str>,
    ) -> Result<SentimentResult, MlError> {
        info!("CloudMlClient: Analyzing sentiment for {} texts", texts.len());
        let request = SentimentRequestDto { texts, symbol };

        let dto: SentimentResponseDto = self
            .post_json(SENTIMENT_PATH, &request)
            .await
            .inspect_err(|e| error!("CloudMlClient: Sentiment analysis failed: {}", e))?;
        Ok(dto.into())
    }

    async fn compute_indicators(
        &self,
        rows: &[PricePoint],
    ) -> Result<TechnicalIndicators, MlError> {
        let request = IndicatorRequestDto {
            data: ohlcv_rows(rows),
            indicators: DEFAULT_INDICATORS.iter().map(|s| s.to_string()).collect(),
        };

        let dto: IndicatorResponseDto = self
            .post_json(INDICATORS_PATH, &request)
            .await
            .inspect_err(|e| error!("CloudMlClient: Indicator calculation failed: {}", e))?;
        Ok(dto.into())
    }

    async fn is_available(&self) -> bool {
        match self.get_json::<HealthCheckDto>(HEALTH_PATH).await {
            Ok(health) => health.status == "healthy",
            Err(e) => {
                debug!("CloudMlClient: Health check failed: {}", e);
                false
            }
        }
    }
}
