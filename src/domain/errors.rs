use thiserror::Error;

/// Errors raised by the prediction core and its inference backends
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MlError {
    #[error("Cloud transport failure: {reason}")]
    Transport { reason: String },

    #[error("Cloud service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse cloud response: {reason}")]
    Parse { reason: String },

    #[error("Invalid cloud response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Cloud call exceeded {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("On-device model is not available")]
    ModelUnavailable,

    #[error("On-device inference failed: {reason}")]
    Inference { reason: String },

    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Both predictions failed (cloud: {cloud}; on-device: {on_device})")]
    AllPathsFailed { cloud: String, on_device: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("History unavailable: {0}")]
    History(#[from] MarketDataError),
}

impl MlError {
    /// Whether the caller may reasonably try the same request again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MlError::Transport { .. }
                | MlError::Timeout { .. }
                | MlError::AllPathsFailed { .. }
                | MlError::Status {
                    status: 500..=599,
                    ..
                }
        )
    }
}

/// Errors related to quote/history retrieval
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MarketDataError {
    #[error("Upstream quote provider failed: {reason}")]
    Upstream { reason: String },

    #[error("No data found for {symbol}")]
    NotFound { symbol: String },

    #[error("Invalid market data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },
}
