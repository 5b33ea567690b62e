// Prediction routing, feature extraction and on-device inference
pub mod ml;

// Caller-facing facade over history loading, routing and sentiment
pub mod prediction_service;
