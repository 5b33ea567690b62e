pub mod feature_extractor;
pub mod forecast;
pub mod hybrid_router;
pub mod onnx_predictor;
pub mod predictor;
pub mod strategy_selector;

pub use hybrid_router::HybridMlRouter;
pub use onnx_predictor::OnnxTrendPredictor;
pub use predictor::TrendPredictor;
pub use strategy_selector::{RoutingStrategy, StrategySelector};
