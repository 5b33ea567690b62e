// Device connectivity and battery signals
pub mod device;

// Domain-specific error types
pub mod errors;

// Prediction, sentiment and feature types
pub mod ml;

// Port interfaces
pub mod ports;

pub mod quote;
