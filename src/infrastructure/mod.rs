pub mod core;
pub mod device;
pub mod market_data;
pub mod ml_api;

pub use device::DeviceStatusMonitor;
pub use ml_api::CloudMlClient;
