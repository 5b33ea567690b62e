use crate::domain::device::{ConnectionQuality, DeviceStatus};
use crate::domain::ml::{MlConfig, PricePoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Minimum history before a cloud round-trip is worth it.
pub const MIN_CLOUD_DATA_POINTS: usize = 20;

/// History length at which both paths run and get blended.
pub const MIN_ENSEMBLE_DATA_POINTS: usize = 60;

/// Inference path chosen for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingStrategy {
    Cloud,
    OnDevice,
    Hybrid,
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingStrategy::Cloud => write!(f, "Cloud"),
            RoutingStrategy::OnDevice => write!(f, "OnDevice"),
            RoutingStrategy::Hybrid => write!(f, "Hybrid"),
        }
    }
}

pub struct StrategySelector;

impl StrategySelector {
    /// Picks the routing strategy for a request.
    ///
    /// First matching rule wins:
    /// - cloud not preferred, no network, battery < 20% → OnDevice
    /// - fewer than 20 points → OnDevice
    /// - poor connection (metered cellular, unknown transport) → OnDevice
    /// - 60+ points → Hybrid
    /// - otherwise → Cloud
    pub fn decide(
        series: &[PricePoint],
        config: &MlConfig,
        device: &DeviceStatus,
    ) -> RoutingStrategy {
        let strategy = Self::select(series.len(), config, device);
        debug!(
            "StrategySelector: {} points, battery {}%, transport {:?} -> {}",
            series.len(),
            device.battery_percent,
            device.transport,
            strategy
        );
        strategy
    }

    fn select(points: usize, config: &MlConfig, device: &DeviceStatus) -> RoutingStrategy {
        if !config.prefer_cloud {
            return RoutingStrategy::OnDevice;
        }
        if !device.network_available {
            return RoutingStrategy::OnDevice;
        }
        if device.is_battery_low() {
            return RoutingStrategy::OnDevice;
        }
        if points < MIN_CLOUD_DATA_POINTS {
            return RoutingStrategy::OnDevice;
        }
        if device.connection_quality() == ConnectionQuality::Poor {
            return RoutingStrategy::OnDevice;
        }
        if points >= MIN_ENSEMBLE_DATA_POINTS {
            return RoutingStrategy::Hybrid;
        }
        RoutingStrategy::Cloud
    }
}
