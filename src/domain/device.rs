use serde::{Deserialize, Serialize};

/// Battery percentage below which the cloud path is avoided.
pub const LOW_BATTERY_THRESHOLD: u8 = 20;

/// Active network transport as reported by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkTransport {
    None,
    Wifi,
    Ethernet,
    Cellular { unmetered: bool },
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionQuality {
    Good,
    Poor,
}

impl NetworkTransport {
    /// Coarse capability check, no throughput is measured.
    pub fn quality(&self) -> ConnectionQuality {
        match self {
            NetworkTransport::Wifi | NetworkTransport::Ethernet => ConnectionQuality::Good,
            NetworkTransport::Cellular { unmetered: true } => ConnectionQuality::Good,
            NetworkTransport::Cellular { unmetered: false }
            | NetworkTransport::Other
            | NetworkTransport::None => ConnectionQuality::Poor,
        }
    }
}

/// Snapshot of the environmental signals the strategy selector reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub network_available: bool,
    /// 0-100
    pub battery_percent: u8,
    pub transport: NetworkTransport,
}

impl DeviceStatus {
    pub fn is_battery_low(&self) -> bool {
        self.battery_percent < LOW_BATTERY_THRESHOLD
    }

    pub fn connection_quality(&self) -> ConnectionQuality {
        self.transport.quality()
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            network_available: true,
            battery_percent: 100,
            transport: NetworkTransport::Wifi,
        }
    }
}
