use crate::domain::device::{DeviceStatus, NetworkTransport};
use crate::domain::ports::DeviceSignals;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::info;

/// Holds the latest connectivity and battery readings pushed by the host
/// platform and broadcasts every change.
pub struct DeviceStatusMonitor {
    status: RwLock<DeviceStatus>,
    event_tx: broadcast::Sender<DeviceStatus>,
}

impl DeviceStatusMonitor {
    pub fn new(initial: DeviceStatus) -> Self {
        let (event_tx, _) = broadcast::channel(16);
        Self {
            status: RwLock::new(initial),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeviceStatus> {
        self.event_tx.subscribe()
    }

    pub fn set_network_available(&self, available: bool) {
        self.update(|s| s.network_available = available);
    }

    pub fn set_battery_percent(&self, percent: u8) {
        self.update(|s| s.battery_percent = percent.min(100));
    }

    pub fn set_transport(&self, transport: NetworkTransport) {
        self.update(|s| {
            s.transport = transport;
            if transport == NetworkTransport::None {
                s.network_available = false;
            }
        });
    }

    fn update(&self, apply: impl FnOnce(&mut DeviceStatus)) {
        let changed = {
            let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
            let before = *status;
            apply(&mut status);
            (*status != before).then_some(*status)
        };

        if let Some(status) = changed {
            info!(
                "DeviceStatusMonitor: network={} battery={}% transport={:?}",
                status.network_available, status.battery_percent, status.transport
            );
            let _ = self.event_tx.send(status);
        }
    }
}

impl Default for DeviceStatusMonitor {
    fn default() -> Self {
        Self::new(DeviceStatus::default())
    }
}

impl DeviceSignals for DeviceStatusMonitor {
    fn status(&self) -> DeviceStatus {
        *self.status.read().unwrap_or_else(|e| e.into_inner())
    }
}
