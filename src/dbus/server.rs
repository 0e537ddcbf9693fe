//! Bus registration for the control object

use super::control::WifiControl;
use super::types::*;
use crate::config::BusKind;
use crate::error::{WifiError, WifiResult};
use crate::service::WifiService;
use std::sync::Arc;
use tracing::{error, info};
use zbus::Connection;

/// Owns the bus connection the control object is served on
pub struct ControlServer {
    connection: Connection,
}

impl ControlServer {
    /// Connect to the bus, export the control object and claim the name
    pub async fn start(service: Arc<WifiService>, bus: BusKind) -> WifiResult<Self> {
        info!("Starting wifictl D-Bus service on the {:?} bus", bus);

        let connection = match bus {
            BusKind::System => Connection::system().await,
            BusKind::Session => Connection::session().await,
        }
        .map_err(|e| WifiError::Service(format!("Failed to connect to D-Bus: {}", e)))?;

        connection
            .object_server()
            .at(WIFICTL_DBUS_PATH, WifiControl::new(service))
            .await
            .map_err(|e| WifiError::Service(format!("Failed to register control object: {}", e)))?;

        info!("Registered {} at {}", WIFICTL_DBUS_INTERFACE, WIFICTL_DBUS_PATH);

        if let Err(e) = connection.request_name(WIFICTL_DBUS_SERVICE).await {
            error!("Failed to request D-Bus name '{}': {}", WIFICTL_DBUS_SERVICE, e);
            return Err(WifiError::Service(format!(
                "Failed to request name {}: {}",
                WIFICTL_DBUS_SERVICE, e
            )));
        }

        info!("Registered D-Bus service: {}", WIFICTL_DBUS_SERVICE);
        Ok(Self { connection })
    }

    /// Release the well-known name
    pub async fn stop(&self) -> WifiResult<()> {
        info!("Stopping wifictl D-Bus service");
        self.connection
            .release_name(WIFICTL_DBUS_SERVICE)
            .await
            .map_err(|e| WifiError::Service(format!("Failed to release name: {}", e)))?;
        Ok(())
    }
}
