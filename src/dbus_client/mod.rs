//! D-Bus client for the wifictld daemon
//!
//! Wraps `org.wifictl.Control` calls in typed async methods and turns the
//! daemon's named errors back into [`WifiError`] values.
//!
//! # Usage
//!
//! ```rust,no_run
//! use libwifictl::dbus_client::WifiCtlClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WifiCtlClient::connect().await?;
//!
//!     for network in client.get_available_networks().await? {
//!         println!("{} ({}%)", network.ssid, network.signal_percent());
//!     }
//!
//!     client.connect_network("Home", Some("hunter22")).await?;
//!     Ok(())
//! }
//! ```

use crate::config::BusKind;
use crate::dbus::types::*;
use crate::error::{WifiError, WifiResult};
use crate::model::{ConnectionStatus, Network};
use zbus::Connection;

/// Client for the wifictld control object
pub struct WifiCtlClient {
    connection: Connection,
}

impl WifiCtlClient {
    /// Connect to the daemon on the system bus
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot connect to the bus
    /// - wifictld is not running
    pub async fn connect() -> WifiResult<Self> {
        Self::connect_to(BusKind::System).await
    }

    /// Connect to the daemon on the given bus
    pub async fn connect_to(bus: BusKind) -> WifiResult<Self> {
        let connection = match bus {
            BusKind::System => Connection::system().await,
            BusKind::Session => Connection::session().await,
        }
        .map_err(|e| WifiError::Service(format!("Failed to connect to D-Bus: {}", e)))?;

        let proxy = zbus::fdo::DBusProxy::new(&connection)
            .await
            .map_err(|e| WifiError::Service(format!("Failed to create D-Bus proxy: {}", e)))?;

        let service_name = WIFICTL_DBUS_SERVICE.try_into().map_err(|_| {
            WifiError::Service(format!("Invalid D-Bus service name: {}", WIFICTL_DBUS_SERVICE))
        })?;
        match proxy.name_has_owner(service_name).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(WifiError::Service(format!(
                    "Service {} is not available. Is wifictld running?",
                    WIFICTL_DBUS_SERVICE
                )));
            }
            Err(e) => {
                return Err(WifiError::Service(format!(
                    "Failed to check service availability: {}",
                    e
                )));
            }
        }

        Ok(Self { connection })
    }

    pub async fn get_available_interfaces(&self) -> WifiResult<Vec<String>> {
        self.call_method("GetAvailableInterfaces", &()).await
    }

    pub async fn use_interface(&self, name: &str) -> WifiResult<()> {
        self.call_method("UseInterface", &(name,)).await
    }

    /// Current interface, `None` when the daemon has none selected
    pub async fn get_current_interface(&self) -> WifiResult<Option<String>> {
        let name: String = self.call_method("GetCurrentInterface", &()).await?;
        Ok((!name.is_empty()).then_some(name))
    }

    /// Status of `interface`, or of the current interface when `None`
    pub async fn get_status(&self, interface: Option<&str>) -> WifiResult<ConnectionStatus> {
        let record: StatusRecord = self
            .call_method("GetStatus", &(interface.unwrap_or(""),))
            .await?;
        Ok(record.into())
    }

    pub async fn get_available_networks(&self) -> WifiResult<Vec<Network>> {
        let records: Vec<NetworkRecord> = self.call_method("GetAvailableNetworks", &()).await?;
        Ok(records.into_iter().map(Network::from).collect())
    }

    /// Join `ssid`; `None` or an empty password joins it open
    pub async fn connect_network(&self, ssid: &str, password: Option<&str>) -> WifiResult<()> {
        self.call_method("Connect", &(ssid, password.unwrap_or("")))
            .await
    }

    pub async fn disconnect(&self) -> WifiResult<()> {
        self.call_method("Disconnect", &()).await
    }

    async fn call_method<B, R>(&self, method: &str, body: &B) -> WifiResult<R>
    where
        B: serde::ser::Serialize + zbus::zvariant::DynamicType,
        R: serde::de::DeserializeOwned + zbus::zvariant::Type,
    {
        self.connection
            .call_method(
                Some(WIFICTL_DBUS_SERVICE),
                WIFICTL_DBUS_PATH,
                Some(WIFICTL_DBUS_INTERFACE),
                method,
                body,
            )
            .await
            .map_err(remote_error)?
            .body()
            .deserialize()
            .map_err(|e| WifiError::Service(format!("Failed to deserialize response: {}", e)))
    }
}

/// Map a failed call back onto the service's error taxonomy
fn remote_error(err: zbus::Error) -> WifiError {
    match err {
        zbus::Error::MethodError(name, message, _) => {
            from_error_name(name.as_str(), message.unwrap_or_default())
        }
        other => WifiError::Service(format!("D-Bus method call failed: {}", other)),
    }
}

fn from_error_name(name: &str, message: String) -> WifiError {
    let kind = name
        .strip_prefix(WIFICTL_ERROR_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'));

    match kind {
        Some("Validation") => WifiError::Validation(message),
        Some("NotFound") => WifiError::NotFound(message),
        Some("NoInterface") => WifiError::NoInterface,
        Some("Busy") => WifiError::Busy(message),
        Some("Timeout") => WifiError::Timeout(message),
        Some("Service") => WifiError::Service(message),
        _ => WifiError::Service(format!("{}: {}", name, message)),
    }
}
