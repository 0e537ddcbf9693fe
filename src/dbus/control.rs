//! org.wifictl.Control object
//!
//! Thin adapter between D-Bus calls and [`WifiService`]. All policy lives in
//! the service; this layer only converts arguments, records and errors.

use super::types::*;
use crate::error::WifiError;
use crate::service::WifiService;
use std::sync::Arc;
use tracing::{debug, info};
use zbus::interface;

/// Named errors returned to D-Bus callers
#[derive(Debug, zbus::DBusError)]
#[zbus(prefix = "org.wifictl.Error")]
pub enum ControlError {
    #[zbus(error)]
    ZBus(zbus::Error),
    Validation(String),
    NotFound(String),
    NoInterface(String),
    Busy(String),
    Timeout(String),
    Service(String),
}

impl From<WifiError> for ControlError {
    fn from(err: WifiError) -> Self {
        match err {
            WifiError::Validation(msg) => ControlError::Validation(msg),
            WifiError::NotFound(name) => ControlError::NotFound(name),
            WifiError::NoInterface => ControlError::NoInterface(err.to_string()),
            WifiError::Busy(name) => ControlError::Busy(name),
            WifiError::Timeout(msg) => ControlError::Timeout(msg),
            WifiError::Service(msg) => ControlError::Service(msg),
            WifiError::Config(msg) => ControlError::Service(msg),
        }
    }
}

/// The exported control object
#[derive(Clone)]
pub struct WifiControl {
    service: Arc<WifiService>,
}

impl WifiControl {
    pub fn new(service: Arc<WifiService>) -> Self {
        Self { service }
    }
}

#[interface(name = "org.wifictl.Control")]
impl WifiControl {
    /// Wireless interfaces the driver reports right now
    async fn get_available_interfaces(&self) -> Result<Vec<String>, ControlError> {
        Ok(self.service.get_available_interfaces().await?)
    }

    /// Select the interface later calls operate on
    async fn use_interface(&self, name: &str) -> Result<(), ControlError> {
        info!("D-Bus: UseInterface {}", name);
        Ok(self.service.use_interface(name).await?)
    }

    /// Current interface, empty when none is selected
    async fn get_current_interface(&self) -> String {
        self.service.current_interface().await.unwrap_or_default()
    }

    /// Link status; an empty `interface` means the current one
    async fn get_status(&self, interface: &str) -> Result<StatusRecord, ControlError> {
        let target = (!interface.is_empty()).then_some(interface);
        let status = self.service.get_status(target).await?;
        Ok(status.into())
    }

    /// Scan on the current interface
    async fn get_available_networks(&self) -> Result<Vec<NetworkRecord>, ControlError> {
        let networks = self.service.get_available_networks().await?;
        debug!("D-Bus: returning {} networks", networks.len());
        Ok(networks.into_iter().map(NetworkRecord::from).collect())
    }

    /// Join a network; an empty password joins it open
    async fn connect(&self, ssid: &str, password: &str) -> Result<(), ControlError> {
        info!("D-Bus: Connect '{}'", ssid);
        let password = (!password.is_empty()).then_some(password);
        Ok(self.service.connect(ssid, password).await?)
    }

    async fn disconnect(&self) -> Result<(), ControlError> {
        info!("D-Bus: Disconnect");
        Ok(self.service.disconnect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceSettings;
    use crate::driver::MockWifiDriver;
    use crate::model::{ConnectionStatus, LinkState, Network};
    use crate::registry::InterfaceRegistry;

    fn control(driver: MockWifiDriver) -> WifiControl {
        let registry = InterfaceRegistry::with_interfaces(["wlan0", "wlan1"]);
        let service = WifiService::with_registry(Arc::new(driver), ServiceSettings::default(), registry);
        WifiControl::new(Arc::new(service))
    }

    #[tokio::test]
    async fn test_error_mapping() {
        assert!(matches!(
            ControlError::from(WifiError::NoInterface),
            ControlError::NoInterface(msg) if msg == "No wireless interface selected"
        ));
        assert!(matches!(
            ControlError::from(WifiError::Busy("wlan0".to_string())),
            ControlError::Busy(name) if name == "wlan0"
        ));
        assert!(matches!(
            ControlError::from(WifiError::validation("Must provide a ssid")),
            ControlError::Validation(msg) if msg == "Must provide a ssid"
        ));
    }

    #[tokio::test]
    async fn test_empty_password_connects_open() {
        let mut driver = MockWifiDriver::new();
        driver.expect_set_current_interface().returning(|_| Ok(()));
        driver
            .expect_connect_open()
            .withf(|iface, ssid| iface == "wlan0" && ssid == "Cafe")
            .times(1)
            .returning(|_, _| Ok(()));
        driver.expect_connect_secured().never();

        let control = control(driver);
        control.use_interface("wlan0").await.unwrap();
        control.connect("Cafe", "").await.unwrap();
    }

    #[tokio::test]
    async fn test_status_empty_interface_means_current() {
        let mut driver = MockWifiDriver::new();
        driver.expect_set_current_interface().returning(|_| Ok(()));
        driver
            .expect_status()
            .withf(|iface| iface == "wlan1")
            .returning(|iface| {
                let mut status = ConnectionStatus::disconnected(iface);
                status.state = LinkState::Completed;
                status.ssid = "Home".to_string();
                Ok(status)
            });

        let control = control(driver);
        assert!(matches!(
            control.get_status("").await,
            Err(ControlError::NoInterface(_))
        ));

        control.use_interface("wlan1").await.unwrap();
        let record = control.get_status("").await.unwrap();
        assert_eq!(record.interface, "wlan1");
        assert_eq!(record.state, "completed");
        assert_eq!(record.ssid, "Home");
        assert_eq!(control.get_current_interface().await, "wlan1");
    }

    #[tokio::test]
    async fn test_networks_are_converted_in_order() {
        let mut driver = MockWifiDriver::new();
        driver.expect_set_current_interface().returning(|_| Ok(()));
        driver.expect_scan().returning(|_| {
            Ok(vec![
                Network {
                    ssid: "B".to_string(),
                    bssid: "00:00:00:00:00:02".to_string(),
                    frequency: 2437,
                    signal_level: -40,
                    flags: "[WPA2-PSK-CCMP][ESS]".to_string(),
                },
                Network {
                    ssid: "A".to_string(),
                    bssid: "00:00:00:00:00:01".to_string(),
                    frequency: 2412,
                    signal_level: -70,
                    flags: "[ESS]".to_string(),
                },
            ])
        });

        let control = control(driver);
        control.use_interface("wlan0").await.unwrap();
        let records = control.get_available_networks().await.unwrap();
        let ssids: Vec<_> = records.iter().map(|r| r.ssid.as_str()).collect();
        assert_eq!(ssids, vec!["B", "A"]);
    }
}
