//! Startup sequence
//!
//! Runs once when the daemon starts: enumerate interfaces, select the first
//! one, and reset its supplicant so the driver starts from a known state.
//! Every step logs its failure and the sequence carries on; the service
//! keeps accepting calls whatever happens here.

use crate::service::WifiService;
use serde::Serialize;
use tracing::{info, warn};

/// What the startup sequence managed to do
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub interfaces: Vec<String>,
    pub selected: Option<String>,
    pub supplicant_ready: bool,
    /// Messages of the steps that failed
    pub failures: Vec<String>,
}

/// Bring the service to its initial state, best effort
pub async fn run(service: &WifiService) -> BootstrapReport {
    let mut report = BootstrapReport::default();

    match service.get_available_interfaces().await {
        Ok(interfaces) => {
            info!("Found {} wireless interface(s): {:?}", interfaces.len(), interfaces);
            report.interfaces = interfaces;
        }
        Err(e) => {
            warn!("Interface discovery failed: {}", e);
            report.failures.push(format!("discover interfaces: {}", e));
        }
    }

    service.registry().replace_available(report.interfaces.clone()).await;

    let Some(first) = report.interfaces.first().cloned() else {
        warn!("No wireless interface found; calls will fail until one appears");
        return report;
    };

    // Registers with the driver too; the registry already points at it either way
    if let Err(e) = service.use_interface(&first).await {
        warn!("Failed to select {}: {}", first, e);
        report.failures.push(format!("select {}: {}", first, e));
    }
    report.selected = service.current_interface().await;

    match service.reset_supplicant(&first).await {
        Ok(()) => {
            info!("Supplicant ready on {}", first);
            report.supplicant_ready = true;
        }
        Err(e) => {
            warn!("Supplicant reset on {} failed: {}", first, e);
            report.failures.push(format!("reset supplicant on {}: {}", first, e));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceSettings;
    use crate::driver::MockWifiDriver;
    use crate::error::DriverError;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_no_interfaces() {
        let mut driver = MockWifiDriver::new();
        driver.expect_list_interfaces().returning(|| Ok(Vec::new()));
        driver.expect_reset_supplicant().never();

        let service = WifiService::new(Arc::new(driver), ServiceSettings::default());
        let report = run(&service).await;

        assert!(report.interfaces.is_empty());
        assert_eq!(report.selected, None);
        assert!(!report.supplicant_ready);
        assert_eq!(service.current_interface().await, None);
    }

    #[tokio::test]
    async fn test_selects_first_and_resets_it() {
        let mut driver = MockWifiDriver::new();
        driver
            .expect_list_interfaces()
            .returning(|| Ok(vec!["wlan0".to_string(), "wlan1".to_string()]));
        driver
            .expect_set_current_interface()
            .withf(|iface| iface == "wlan0")
            .returning(|_| Ok(()));
        driver
            .expect_reset_supplicant()
            .withf(|iface| iface == "wlan0")
            .times(1)
            .returning(|_| Ok(()));

        let service = WifiService::new(Arc::new(driver), ServiceSettings::default());
        let report = run(&service).await;

        assert_eq!(report.interfaces, vec!["wlan0", "wlan1"]);
        assert_eq!(report.selected.as_deref(), Some("wlan0"));
        assert!(report.supplicant_ready);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_failures_do_not_abort() {
        let mut driver = MockWifiDriver::new();
        driver
            .expect_list_interfaces()
            .returning(|| Ok(vec!["wlan0".to_string()]));
        driver
            .expect_set_current_interface()
            .returning(|iface| Err(DriverError::NotWireless(iface.to_string())));
        driver
            .expect_reset_supplicant()
            .times(1)
            .returning(|_| Err(DriverError::NotInstalled("wpa_supplicant".to_string())));

        let service = WifiService::new(Arc::new(driver), ServiceSettings::default());
        let report = run(&service).await;

        // Still the default target even though the driver refused it
        assert_eq!(report.selected.as_deref(), Some("wlan0"));
        assert!(!report.supplicant_ready);
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_discovery_failure() {
        let mut driver = MockWifiDriver::new();
        driver
            .expect_list_interfaces()
            .returning(|| Err(DriverError::Parse("garbage".to_string())));

        let service = WifiService::new(Arc::new(driver), ServiceSettings::default());
        let report = run(&service).await;

        assert!(report.interfaces.is_empty());
        assert_eq!(report.failures.len(), 1);
    }
}
