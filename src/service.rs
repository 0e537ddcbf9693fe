//! Wifi control service
//!
//! The caller-facing contract. Each operation looks like a plain async
//! request/response call and internally:
//! - validates caller input before anything touches the driver,
//! - resolves the target interface through the [`InterfaceRegistry`],
//! - takes the per-interface permit for mutating operations,
//! - bounds the driver call with a timeout,
//! - logs driver failures once and re-surfaces them as [`WifiError::Service`].
//!
//! No lock on shared state is held across a driver call except the
//! per-interface permit of a mutating operation, so scans and status queries
//! from other callers are never starved.

use crate::config::ServiceSettings;
use crate::driver::WifiDriver;
use crate::error::{DriverError, WifiError, WifiResult};
use crate::guard::InterfaceGuards;
use crate::model::{ConnectRequest, ConnectionStatus, Network};
use crate::registry::InterfaceRegistry;
use crate::validation;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Orchestrates one wireless interface at a time on behalf of remote callers
pub struct WifiService {
    driver: Arc<dyn WifiDriver>,
    registry: InterfaceRegistry,
    guards: InterfaceGuards,
    /// Only one interface selection in flight
    selection: Mutex<()>,
    settings: ServiceSettings,
}

impl WifiService {
    /// Create a service with an empty registry
    pub fn new(driver: Arc<dyn WifiDriver>, settings: ServiceSettings) -> Self {
        Self::with_registry(driver, settings, InterfaceRegistry::new())
    }

    /// Create a service around an existing registry
    pub fn with_registry(
        driver: Arc<dyn WifiDriver>,
        settings: ServiceSettings,
        registry: InterfaceRegistry,
    ) -> Self {
        let guards = InterfaceGuards::new(settings.busy_policy, settings.lock_wait());
        Self {
            driver,
            registry,
            guards,
            selection: Mutex::new(()),
            settings,
        }
    }

    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }

    /// List wireless interfaces as the driver currently reports them
    pub async fn get_available_interfaces(&self) -> WifiResult<Vec<String>> {
        self.bounded(
            "list interfaces",
            None,
            self.settings.operation_timeout(),
            self.driver.list_interfaces(),
        )
        .await
    }

    /// Re-enumerate interfaces into the registry
    ///
    /// Returns the resulting current interface.
    pub async fn refresh_interfaces(&self) -> WifiResult<Option<String>> {
        let interfaces = self.get_available_interfaces().await?;
        Ok(self.registry.replace_available(interfaces).await)
    }

    /// The interface operations target by default
    pub async fn current_interface(&self) -> Option<String> {
        self.registry.current().await
    }

    /// Make `name` the current interface
    ///
    /// Atomic: the registry changes only after the driver accepted the
    /// interface.
    pub async fn use_interface(&self, name: &str) -> WifiResult<()> {
        validation::validate_interface_name(name)?;

        let _selecting = self.selection.lock().await;

        if !self.registry.contains(name).await {
            return Err(WifiError::NotFound(name.to_string()));
        }

        let _permit = self.guards.acquire(name).await?;

        self.bounded(
            "use interface",
            Some(name),
            self.settings.operation_timeout(),
            self.driver.set_current_interface(name),
        )
        .await?;

        self.registry.select(name).await?;
        info!("Using interface {}", name);
        Ok(())
    }

    /// Link status of `interface`, or of the current interface when `None`
    pub async fn get_status(&self, interface: Option<&str>) -> WifiResult<ConnectionStatus> {
        let interface = match interface {
            Some(name) => {
                validation::validate_interface_name(name)?;
                name.to_string()
            }
            None => self.require_current().await?,
        };

        self.bounded(
            "status",
            Some(&interface),
            self.settings.operation_timeout(),
            self.driver.status(&interface),
        )
        .await
    }

    /// Scan on the current interface
    ///
    /// Driver ordering is preserved; nothing is filtered or deduplicated.
    pub async fn get_available_networks(&self) -> WifiResult<Vec<Network>> {
        let interface = self.require_current().await?;

        let networks = self
            .bounded(
                "scan",
                Some(&interface),
                self.settings.operation_timeout(),
                self.driver.scan(&interface),
            )
            .await?;

        debug!("Scan on {} returned {} networks", interface, networks.len());
        Ok(networks)
    }

    /// Join `ssid` on the current interface
    ///
    /// The secured path is used only for a non-empty password.
    pub async fn connect(&self, ssid: &str, password: Option<&str>) -> WifiResult<()> {
        let request = ConnectRequest::new(ssid, password.map(str::to_string));
        self.connect_with(&request).await
    }

    pub async fn connect_with(&self, request: &ConnectRequest) -> WifiResult<()> {
        validation::validate_ssid(&request.ssid)?;
        if let Some(password) = request.password.as_deref() {
            validation::validate_password(password)?;
        }

        let interface = self.require_current().await?;
        let _permit = self.guards.acquire(&interface).await?;

        info!("Connecting {} to '{}'", interface, request.ssid);

        let ssid = request.ssid.as_str();
        match request.password.as_deref() {
            Some(password) if request.is_secured() => {
                self.bounded(
                    "connect",
                    Some(&interface),
                    self.settings.connect_timeout(),
                    self.driver.connect_secured(&interface, ssid, password),
                )
                .await
            }
            _ => {
                self.bounded(
                    "connect",
                    Some(&interface),
                    self.settings.connect_timeout(),
                    self.driver.connect_open(&interface, ssid),
                )
                .await
            }
        }
    }

    /// Drop the association on the current interface
    ///
    /// Always delegates, so disconnecting twice is not an error unless the
    /// driver says so.
    pub async fn disconnect(&self) -> WifiResult<()> {
        let interface = self.require_current().await?;
        let _permit = self.guards.acquire(&interface).await?;

        info!("Disconnecting {}", interface);

        self.bounded(
            "disconnect",
            Some(&interface),
            self.settings.operation_timeout(),
            self.driver.disconnect(&interface),
        )
        .await
    }

    /// Kill, detect and restart the supplicant on `interface`
    pub async fn reset_supplicant(&self, interface: &str) -> WifiResult<()> {
        validation::validate_interface_name(interface)?;
        let _permit = self.guards.acquire(interface).await?;

        info!("Resetting supplicant on {}", interface);

        self.bounded(
            "reset supplicant",
            Some(interface),
            self.settings.supplicant_timeout(),
            self.driver.reset_supplicant(interface),
        )
        .await
    }

    async fn require_current(&self) -> WifiResult<String> {
        self.registry.current().await.ok_or(WifiError::NoInterface)
    }

    /// Run one driver call under `limit`, translating its outcome
    async fn bounded<T, F>(
        &self,
        operation: &str,
        interface: Option<&str>,
        limit: Duration,
        call: F,
    ) -> WifiResult<T>
    where
        F: Future<Output = Result<T, DriverError>>,
    {
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(driver_failure(operation, interface, e)),
            Err(_) => {
                error!(
                    "{} on {} timed out after {:?}",
                    operation,
                    interface.unwrap_or("-"),
                    limit
                );
                Err(WifiError::timeout(operation, limit))
            }
        }
    }
}

/// Log a driver failure with full detail and wrap it for callers
fn driver_failure(operation: &str, interface: Option<&str>, err: DriverError) -> WifiError {
    error!(
        "{} on {} failed: {:?}",
        operation,
        interface.unwrap_or("-"),
        err
    );
    WifiError::Service(validation::sanitize_error_message(&err.to_string()))
}
