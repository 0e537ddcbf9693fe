//! Driver adapter
//!
//! [`WifiDriver`] turns each hardware operation into one async call with a
//! result-or-error outcome. Implementations do not retry and keep no state
//! beyond what the OS reports; every call names the interface it targets.
//! Callers are responsible for serializing mutating calls per interface.

pub mod wpa_cli;

use crate::error::DriverResult;
use crate::model::{ConnectionStatus, Network};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

pub use wpa_cli::WpaCliDriver;

/// Common interface for wireless control backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WifiDriver: Send + Sync {
    /// Enumerate wireless interfaces; an empty list means no hardware
    async fn list_interfaces(&self) -> DriverResult<Vec<String>>;

    /// Check the interface can be driven and make it the backend's target
    async fn set_current_interface(&self, interface: &str) -> DriverResult<()>;

    /// Stop any supplicant bound to the interface; nothing running is success
    async fn kill_supplicant(&self, interface: &str) -> DriverResult<()>;

    /// Look up the supplicant binary, returning its path
    async fn detect_supplicant(&self) -> DriverResult<PathBuf>;

    /// Start a fresh supplicant bound to the interface
    async fn start_supplicant(&self, interface: &str) -> DriverResult<()>;

    /// Kill, detect and restart the supplicant so the interface starts from a
    /// known state.
    ///
    /// A failed kill or lookup is logged and the start is still attempted; the
    /// start outcome is the result.
    async fn reset_supplicant(&self, interface: &str) -> DriverResult<()> {
        if let Err(e) = self.kill_supplicant(interface).await {
            warn!("Failed to stop supplicant on {}: {}", interface, e);
        }

        match self.detect_supplicant().await {
            Ok(path) => debug!("Found supplicant at {}", path.display()),
            Err(e) => warn!("Supplicant lookup failed: {}", e),
        }

        self.start_supplicant(interface).await
    }

    /// Trigger an active scan; results ordered by descending signal level
    async fn scan(&self, interface: &str) -> DriverResult<Vec<Network>>;

    /// Current link status of the interface
    async fn status(&self, interface: &str) -> DriverResult<ConnectionStatus>;

    /// Join a network with no key management
    async fn connect_open(&self, interface: &str, ssid: &str) -> DriverResult<()>;

    /// Join a network using a pre-shared passphrase
    async fn connect_secured(&self, interface: &str, ssid: &str, password: &str)
        -> DriverResult<()>;

    /// Drop the current association
    async fn disconnect(&self, interface: &str) -> DriverResult<()>;
}
