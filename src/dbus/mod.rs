//! D-Bus surface of the wifi control service
//!
//! # D-Bus Service
//!
//! - **Service Name**: `org.wifictl.Control`
//! - **Object Path**: `/org/wifictl/Control`
//! - **Interface Name**: `org.wifictl.Control`
//!
//! | Method                   | In    | Out         |
//! |--------------------------|-------|-------------|
//! | `GetAvailableInterfaces` |       | `as`        |
//! | `UseInterface`           | `s`   |             |
//! | `GetCurrentInterface`    |       | `s`         |
//! | `GetStatus`              | `s`   | `(ssssssu)` |
//! | `GetAvailableNetworks`   |       | `a(ssuis)`  |
//! | `Connect`                | `ss`  |             |
//! | `Disconnect`             |       |             |
//!
//! An empty interface argument to `GetStatus` means the current interface;
//! an empty password to `Connect` joins an open network.
//!
//! Failures are named errors under `org.wifictl.Error`:
//! `Validation`, `NotFound`, `NoInterface`, `Busy`, `Timeout`, `Service`.
//!
//! ```bash
//! # Scan for WiFi networks
//! dbus-send --system --print-reply \
//!   --dest=org.wifictl.Control \
//!   /org/wifictl/Control \
//!   org.wifictl.Control.GetAvailableNetworks
//!
//! # Join a network
//! dbus-send --system --print-reply \
//!   --dest=org.wifictl.Control \
//!   /org/wifictl/Control \
//!   org.wifictl.Control.Connect string:"Home" string:"hunter22"
//! ```

pub mod types;
pub mod control;
pub mod server;

pub use types::*;
pub use control::{ControlError, WifiControl};
pub use server::ControlServer;
