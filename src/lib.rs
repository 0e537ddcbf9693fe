//! wifictl - Wireless Interface Control Library
//!
//! Async service that serializes access to wireless interfaces and turns the
//! supplicant's fire-and-forget commands into request/response calls:
//! - Interface discovery and selection
//! - Network scans and link status
//! - Joining open and secured networks
//! - Startup bootstrap of the supplicant
//!
//! The service is exported on D-Bus by `wifictld`; [`dbus_client`] and the
//! `wifictl` CLI talk to it.

pub mod error;
pub mod validation;
pub mod config;
pub mod model;
pub mod driver;
pub mod registry;
pub mod guard;
pub mod service;
pub mod bootstrap;
pub mod dbus;
pub mod dbus_client;
pub mod poll;

// Re-export commonly used types
pub use error::{DriverError, DriverResult, WifiError, WifiResult};
pub use config::{BusKind, BusyPolicy, WifiCtlConfig};
pub use model::{ConnectRequest, ConnectionStatus, LinkState, Network, Security};
pub use driver::{WifiDriver, WpaCliDriver};
pub use registry::InterfaceRegistry;
pub use service::WifiService;
pub use bootstrap::BootstrapReport;
pub use dbus_client::WifiCtlClient;
pub use poll::{PollSnapshot, PollSource, Poller};
