//! Error types for wifictl
//!
//! Two layers: [`DriverError`] is what the hardware adapter reports, and
//! [`WifiError`] is the uniform taxonomy callers of the service see. Driver
//! errors never cross the service boundary unwrapped.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a [`crate::driver::WifiDriver`] implementation
#[derive(Debug, Error)]
pub enum DriverError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// External command failed
    #[error("Command '{cmd}' failed{}: {stderr}", .code.map(|c| format!(" with code {}", c)).unwrap_or_default())]
    CommandFailed {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Supplicant (or its control tool) is not installed
    #[error("{0} not installed")]
    NotInstalled(String),

    /// Interface exists but is not a wireless device
    #[error("Interface {0} is not a wireless interface")]
    NotWireless(String),

    /// Unparseable driver output
    #[error("Parse error: {0}")]
    Parse(String),

    /// Association with a network did not complete
    #[error("Association failed: {0}")]
    AssociationFailed(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Caller-facing error taxonomy of the wifi control service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WifiError {
    /// Bad caller input; never reaches the driver
    #[error("Invalid parameter: {0}")]
    Validation(String),

    /// Referenced interface is unknown
    #[error("Interface not found: {0}")]
    NotFound(String),

    /// Operation needs a current interface and none is selected
    #[error("No wireless interface selected")]
    NoInterface,

    /// Another mutating operation holds the interface
    #[error("Interface {0} is busy")]
    Busy(String),

    /// Driver call exceeded its bound
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Opaque driver or hardware failure
    #[error("{0}")]
    Service(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WifiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WifiError::Validation(msg.into())
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        WifiError::Timeout(format!(
            "{} did not complete within {}ms",
            operation.into(),
            after.as_millis()
        ))
    }
}

pub type WifiResult<T> = Result<T, WifiError>;
