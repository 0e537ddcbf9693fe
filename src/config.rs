//! Configuration management for wifictl

use crate::error::{WifiError, WifiResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/wifictl/wifictl.toml";

/// Main wifictl configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WifiCtlConfig {
    #[serde(default)]
    pub driver: DriverSettings,
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub daemon: DaemonSettings,
    #[serde(default)]
    pub poll: PollSettings,
}

/// wpa_supplicant driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSettings {
    /// Path to wpa_supplicant binary
    #[serde(default = "default_wpa_supplicant_bin")]
    pub wpa_supplicant_bin: PathBuf,
    /// Path to wpa_cli binary
    #[serde(default = "default_wpa_cli_bin")]
    pub wpa_cli_bin: PathBuf,
    /// Supplicant control socket directory
    #[serde(default = "default_ctrl_interface")]
    pub ctrl_interface: PathBuf,
    /// Directory holding per-interface supplicant configs
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Kernel driver list passed to `wpa_supplicant -D`
    #[serde(default = "default_kernel_driver")]
    pub kernel_driver: String,
    /// Delay between triggering a scan and reading its results (ms)
    #[serde(default = "default_scan_settle_ms")]
    pub scan_settle_ms: u64,
    /// How long to wait for association to complete (seconds)
    #[serde(default = "default_association_timeout")]
    pub association_timeout_secs: u64,
}

/// What a mutating call does when its interface is already in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Wait up to `lock_wait_ms` for the interface, then fail busy
    #[default]
    Queue,
    /// Fail busy immediately
    Reject,
}

/// Service behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Upper bound for scan/status/disconnect/interface calls (seconds)
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,
    /// Upper bound for a connect call (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Upper bound for a supplicant reset (seconds)
    #[serde(default = "default_supplicant_timeout")]
    pub supplicant_timeout_secs: u64,
    #[serde(default)]
    pub busy_policy: BusyPolicy,
    /// Longest a queued mutating call waits for the interface (ms)
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,
}

/// Which message bus the daemon serves on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    System,
    Session,
}

/// Daemon settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonSettings {
    #[serde(default)]
    pub bus: BusKind,
    /// Skip interface discovery and supplicant reset at startup
    #[serde(default)]
    pub skip_bootstrap: bool,
}

/// Polling client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    /// Seconds between refreshes of the network list and status
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

fn default_wpa_supplicant_bin() -> PathBuf {
    PathBuf::from("/usr/sbin/wpa_supplicant")
}

fn default_wpa_cli_bin() -> PathBuf {
    PathBuf::from("/usr/sbin/wpa_cli")
}

fn default_ctrl_interface() -> PathBuf {
    PathBuf::from("/var/run/wpa_supplicant")
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("/etc/wpa_supplicant")
}

fn default_kernel_driver() -> String {
    "nl80211,wext".to_string()
}

fn default_scan_settle_ms() -> u64 {
    3000
}

fn default_association_timeout() -> u64 {
    30
}

fn default_operation_timeout() -> u64 {
    15
}

fn default_connect_timeout() -> u64 {
    45
}

fn default_supplicant_timeout() -> u64 {
    20
}

fn default_lock_wait_ms() -> u64 {
    10_000
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            wpa_supplicant_bin: default_wpa_supplicant_bin(),
            wpa_cli_bin: default_wpa_cli_bin(),
            ctrl_interface: default_ctrl_interface(),
            config_dir: default_config_dir(),
            kernel_driver: default_kernel_driver(),
            scan_settle_ms: default_scan_settle_ms(),
            association_timeout_secs: default_association_timeout(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            operation_timeout_secs: default_operation_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            supplicant_timeout_secs: default_supplicant_timeout(),
            busy_policy: BusyPolicy::default(),
            lock_wait_ms: default_lock_wait_ms(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
        }
    }
}

impl ServiceSettings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn supplicant_timeout(&self) -> Duration {
        Duration::from_secs(self.supplicant_timeout_secs)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Interval from a command line override if given, else from the file
    pub fn interval_or(&self, override_secs: Option<u64>) -> Duration {
        match override_secs {
            Some(secs) => Duration::from_secs(secs.max(1)),
            None => self.interval(),
        }
    }
}

impl WifiCtlConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> WifiResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WifiError::Config(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> WifiResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> WifiResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| WifiError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that constrain each other
    ///
    /// The driver's own association wait must end before the service gives
    /// up on the connect call.
    pub fn validate(&self) -> WifiResult<()> {
        if self.driver.association_timeout_secs >= self.service.connect_timeout_secs {
            return Err(WifiError::Config(format!(
                "driver.association_timeout_secs ({}) must be less than service.connect_timeout_secs ({})",
                self.driver.association_timeout_secs, self.service.connect_timeout_secs
            )));
        }
        Ok(())
    }

    /// Serialize configuration to TOML text
    pub fn to_toml(&self) -> WifiResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| WifiError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> WifiResult<()> {
        let content = self.to_toml()?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| WifiError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }
}
