//! Data carried between the driver, the service and callers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A wireless network as reported by one scan
///
/// Networks are ephemeral: each scan produces a fresh list and there is no
/// identity beyond the SSID within that list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Empty for hidden networks
    pub ssid: String,
    pub bssid: String,
    /// MHz
    pub frequency: u32,
    /// dBm, negative
    pub signal_level: i32,
    /// Raw capability flags, e.g. `[WPA2-PSK-CCMP][ESS]`
    pub flags: String,
}

/// Security class derived from a network's flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    Wpa2,
    Wpa,
    Wep,
    Open,
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Security::Wpa2 => "wpa2",
            Security::Wpa => "wpa",
            Security::Wep => "wep",
            Security::Open => "open",
        };
        f.write_str(s)
    }
}

impl Network {
    /// Strongest security token present in the flags
    pub fn security(&self) -> Security {
        let flags = self.flags.to_lowercase();
        if flags.contains("wpa2") || flags.contains("rsn") {
            Security::Wpa2
        } else if flags.contains("wpa") {
            Security::Wpa
        } else if flags.contains("wep") {
            Security::Wep
        } else {
            Security::Open
        }
    }

    /// Signal quality in percent, `100 + dBm` clamped to 0..=100
    pub fn signal_percent(&self) -> u8 {
        (100 + self.signal_level).clamp(0, 100) as u8
    }
}

/// Supplicant link state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Disconnected,
    Inactive,
    Scanning,
    Associating,
    Associated,
    FourWayHandshake,
    GroupHandshake,
    Completed,
    Unknown,
}

impl From<&str> for LinkState {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "DISCONNECTED" => LinkState::Disconnected,
            "INACTIVE" => LinkState::Inactive,
            "SCANNING" => LinkState::Scanning,
            "ASSOCIATING" => LinkState::Associating,
            "ASSOCIATED" => LinkState::Associated,
            "4WAY_HANDSHAKE" => LinkState::FourWayHandshake,
            "GROUP_HANDSHAKE" => LinkState::GroupHandshake,
            "COMPLETED" => LinkState::Completed,
            _ => LinkState::Unknown,
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Inactive => "inactive",
            LinkState::Scanning => "scanning",
            LinkState::Associating => "associating",
            LinkState::Associated => "associated",
            LinkState::FourWayHandshake => "4way_handshake",
            LinkState::GroupHandshake => "group_handshake",
            LinkState::Completed => "completed",
            LinkState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Snapshot of an interface's link, recomputed on every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub interface: String,
    /// Empty when not associated
    pub ssid: String,
    pub state: LinkState,
    pub bssid: Option<String>,
    pub frequency: Option<u32>,
    pub ip_address: Option<String>,
    pub key_mgmt: Option<String>,
}

impl ConnectionStatus {
    /// Status of an interface with no association
    pub fn disconnected(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ssid: String::new(),
            state: LinkState::Disconnected,
            bssid: None,
            frequency: None,
            ip_address: None,
            key_mgmt: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Completed && !self.ssid.is_empty()
    }
}

/// A request to join a network; lives for one connect call
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub ssid: String,
    pub password: Option<String>,
}

impl ConnectRequest {
    pub fn new(ssid: impl Into<String>, password: Option<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password,
        }
    }

    /// Secured path only for a non-empty password
    pub fn is_secured(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

// Keep passwords out of logs
impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("ssid", &self.ssid)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
