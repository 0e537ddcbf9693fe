//! Wire types for the wifictl D-Bus interface
//!
//! D-Bus has no optional values, so absent fields travel as empty strings
//! or zero.

use crate::model::{ConnectionStatus, LinkState, Network};
use serde::{Deserialize, Serialize};
use zbus::zvariant::Type;

/// Well-known bus name of the daemon
pub const WIFICTL_DBUS_SERVICE: &str = "org.wifictl.Control";

/// Object path of the control object
pub const WIFICTL_DBUS_PATH: &str = "/org/wifictl/Control";

/// Interface name of the control object
pub const WIFICTL_DBUS_INTERFACE: &str = "org.wifictl.Control";

/// Prefix of the named errors the daemon returns
pub const WIFICTL_ERROR_PREFIX: &str = "org.wifictl.Error";

/// One scanned network, signature `(ssuis)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct NetworkRecord {
    pub ssid: String,
    pub bssid: String,
    pub frequency: u32,
    pub signal_level: i32,
    pub flags: String,
}

/// Link status snapshot, signature `(ssssssu)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct StatusRecord {
    pub interface: String,
    pub ssid: String,
    pub state: String,
    pub bssid: String,
    pub ip_address: String,
    pub key_mgmt: String,
    /// MHz, 0 when unknown
    pub frequency: u32,
}

impl From<Network> for NetworkRecord {
    fn from(network: Network) -> Self {
        Self {
            ssid: network.ssid,
            bssid: network.bssid,
            frequency: network.frequency,
            signal_level: network.signal_level,
            flags: network.flags,
        }
    }
}

impl From<NetworkRecord> for Network {
    fn from(record: NetworkRecord) -> Self {
        Self {
            ssid: record.ssid,
            bssid: record.bssid,
            frequency: record.frequency,
            signal_level: record.signal_level,
            flags: record.flags,
        }
    }
}

impl From<ConnectionStatus> for StatusRecord {
    fn from(status: ConnectionStatus) -> Self {
        Self {
            interface: status.interface,
            ssid: status.ssid,
            state: status.state.to_string(),
            bssid: status.bssid.unwrap_or_default(),
            ip_address: status.ip_address.unwrap_or_default(),
            key_mgmt: status.key_mgmt.unwrap_or_default(),
            frequency: status.frequency.unwrap_or(0),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl From<StatusRecord> for ConnectionStatus {
    fn from(record: StatusRecord) -> Self {
        Self {
            interface: record.interface,
            ssid: record.ssid,
            state: LinkState::from(record.state.as_str()),
            bssid: non_empty(record.bssid),
            frequency: (record.frequency != 0).then_some(record.frequency),
            ip_address: non_empty(record.ip_address),
            key_mgmt: non_empty(record.key_mgmt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures() {
        assert_eq!(NetworkRecord::SIGNATURE.to_string(), "(ssuis)");
        assert_eq!(StatusRecord::SIGNATURE.to_string(), "(ssssssu)");
    }

    #[test]
    fn test_status_record_restores_absent_fields() {
        let status = ConnectionStatus::disconnected("wlan0");
        let record = StatusRecord::from(status.clone());
        assert_eq!(record.state, "disconnected");
        assert_eq!(record.bssid, "");
        assert_eq!(record.frequency, 0);

        assert_eq!(ConnectionStatus::from(record), status);
    }

    #[test]
    fn test_status_record_connected() {
        let record = StatusRecord {
            interface: "wlan0".to_string(),
            ssid: "Home".to_string(),
            state: "4way_handshake".to_string(),
            bssid: "66:77:88:99:aa:bb".to_string(),
            ip_address: String::new(),
            key_mgmt: "WPA2-PSK".to_string(),
            frequency: 5180,
        };
        let status = ConnectionStatus::from(record);
        assert_eq!(status.state, LinkState::FourWayHandshake);
        assert_eq!(status.frequency, Some(5180));
        assert_eq!(status.ip_address, None);
    }
}
