//! Input validation and sanitization
//!
//! Everything a caller hands us is checked here before it can reach
//! `wpa_cli` as an argument.

use crate::error::{WifiError, WifiResult};

/// Maximum length for interface names (Linux kernel limit is 15)
const MAX_INTERFACE_NAME_LEN: usize = 15;

/// Maximum SSID length in bytes (802.11)
const MAX_SSID_LEN: usize = 32;

/// Maximum length for error messages shown to callers
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Validate interface name to prevent command injection
///
/// Interface names must be alphanumeric with optional dashes and underscores,
/// and no longer than 15 characters (Linux kernel limit)
pub fn validate_interface_name(name: &str) -> WifiResult<()> {
    if name.is_empty() {
        return Err(WifiError::validation("Interface name cannot be empty"));
    }

    if name.len() > MAX_INTERFACE_NAME_LEN {
        return Err(WifiError::Validation(format!(
            "Interface name too long (max {} characters)",
            MAX_INTERFACE_NAME_LEN
        )));
    }

    for c in name.chars() {
        if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
            return Err(WifiError::Validation(format!(
                "Invalid interface name '{}': contains invalid character '{}'",
                name.escape_debug(),
                c.escape_debug()
            )));
        }
    }

    // Could be read as an option by pkill/wpa_cli
    if name.starts_with('-') {
        return Err(WifiError::validation("Interface name cannot start with dash"));
    }

    Ok(())
}

/// Validate WiFi SSID
///
/// Hidden networks scan with an empty SSID, but joining one needs a name.
/// Any other byte is allowed; the driver hands the SSID over hex-encoded.
pub fn validate_ssid(ssid: &str) -> WifiResult<()> {
    if ssid.is_empty() {
        return Err(WifiError::validation("Must provide a ssid"));
    }

    if ssid.len() > MAX_SSID_LEN {
        return Err(WifiError::Validation(format!(
            "SSID cannot exceed {} bytes",
            MAX_SSID_LEN
        )));
    }

    Ok(())
}

/// Validate a network password before it is passed through to the supplicant
///
/// No policy on strength, length or key type: the driver decides what it
/// accepts. Only control characters are refused, since the supplicant's
/// control protocol is line based.
pub fn validate_password(password: &str) -> WifiResult<()> {
    if password.chars().any(|c| c.is_control()) {
        return Err(WifiError::validation("Password contains invalid control characters"));
    }

    Ok(())
}

/// Sanitize driver messages before they are handed to remote callers
pub fn sanitize_error_message(stderr: &str) -> String {
    let mut sanitized: String = stderr
        .trim()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    if sanitized.len() > MAX_ERROR_MESSAGE_LEN {
        let mut cut = MAX_ERROR_MESSAGE_LEN;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("... (truncated)");
    }

    sanitized
}
