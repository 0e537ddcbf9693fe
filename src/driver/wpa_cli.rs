//! wpa_supplicant backend
//!
//! Drives `wpa_supplicant` through `wpa_cli` for runtime control, and can
//! stop and start the supplicant itself. Interfaces are discovered from
//! sysfs.

use super::WifiDriver;
use crate::config::DriverSettings;
use crate::error::{DriverError, DriverResult};
use crate::model::{ConnectionStatus, LinkState, Network};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Where the kernel lists network interfaces
const SYSFS_NET: &str = "/sys/class/net";

/// Checks for the control socket after starting the supplicant
const START_ATTEMPTS: u32 = 10;

/// wpa_supplicant driven through wpa_cli
pub struct WpaCliDriver {
    settings: DriverSettings,
    sysfs_net: PathBuf,
}

impl WpaCliDriver {
    /// Create a new driver from configuration
    pub fn new(settings: DriverSettings) -> Self {
        Self {
            settings,
            sysfs_net: PathBuf::from(SYSFS_NET),
        }
    }

    /// Read interfaces from another sysfs tree
    pub fn with_sysfs_root(mut self, sysfs_net: impl Into<PathBuf>) -> Self {
        self.sysfs_net = sysfs_net.into();
        self
    }

    /// Check if wpa_supplicant is running on an interface
    pub async fn is_running(&self, interface: &str) -> bool {
        let socket_path = self.settings.ctrl_interface.join(interface);
        if fs::metadata(&socket_path).await.is_ok() {
            // Verify it's responsive
            self.wpa_cli(interface, &["ping"]).await.is_ok()
        } else {
            Command::new("pgrep")
                .arg("-f")
                .arg(supplicant_pattern(interface))
                .output()
                .await
                .map(|output| output.status.success())
                .unwrap_or(false)
        }
    }

    async fn is_wireless(&self, interface: &str) -> bool {
        let dev = self.sysfs_net.join(interface);
        fs::metadata(dev.join("wireless")).await.is_ok()
            || fs::metadata(dev.join("phy80211")).await.is_ok()
    }

    async fn wait_for_association(&self, interface: &str, ssid: &str) -> DriverResult<()> {
        let timeout = Duration::from_secs(self.settings.association_timeout_secs);
        let start = Instant::now();

        while start.elapsed() < timeout {
            tokio::time::sleep(Duration::from_millis(500)).await;

            match self.status(interface).await {
                Ok(status) => {
                    debug!("Connection state: {:?}", status.state);
                    match status.state {
                        LinkState::Completed => {
                            info!("Successfully connected to '{}'", ssid);
                            return Ok(());
                        }
                        // Dropping back after a grace period is usually an auth failure
                        LinkState::Disconnected | LinkState::Inactive
                            if start.elapsed() > Duration::from_secs(5) =>
                        {
                            break;
                        }
                        _ => {}
                    }
                }
                Err(e) => {
                    warn!("Failed to get status: {}", e);
                }
            }
        }

        Err(DriverError::AssociationFailed(format!(
            "could not join '{}'. Check password and signal.",
            ssid
        )))
    }

    /// Add, configure and select a network block, waiting for association
    async fn join(&self, interface: &str, ssid: &str, psk: Option<&str>) -> DriverResult<()> {
        let output = self.wpa_cli(interface, &["add_network"]).await?;
        let network_id = output.trim().to_string();
        if network_id.parse::<u32>().is_err() {
            return Err(DriverError::Parse(format!(
                "unexpected add_network reply: {}",
                network_id
            )));
        }

        debug!("Added network with id: {}", network_id);

        // Removed again on any failure, including the caller dropping us
        let pending = PendingNetwork::new(&self.settings, interface, &network_id);

        self.configure_network(interface, &network_id, ssid, psk).await?;
        self.wait_for_association(interface, ssid).await?;

        pending.keep();
        Ok(())
    }

    async fn configure_network(
        &self,
        interface: &str,
        network_id: &str,
        ssid: &str,
        psk: Option<&str>,
    ) -> DriverResult<()> {
        self.wpa_cli(
            interface,
            &["set_network", network_id, "ssid", &hex_ssid(ssid)],
        )
        .await?;

        match psk {
            Some(password) => {
                self.wpa_cli(
                    interface,
                    &["set_network", network_id, "psk", &format!("\"{}\"", password)],
                )
                .await?;
            }
            None => {
                self.wpa_cli(interface, &["set_network", network_id, "key_mgmt", "NONE"])
                    .await?;
            }
        }

        self.wpa_cli(interface, &["enable_network", network_id]).await?;

        // Deselects every other network block
        self.wpa_cli(interface, &["select_network", network_id]).await?;

        Ok(())
    }

    // === Helper functions ===

    /// Run wpa_cli command
    async fn wpa_cli(&self, interface: &str, args: &[&str]) -> DriverResult<String> {
        let mut cmd = Command::new(&self.settings.wpa_cli_bin);
        cmd.arg("-p").arg(&self.settings.ctrl_interface);
        cmd.arg("-i").arg(interface);
        cmd.args(args);
        cmd.kill_on_drop(true);

        // Never echo a passphrase into the logs
        let shown: Vec<&str> = match args {
            ["set_network", id, "psk", _] => vec!["set_network", *id, "psk", "<redacted>"],
            _ => args.to_vec(),
        };
        let cmd_str = format!("wpa_cli -i {} {}", interface, shown.join(" "));
        debug!("Running: {}", cmd_str);

        let output = cmd.output().await.map_err(|e| DriverError::CommandFailed {
            cmd: cmd_str.clone(),
            code: None,
            stderr: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if !output.status.success() {
            return Err(DriverError::CommandFailed {
                cmd: cmd_str,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        // wpa_cli returns "FAIL" on errors even with exit code 0
        if stdout.trim() == "FAIL" {
            return Err(DriverError::CommandFailed {
                cmd: cmd_str,
                code: None,
                stderr: "wpa_cli returned FAIL".to_string(),
            });
        }

        Ok(stdout)
    }

    /// Generate base wpa_supplicant configuration
    fn generate_base_config(&self) -> String {
        format!(
            "ctrl_interface={}\n\
             update_config=1\n",
            self.settings.ctrl_interface.display()
        )
    }

    fn config_path(&self, interface: &str) -> PathBuf {
        self.settings.config_dir.join(format!("{}.conf", interface))
    }
}

#[async_trait]
impl WifiDriver for WpaCliDriver {
    async fn list_interfaces(&self) -> DriverResult<Vec<String>> {
        if fs::metadata(&self.sysfs_net).await.is_err() {
            warn!("{} not available, no interfaces", self.sysfs_net.display());
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.sysfs_net).await?;
        let mut interfaces = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if self.is_wireless(name).await {
                    interfaces.push(name.to_string());
                }
            }
        }

        interfaces.sort();
        debug!("Wireless interfaces: {:?}", interfaces);
        Ok(interfaces)
    }

    async fn set_current_interface(&self, interface: &str) -> DriverResult<()> {
        if !self.is_wireless(interface).await {
            return Err(DriverError::NotWireless(interface.to_string()));
        }
        debug!("Driving {}", interface);
        Ok(())
    }

    async fn kill_supplicant(&self, interface: &str) -> DriverResult<()> {
        if !self.is_running(interface).await {
            debug!("wpa_supplicant not running on {}", interface);
            return Ok(());
        }

        info!("Stopping wpa_supplicant on {}", interface);

        // Try graceful termination via wpa_cli first
        if let Err(e) = self.wpa_cli(interface, &["terminate"]).await {
            debug!("wpa_cli terminate on {} failed: {}", interface, e);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        if self.is_running(interface).await {
            warn!("wpa_supplicant didn't terminate gracefully, forcing kill");
            let output = Command::new("pkill")
                .arg("-f")
                .arg(supplicant_pattern(interface))
                .output()
                .await?;

            // 1 means nothing matched, which is what we want
            if !matches!(output.status.code(), Some(0) | Some(1)) {
                return Err(DriverError::CommandFailed {
                    cmd: format!("pkill -f {}", supplicant_pattern(interface)),
                    code: output.status.code(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                });
            }
        }

        Ok(())
    }

    async fn detect_supplicant(&self) -> DriverResult<PathBuf> {
        for bin in [&self.settings.wpa_supplicant_bin, &self.settings.wpa_cli_bin] {
            if fs::metadata(bin).await.is_err() {
                return Err(DriverError::NotInstalled(bin.display().to_string()));
            }
        }
        Ok(self.settings.wpa_supplicant_bin.clone())
    }

    async fn start_supplicant(&self, interface: &str) -> DriverResult<()> {
        if fs::metadata(&self.settings.wpa_supplicant_bin).await.is_err() {
            return Err(DriverError::NotInstalled("wpa_supplicant".to_string()));
        }

        if self.is_running(interface).await {
            debug!("wpa_supplicant already running on {}", interface);
            return Ok(());
        }

        info!("Starting wpa_supplicant on {}", interface);

        fs::create_dir_all(&self.settings.config_dir).await?;

        let config_path = self.config_path(interface);
        if fs::metadata(&config_path).await.is_err() {
            fs::write(&config_path, self.generate_base_config()).await?;
        }

        fs::create_dir_all(&self.settings.ctrl_interface).await?;

        let cmd_str = format!("wpa_supplicant -i {}", interface);
        let output = Command::new(&self.settings.wpa_supplicant_bin)
            .arg("-B") // Background/daemon mode
            .arg("-D")
            .arg(&self.settings.kernel_driver)
            .arg("-i")
            .arg(interface)
            .arg("-c")
            .arg(&config_path)
            .output()
            .await
            .map_err(|e| DriverError::CommandFailed {
                cmd: cmd_str.clone(),
                code: None,
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(DriverError::CommandFailed {
                cmd: cmd_str,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        for _ in 0..START_ATTEMPTS {
            tokio::time::sleep(Duration::from_millis(200)).await;
            if self.is_running(interface).await {
                info!("wpa_supplicant started on {}", interface);
                return Ok(());
            }
        }

        Err(DriverError::CommandFailed {
            cmd: cmd_str,
            code: None,
            stderr: format!("control socket not ready on {}", interface),
        })
    }

    async fn scan(&self, interface: &str) -> DriverResult<Vec<Network>> {
        self.wpa_cli(interface, &["scan"]).await?;

        tokio::time::sleep(Duration::from_millis(self.settings.scan_settle_ms)).await;

        let output = self.wpa_cli(interface, &["scan_results"]).await?;
        let networks = parse_scan_results(&output);
        debug!("Scan on {} found {} networks", interface, networks.len());
        Ok(networks)
    }

    async fn status(&self, interface: &str) -> DriverResult<ConnectionStatus> {
        let output = self.wpa_cli(interface, &["status"]).await?;
        Ok(parse_status(interface, &output))
    }

    async fn connect_open(&self, interface: &str, ssid: &str) -> DriverResult<()> {
        info!("Connecting to open network '{}' on {}", ssid, interface);
        self.join(interface, ssid, None).await
    }

    async fn connect_secured(
        &self,
        interface: &str,
        ssid: &str,
        password: &str,
    ) -> DriverResult<()> {
        info!("Connecting to secured network '{}' on {}", ssid, interface);
        self.join(interface, ssid, Some(password)).await
    }

    async fn disconnect(&self, interface: &str) -> DriverResult<()> {
        if !self.is_running(interface).await {
            debug!("wpa_supplicant not running on {}", interface);
            return Ok(());
        }

        info!("Disconnecting WiFi on {}", interface);
        self.wpa_cli(interface, &["disconnect"]).await?;
        Ok(())
    }
}

fn supplicant_pattern(interface: &str) -> String {
    format!("wpa_supplicant.*-i\\s*{}( |$)", interface)
}

/// SSID as the unquoted hex form `set_network` accepts for arbitrary bytes
fn hex_ssid(ssid: &str) -> String {
    ssid.bytes().map(|b| format!("{:02x}", b)).collect()
}

/// A network block added to the supplicant but not yet associated
///
/// Dropping it without [`PendingNetwork::keep`] schedules `remove_network`,
/// so a join abandoned mid-way leaves nothing behind.
struct PendingNetwork {
    wpa_cli_bin: PathBuf,
    ctrl_interface: PathBuf,
    interface: String,
    network_id: String,
    armed: bool,
}

impl PendingNetwork {
    fn new(settings: &DriverSettings, interface: &str, network_id: &str) -> Self {
        Self {
            wpa_cli_bin: settings.wpa_cli_bin.clone(),
            ctrl_interface: settings.ctrl_interface.clone(),
            interface: interface.to_string(),
            network_id: network_id.to_string(),
            armed: true,
        }
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingNetwork {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                "No runtime to remove network {} on {}",
                self.network_id, self.interface
            );
            return;
        };

        debug!("Removing network {} on {}", self.network_id, self.interface);

        let mut cmd = Command::new(&self.wpa_cli_bin);
        cmd.arg("-p")
            .arg(&self.ctrl_interface)
            .arg("-i")
            .arg(&self.interface)
            .arg("remove_network")
            .arg(&self.network_id);

        let interface = self.interface.clone();
        let network_id = self.network_id.clone();
        runtime.spawn(async move {
            match cmd.output().await {
                Ok(output) if output.status.success() => {}
                Ok(output) => warn!(
                    "remove_network {} on {} failed: {}",
                    network_id,
                    interface,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                Err(e) => warn!("remove_network {} on {} failed: {}", network_id, interface, e),
            }
        });
    }
}

/// Parse `wpa_cli scan_results` output
///
/// Format: header line, then `bssid\tfrequency\tsignal\tflags\tssid`.
/// Results are sorted strongest first; equal signals keep driver order.
pub fn parse_scan_results(output: &str) -> Vec<Network> {
    let mut networks: Vec<Network> = output
        .lines()
        .filter(|line| !line.starts_with("bssid"))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 4 {
                return None;
            }
            Some(Network {
                bssid: parts[0].to_string(),
                frequency: parts[1].parse().unwrap_or(0),
                signal_level: parts[2].parse().unwrap_or(-100),
                flags: parts[3].to_string(),
                // Hidden networks have no ssid column; SSIDs may contain tabs
                ssid: parts.get(4..).map(|s| s.join("\t")).unwrap_or_default(),
            })
        })
        .collect();

    networks.sort_by(|a, b| b.signal_level.cmp(&a.signal_level));
    networks
}

/// Parse `wpa_cli status` key=value output
pub fn parse_status(interface: &str, output: &str) -> ConnectionStatus {
    let mut status = ConnectionStatus::disconnected(interface);
    status.state = LinkState::Unknown;

    for line in output.lines() {
        if let Some((key, value)) = line.split_once('=') {
            match key {
                "wpa_state" => status.state = LinkState::from(value),
                "ssid" => status.ssid = value.to_string(),
                "bssid" => status.bssid = Some(value.to_string()),
                "freq" => status.frequency = value.parse().ok(),
                "ip_address" => status.ip_address = Some(value.to_string()),
                "key_mgmt" => status.key_mgmt = Some(value.to_string()),
                _ => {}
            }
        }
    }

    status
}
