//! wifictl - command line client for wifictld
//!
//! ```bash
//! wifictl interfaces
//! wifictl use wlan1
//! wifictl networks
//! wifictl connect Home --password hunter22
//! wifictl status --json
//! wifictl watch --interval 5
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libwifictl::config::{BusKind, WifiCtlConfig, DEFAULT_CONFIG_PATH};
use libwifictl::dbus_client::WifiCtlClient;
use libwifictl::model::{ConnectionStatus, Network};
use libwifictl::poll::{PollSnapshot, Poller};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "wifictl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "WiFi Control CLI - scan and join wireless networks through wifictld", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print results as JSON
    #[arg(short, long, global = true)]
    json: bool,

    /// Talk to a daemon on the session bus
    #[arg(long, global = true)]
    session: bool,

    /// Configuration file (bus and poll interval defaults)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List wireless interfaces
    Interfaces,
    /// Select the interface later commands operate on
    Use {
        name: String,
    },
    /// Show link status
    Status {
        /// Interface to query instead of the current one
        #[arg(short, long)]
        interface: Option<String>,
    },
    /// Scan for networks
    Networks,
    /// Join a network
    Connect {
        ssid: String,
        /// Omit for an open network
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Drop the current association
    Disconnect,
    /// Poll networks and status until interrupted
    Watch {
        /// Seconds between polls, overriding `[poll] interval_secs`
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = WifiCtlConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let bus = if cli.session { BusKind::Session } else { config.daemon.bus };
    let client = WifiCtlClient::connect_to(bus)
        .await
        .context("Cannot reach wifictld")?;

    match &cli.command {
        Commands::Interfaces => {
            let interfaces = client.get_available_interfaces().await?;
            let current = client.get_current_interface().await?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "interfaces": interfaces, "current": current })
                );
            } else {
                for name in interfaces {
                    let marker = if current.as_deref() == Some(name.as_str()) { "*" } else { " " };
                    println!("{} {}", marker, name);
                }
            }
        }
        Commands::Use { name } => {
            client
                .use_interface(name)
                .await
                .with_context(|| format!("Failed to use {}", name))?;
            if !cli.json {
                println!("Using {}", name);
            }
        }
        Commands::Status { interface } => {
            let status = client.get_status(interface.as_deref()).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
        Commands::Networks => {
            let networks = client.get_available_networks().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&networks)?);
            } else {
                print_networks(&networks);
            }
        }
        Commands::Connect { ssid, password } => {
            client
                .connect_network(ssid, password.as_deref())
                .await
                .with_context(|| format!("Failed to connect to '{}'", ssid))?;
            if !cli.json {
                println!("Connected to '{}'", ssid);
            }
        }
        Commands::Disconnect => {
            client.disconnect().await?;
            if !cli.json {
                println!("Disconnected");
            }
        }
        Commands::Watch { interval } => {
            watch_networks(client, config.poll.interval_or(*interval), cli.json).await?;
        }
    }

    Ok(())
}

fn print_status(status: &ConnectionStatus) {
    println!("Interface:  {}", status.interface);
    println!("State:      {}", status.state);
    if status.is_connected() {
        println!("SSID:       {}", status.ssid);
    }
    if let Some(bssid) = &status.bssid {
        println!("BSSID:      {}", bssid);
    }
    if let Some(freq) = status.frequency {
        println!("Frequency:  {} MHz", freq);
    }
    if let Some(ip) = &status.ip_address {
        println!("IP address: {}", ip);
    }
    if let Some(key_mgmt) = &status.key_mgmt {
        println!("Key mgmt:   {}", key_mgmt);
    }
}

fn print_networks(networks: &[Network]) {
    println!("{:<32} {:<17} {:>6} {:>7} {}", "SSID", "BSSID", "FREQ", "SIGNAL", "SECURITY");
    for network in networks {
        let ssid = if network.ssid.is_empty() { "<hidden>" } else { &network.ssid };
        println!(
            "{:<32} {:<17} {:>6} {:>6}% {}",
            ssid,
            network.bssid,
            network.frequency,
            network.signal_percent(),
            network.security()
        );
    }
}

fn print_snapshot(snapshot: &PollSnapshot) {
    println!("--- {} ---", snapshot.taken_at.format("%H:%M:%S"));
    if snapshot.current_ssid.is_empty() {
        println!("Not connected");
    } else {
        println!("Connected to '{}'", snapshot.current_ssid);
    }
    print_networks(&snapshot.networks);
    for error in &snapshot.errors {
        eprintln!("warning: {}", error);
    }
}

async fn watch_networks(client: WifiCtlClient, interval: Duration, json: bool) -> Result<()> {
    let poller = Poller::new(Arc::new(client), interval);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    poller
        .run(shutdown_rx, |snapshot| {
            if json {
                match serde_json::to_string(&snapshot) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("warning: {}", e),
                }
            } else {
                print_snapshot(&snapshot);
            }
        })
        .await;

    Ok(())
}
