//! WiFi Control Daemon (wifictld)
//!
//! Serves the `org.wifictl.Control` D-Bus interface: interface selection,
//! scans, link status, connect and disconnect, all serialized per wireless
//! interface.
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (requires root/sudo)
//! sudo wifictld
//!
//! # Start with verbose logging
//! sudo wifictld --verbose
//!
//! # Development run on the session bus without touching the supplicant
//! wifictld --session --no-bootstrap
//! ```

use clap::Parser;
use libwifictl::bootstrap;
use libwifictl::config::{BusKind, WifiCtlConfig, DEFAULT_CONFIG_PATH};
use libwifictl::dbus::ControlServer;
use libwifictl::driver::WpaCliDriver;
use libwifictl::error::{WifiError, WifiResult};
use libwifictl::service::WifiService;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// WiFi Control Daemon
#[derive(Parser, Debug)]
#[command(name = "wifictld")]
#[command(author = "wifictl contributors")]
#[command(version)]
#[command(about = "WiFi Control Daemon - provides D-Bus interface for wireless interfaces", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Skip interface discovery and supplicant reset on startup
    #[arg(long)]
    no_bootstrap: bool,

    /// Serve on the session bus instead of the system bus
    #[arg(long)]
    session: bool,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> WifiResult<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", WifiCtlConfig::default().to_toml()?);
        return Ok(());
    }

    init_logging(&args);

    info!("Starting WiFi Control Daemon (wifictld)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    #[cfg(target_os = "linux")]
    {
        let uid = unsafe { libc::getuid() };
        if uid != 0 {
            warn!("Not running as root - supplicant control will likely fail");
        }
    }

    let config = WifiCtlConfig::load_or_default(&args.config)?;
    let bus = if args.session { BusKind::Session } else { config.daemon.bus };

    let driver = Arc::new(WpaCliDriver::new(config.driver.clone()));
    let service = Arc::new(WifiService::new(driver, config.service.clone()));

    if args.no_bootstrap || config.daemon.skip_bootstrap {
        info!("Bootstrap disabled; interfaces will be discovered on first request");
        if let Err(e) = service.refresh_interfaces().await {
            warn!("Interface discovery failed: {}", e);
        }
    } else {
        let report = bootstrap::run(&service).await;
        for failure in &report.failures {
            warn!("Bootstrap: {}", failure);
        }
        match &report.selected {
            Some(name) => info!("Using interface {}", name),
            None => warn!("No wireless interface selected"),
        }
    }

    let server = match ControlServer::start(service.clone(), bus).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start D-Bus service: {}", e);
            error!("  Another instance may already be running, or the bus policy denies the name");
            return Err(e);
        }
    };

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = handle_signals(shutdown_tx).await {
            error!("Signal handler error: {}", e);
        }
    });

    info!("WiFi Control Daemon is ready");

    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }

    info!("Shutting down WiFi Control Daemon...");
    if let Err(e) = server.stop().await {
        error!("Error during shutdown: {}", e);
    }

    info!("WiFi Control Daemon stopped");
    Ok(())
}

/// Initialize logging based on command-line arguments
fn init_logging(args: &Args) {
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new(format!("wifictld={},libwifictl={}", log_level, log_level))
        });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .init();
}

/// Wait for SIGTERM or SIGINT and flag shutdown
async fn handle_signals(shutdown: watch::Sender<bool>) -> WifiResult<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| WifiError::Service(format!("Failed to register SIGTERM handler: {}", e)))?;
        let mut sigint = signal(SignalKind::interrupt())
            .map_err(|e| WifiError::Service(format!("Failed to register SIGINT handler: {}", e)))?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
            .map_err(|e| WifiError::Service(format!("Failed to listen for Ctrl+C: {}", e)))?;
        info!("Received Ctrl+C, initiating graceful shutdown");
    }

    let _ = shutdown.send(true);
    Ok(())
}
