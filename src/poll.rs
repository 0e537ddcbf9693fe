//! Periodic polling of networks and link status
//!
//! A display keeps itself fresh by asking for the network list and the
//! current status on a fixed interval. A failed query empties the matching
//! part of the snapshot rather than leaving stale data behind.

use crate::dbus_client::WifiCtlClient;
use crate::error::WifiResult;
use crate::model::{ConnectionStatus, Network};
use crate::service::WifiService;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Anything that can answer the two polled queries
#[async_trait]
pub trait PollSource: Send + Sync {
    async fn networks(&self) -> WifiResult<Vec<Network>>;
    async fn status(&self) -> WifiResult<ConnectionStatus>;
}

#[async_trait]
impl PollSource for WifiService {
    async fn networks(&self) -> WifiResult<Vec<Network>> {
        self.get_available_networks().await
    }

    async fn status(&self) -> WifiResult<ConnectionStatus> {
        self.get_status(None).await
    }
}

#[async_trait]
impl PollSource for WifiCtlClient {
    async fn networks(&self) -> WifiResult<Vec<Network>> {
        self.get_available_networks().await
    }

    async fn status(&self) -> WifiResult<ConnectionStatus> {
        self.get_status(None).await
    }
}

/// Result of one poll round
#[derive(Debug, Clone, Serialize)]
pub struct PollSnapshot {
    pub taken_at: DateTime<Utc>,
    pub networks: Vec<Network>,
    /// Empty when not associated or when the status query failed
    pub current_ssid: String,
    pub errors: Vec<String>,
}

impl PollSnapshot {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Poller<S: PollSource + ?Sized> {
    source: Arc<S>,
    interval: Duration,
}

impl<S: PollSource + ?Sized> Poller<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Query both endpoints once
    pub async fn poll_once(&self) -> PollSnapshot {
        let mut errors = Vec::new();

        let (networks, status) = tokio::join!(self.source.networks(), self.source.status());

        let networks = networks.unwrap_or_else(|e| {
            warn!("Network poll failed: {}", e);
            errors.push(format!("networks: {}", e));
            Vec::new()
        });

        let current_ssid = match status {
            Ok(status) => status.ssid,
            Err(e) => {
                warn!("Status poll failed: {}", e);
                errors.push(format!("status: {}", e));
                String::new()
            }
        };

        PollSnapshot {
            taken_at: Utc::now(),
            networks,
            current_ssid,
            errors,
        }
    }

    /// Poll until `shutdown` turns true, handing every snapshot to `on_snapshot`
    ///
    /// The first round runs immediately. Rounds that overrun the interval
    /// delay the next one instead of bursting.
    pub async fn run<F>(&self, mut shutdown: watch::Receiver<bool>, mut on_snapshot: F)
    where
        F: FnMut(PollSnapshot) + Send,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.poll_once().await;
                    debug!(
                        "Poll: {} networks, ssid '{}'",
                        snapshot.networks.len(),
                        snapshot.current_ssid
                    );
                    on_snapshot(snapshot);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("Poller stopped");
    }
}
