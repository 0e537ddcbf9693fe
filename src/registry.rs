//! Interface registry
//!
//! Holds the set of wireless interfaces discovered this session and the one
//! currently in use. `current` is only ever an element of `available`.

use crate::error::{WifiError, WifiResult};
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Default)]
struct RegistryState {
    /// Discovery order, no duplicates
    available: Vec<String>,
    current: Option<String>,
}

/// Single source of truth for which interface is in use
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    state: RwLock<RegistryState>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with known interfaces, none selected
    pub fn with_interfaces<I, S>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut available: Vec<String> = Vec::new();
        for name in interfaces {
            let name = name.into();
            if !available.contains(&name) {
                available.push(name);
            }
        }

        Self {
            state: RwLock::new(RegistryState {
                available,
                current: None,
            }),
        }
    }

    /// Interfaces available for selection, in discovery order
    pub async fn list(&self) -> Vec<String> {
        self.state.read().await.available.clone()
    }

    /// The interface operations target by default
    pub async fn current(&self) -> Option<String> {
        self.state.read().await.current.clone()
    }

    pub async fn contains(&self, interface: &str) -> bool {
        self.state
            .read()
            .await
            .available
            .iter()
            .any(|name| name == interface)
    }

    /// Make `interface` current; it must already be available
    pub async fn select(&self, interface: &str) -> WifiResult<()> {
        let mut state = self.state.write().await;

        if !state.available.iter().any(|name| name == interface) {
            return Err(WifiError::NotFound(interface.to_string()));
        }

        if state.current.as_deref() != Some(interface) {
            info!("Current interface: {}", interface);
        }
        state.current = Some(interface.to_string());
        Ok(())
    }

    /// Replace the available set after a fresh enumeration
    ///
    /// `current` survives if still present; otherwise it falls back to the
    /// first discovered interface, or none. Returns the resulting current.
    pub async fn replace_available(&self, interfaces: Vec<String>) -> Option<String> {
        let mut state = self.state.write().await;

        let mut available: Vec<String> = Vec::with_capacity(interfaces.len());
        for name in interfaces {
            if !available.contains(&name) {
                available.push(name);
            }
        }

        let keep = state
            .current
            .as_ref()
            .filter(|current| available.contains(current))
            .cloned();
        let current = keep.or_else(|| available.first().cloned());

        if current != state.current {
            match &current {
                Some(name) => info!("Current interface: {}", name),
                None => info!("No wireless interface available"),
            }
        }

        state.available = available;
        state.current = current.clone();
        current
    }
}
