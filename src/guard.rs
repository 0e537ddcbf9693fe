//! Per-interface serialization of mutating operations
//!
//! The supplicant gives no ordering guarantee of its own, so connect,
//! disconnect, interface selection and supplicant resets against one
//! interface never overlap. The permit is released when the holding future
//! finishes or is dropped, which includes being cancelled by a timeout.

use crate::config::BusyPolicy;
use crate::error::{WifiError, WifiResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Held for the duration of one mutating operation
pub type InterfacePermit = OwnedMutexGuard<()>;

/// One async lock per interface, created on first use
pub struct InterfaceGuards {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    policy: BusyPolicy,
    wait: Duration,
}

impl InterfaceGuards {
    pub fn new(policy: BusyPolicy, wait: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            policy,
            wait,
        }
    }

    fn lock_for(&self, interface: &str) -> Arc<AsyncMutex<()>> {
        // Only touched for the map lookup, never across an await
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(interface.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquire the interface according to the configured policy
    pub async fn acquire(&self, interface: &str) -> WifiResult<InterfacePermit> {
        let lock = self.lock_for(interface);

        match self.policy {
            BusyPolicy::Reject => lock
                .try_lock_owned()
                .map_err(|_| WifiError::Busy(interface.to_string())),
            BusyPolicy::Queue => {
                if let Ok(permit) = lock.clone().try_lock_owned() {
                    return Ok(permit);
                }
                debug!("{} busy, queueing for up to {:?}", interface, self.wait);
                tokio::time::timeout(self.wait, lock.lock_owned())
                    .await
                    .map_err(|_| WifiError::Busy(interface.to_string()))
            }
        }
    }

    /// Whether a mutating operation currently holds the interface
    pub fn is_held(&self, interface: &str) -> bool {
        self.lock_for(interface).try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reject_policy_fails_fast() {
        let guards = InterfaceGuards::new(BusyPolicy::Reject, Duration::from_secs(10));
        let permit = guards.acquire("wlan0").await.unwrap();

        assert_eq!(
            guards.acquire("wlan0").await.unwrap_err(),
            WifiError::Busy("wlan0".to_string())
        );
        // Other interfaces are independent
        assert!(guards.acquire("wlan1").await.is_ok());

        drop(permit);
        assert!(guards.acquire("wlan0").await.is_ok());
    }

    #[tokio::test]
    async fn test_queue_policy_waits_for_release() {
        let guards = Arc::new(InterfaceGuards::new(BusyPolicy::Queue, Duration::from_secs(5)));
        let permit = guards.acquire("wlan0").await.unwrap();
        assert!(guards.is_held("wlan0"));

        let waiter = {
            let guards = guards.clone();
            tokio::spawn(async move { guards.acquire("wlan0").await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(permit);
        assert!(waiter.await.unwrap().is_ok());
        assert!(!guards.is_held("wlan0"));
    }

    #[tokio::test]
    async fn test_queue_policy_gives_up_after_wait() {
        let guards = InterfaceGuards::new(BusyPolicy::Queue, Duration::from_millis(20));
        let _permit = guards.acquire("wlan0").await.unwrap();

        assert!(matches!(
            guards.acquire("wlan0").await,
            Err(WifiError::Busy(_))
        ));
    }
}
