//! Integration tests for the wifi control service
//!
//! Drives [`WifiService`] against an in-process fake driver that simulates
//! slow, overlapping supplicant calls.

use async_trait::async_trait;
use libwifictl::bootstrap;
use libwifictl::config::{BusyPolicy, ServiceSettings};
use libwifictl::driver::WifiDriver;
use libwifictl::error::{DriverError, DriverResult, WifiError};
use libwifictl::model::{ConnectionStatus, LinkState, Network};
use libwifictl::poll::Poller;
use libwifictl::registry::InterfaceRegistry;
use libwifictl::service::WifiService;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fake supplicant with observable concurrency
#[derive(Default)]
struct FakeDriver {
    interfaces: Vec<String>,
    /// Delay applied to connect calls, in milliseconds
    connect_delay_ms: AtomicU64,
    /// Delay applied to scan calls, in milliseconds
    scan_delay_ms: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    associated: Mutex<Option<(String, String)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDriver {
    fn new(interfaces: &[&str]) -> Self {
        Self {
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn mutate<T>(&self, delay: Duration, f: impl FnOnce() -> T) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        let value = f();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        value
    }
}

#[async_trait]
impl WifiDriver for FakeDriver {
    async fn list_interfaces(&self) -> DriverResult<Vec<String>> {
        Ok(self.interfaces.clone())
    }

    async fn set_current_interface(&self, interface: &str) -> DriverResult<()> {
        self.record(format!("use {}", interface));
        if self.interfaces.iter().any(|name| name == interface) {
            Ok(())
        } else {
            Err(DriverError::NotWireless(interface.to_string()))
        }
    }

    async fn kill_supplicant(&self, interface: &str) -> DriverResult<()> {
        self.record(format!("kill {}", interface));
        Ok(())
    }

    async fn detect_supplicant(&self) -> DriverResult<PathBuf> {
        self.record("detect".to_string());
        Ok(PathBuf::from("/sbin/wpa_supplicant"))
    }

    async fn start_supplicant(&self, interface: &str) -> DriverResult<()> {
        self.record(format!("start {}", interface));
        Ok(())
    }

    async fn scan(&self, interface: &str) -> DriverResult<Vec<Network>> {
        self.record(format!("scan {}", interface));
        let delay = self.scan_delay_ms.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(vec![Network {
            ssid: "Home".to_string(),
            bssid: "00:11:22:33:44:55".to_string(),
            frequency: 2412,
            signal_level: -45,
            flags: "[WPA2-PSK-CCMP][ESS]".to_string(),
        }])
    }

    async fn status(&self, interface: &str) -> DriverResult<ConnectionStatus> {
        self.record(format!("status {}", interface));
        let mut status = ConnectionStatus::disconnected(interface);
        if let Some((iface, ssid)) = self.associated.lock().unwrap().clone() {
            if iface == interface {
                status.ssid = ssid;
                status.state = LinkState::Completed;
            }
        }
        Ok(status)
    }

    async fn connect_open(&self, interface: &str, ssid: &str) -> DriverResult<()> {
        self.record(format!("connect_open {} {}", interface, ssid));
        let delay = Duration::from_millis(self.connect_delay_ms.load(Ordering::SeqCst));
        self.mutate(delay, || {
            *self.associated.lock().unwrap() = Some((interface.to_string(), ssid.to_string()));
        })
        .await;
        Ok(())
    }

    async fn connect_secured(&self, interface: &str, ssid: &str, _password: &str) -> DriverResult<()> {
        self.record(format!("connect_secured {} {}", interface, ssid));
        let delay = Duration::from_millis(self.connect_delay_ms.load(Ordering::SeqCst));
        self.mutate(delay, || {
            *self.associated.lock().unwrap() = Some((interface.to_string(), ssid.to_string()));
        })
        .await;
        Ok(())
    }

    async fn disconnect(&self, interface: &str) -> DriverResult<()> {
        self.record(format!("disconnect {}", interface));
        self.mutate(Duration::ZERO, || {
            self.associated.lock().unwrap().take();
        })
        .await;
        Ok(())
    }
}

fn settings(policy: BusyPolicy) -> ServiceSettings {
    ServiceSettings {
        operation_timeout_secs: 2,
        connect_timeout_secs: 5,
        busy_policy: policy,
        lock_wait_ms: 10_000,
        ..ServiceSettings::default()
    }
}

async fn service_on_wlan0(driver: Arc<FakeDriver>, policy: BusyPolicy) -> Arc<WifiService> {
    let registry = InterfaceRegistry::with_interfaces(driver.interfaces.clone());
    let service = WifiService::with_registry(driver, settings(policy), registry);
    service.use_interface("wlan0").await.unwrap();
    Arc::new(service)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_connects_never_overlap() {
    let driver = Arc::new(FakeDriver::new(&["wlan0"]));
    driver.connect_delay_ms.store(100, Ordering::SeqCst);
    let service = service_on_wlan0(driver.clone(), BusyPolicy::Queue).await;

    let a = {
        let service = service.clone();
        tokio::spawn(async move { service.connect("NetA", Some("passwordA")).await })
    };
    let b = {
        let service = service.clone();
        tokio::spawn(async move { service.connect("NetB", None).await })
    };

    assert!(a.await.unwrap().is_ok());
    assert!(b.await.unwrap().is_ok());
    assert_eq!(driver.max_in_flight.load(Ordering::SeqCst), 1);

    let connects = driver
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("connect"))
        .count();
    assert_eq!(connects, 2);
}

#[tokio::test]
async fn test_reject_policy_reports_busy() {
    let driver = Arc::new(FakeDriver::new(&["wlan0"]));
    driver.connect_delay_ms.store(200, Ordering::SeqCst);
    let service = service_on_wlan0(driver.clone(), BusyPolicy::Reject).await;

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.connect("NetA", None).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(
        service.connect("NetB", None).await,
        Err(WifiError::Busy("wlan0".to_string()))
    );
    assert!(first.await.unwrap().is_ok());

    // Reads are not serialized behind the permit
    assert!(service.get_status(None).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_scan_timeout_does_not_wedge_the_service() {
    let driver = Arc::new(FakeDriver::new(&["wlan0"]));
    driver.scan_delay_ms.store(60_000, Ordering::SeqCst);
    let service = service_on_wlan0(driver.clone(), BusyPolicy::Queue).await;

    match service.get_available_networks().await {
        Err(WifiError::Timeout(msg)) => assert!(msg.starts_with("scan")),
        other => panic!("expected timeout, got {:?}", other),
    }

    driver.scan_delay_ms.store(10, Ordering::SeqCst);
    let networks = service.get_available_networks().await.unwrap();
    assert_eq!(networks.len(), 1);

    // Mutating calls are still admitted afterwards
    service.connect("Home", Some("hunter22")).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_releases_the_interface() {
    let driver = Arc::new(FakeDriver::new(&["wlan0"]));
    driver.connect_delay_ms.store(600_000, Ordering::SeqCst);
    // Reject fails at once if the timed out call still held the permit
    let service = service_on_wlan0(driver.clone(), BusyPolicy::Reject).await;

    match service.connect("Slow", None).await {
        Err(WifiError::Timeout(msg)) => assert!(msg.starts_with("connect")),
        other => panic!("expected timeout, got {:?}", other),
    }

    driver.connect_delay_ms.store(0, Ordering::SeqCst);
    let started = tokio::time::Instant::now();
    service.connect("Home", Some("hunter22")).await.unwrap();
    service.disconnect().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_quoted_ssid_and_password_reach_the_driver() {
    let driver = Arc::new(FakeDriver::new(&["wlan0"]));
    let service = service_on_wlan0(driver.clone(), BusyPolicy::Queue).await;

    service.connect("Bob's \"Cafe\"", None).await.unwrap();
    service.connect("Home", Some("pa\"ssword1")).await.unwrap();

    let calls = driver.calls();
    assert!(calls.contains(&"connect_open wlan0 Bob's \"Cafe\"".to_string()));
    assert!(calls.contains(&"connect_secured wlan0 Home".to_string()));
}

#[tokio::test]
async fn test_bootstrap_then_switch_interface() {
    let driver = Arc::new(FakeDriver::new(&["wlan0", "wlan1"]));
    let service = WifiService::new(driver.clone(), settings(BusyPolicy::Queue));

    let report = bootstrap::run(&service).await;
    assert_eq!(report.selected.as_deref(), Some("wlan0"));
    assert!(report.supplicant_ready);
    assert!(report.failures.is_empty());

    let calls = driver.calls();
    assert_eq!(calls, vec!["use wlan0", "kill wlan0", "detect", "start wlan0"]);

    service.use_interface("wlan1").await.unwrap();
    let status = service.get_status(None).await.unwrap();
    assert_eq!(status.interface, "wlan1");

    assert_eq!(
        service.use_interface("eth0").await,
        Err(WifiError::NotFound("eth0".to_string()))
    );
    assert_eq!(service.current_interface().await.as_deref(), Some("wlan1"));
}

#[tokio::test]
async fn test_connect_then_disconnect_twice() {
    let driver = Arc::new(FakeDriver::new(&["wlan0"]));
    let service = service_on_wlan0(driver.clone(), BusyPolicy::Queue).await;

    service.connect("Home", Some("hunter22")).await.unwrap();
    let status = service.get_status(None).await.unwrap();
    assert!(status.is_connected());
    assert_eq!(status.ssid, "Home");

    service.disconnect().await.unwrap();
    service.disconnect().await.unwrap();

    let status = service.get_status(None).await.unwrap();
    assert!(!status.is_connected());
    assert_eq!(status.ssid, "");
}

#[tokio::test]
async fn test_validation_precedes_interface_resolution() {
    let driver = Arc::new(FakeDriver::new(&["wlan0"]));
    let service = WifiService::new(driver.clone(), settings(BusyPolicy::Queue));

    // No interface selected, but the bad ssid is reported first
    assert_eq!(
        service.connect("", Some("secret")).await,
        Err(WifiError::Validation("Must provide a ssid".to_string()))
    );
    assert_eq!(service.connect("Home", None).await, Err(WifiError::NoInterface));
    assert!(driver.calls().is_empty());
}

#[tokio::test]
async fn test_poller_reports_failures_as_empty() {
    let driver = Arc::new(FakeDriver::new(&["wlan0"]));
    let service = Arc::new(WifiService::new(driver, settings(BusyPolicy::Queue)));
    let poller = Poller::new(service.clone(), Duration::from_secs(5));

    let snapshot = poller.poll_once().await;
    assert!(snapshot.networks.is_empty());
    assert_eq!(snapshot.current_ssid, "");
    assert_eq!(snapshot.errors.len(), 2);

    service.refresh_interfaces().await.unwrap();
    service.connect("Home", None).await.unwrap();

    let snapshot = poller.poll_once().await;
    assert!(snapshot.is_clean());
    assert_eq!(snapshot.networks.len(), 1);
    assert_eq!(snapshot.current_ssid, "Home");
}
