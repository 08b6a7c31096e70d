//! Shared setup for wgsync-core integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wgsync_core::control::{LiveStatus, ReloadOutcome, WireGuardControl};
use wgsync_core::model::{RuntimePeerRecord, RuntimeState};
use wgsync_core::{Error, FolderStore, InterfaceStore, Result};
use wgsync_fs::NormalizedPath;
use wgsync_test_utils::TestWireGuard;
use wgsync_test_utils::keys::{KEY_A, KEY_B, PRIVATE_P, PRIVATE_Q};

pub const INTERFACE_FILE: &str = "\
[Interface]
Address = 10.0.0.1/24
ListenPort = 51820
PrivateKey = cHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHA=
";

pub fn laptop_file() -> String {
    format!(
        "[Interface]\nPrivateKey = {PRIVATE_Q}\n\n[Peer]\nPublicKey = {KEY_A}\nAllowedIPs = 10.0.0.2/32\nPersistentKeepalive = 25\n"
    )
}

pub fn phone_file() -> String {
    format!("[Peer]\nPublicKey = {KEY_B}\nAllowedIPs = 10.0.0.3/32\n")
}

/// `wg0` folder with an interface file, `laptop` (own private key) and `phone`.
pub fn populated() -> TestWireGuard {
    let wg = TestWireGuard::new();
    assert!(INTERFACE_FILE.contains(PRIVATE_P));
    wg.interface_file("wg0", INTERFACE_FILE);
    wg.peer_file("wg0", "laptop", &laptop_file());
    wg.peer_file("wg0", "phone", &phone_file());
    wg
}

pub fn store(wg: &TestWireGuard) -> Arc<dyn InterfaceStore> {
    Arc::new(FolderStore::new(NormalizedPath::new(wg.root())).with_lock_timeout(Duration::from_millis(200)))
}

/// Scripted [`WireGuardControl`] that records reloads.
pub struct FakeControl {
    live: std::result::Result<LiveStatus, String>,
    query_timeout: Option<Duration>,
    reload_error: Option<String>,
    reloads: Mutex<Vec<String>>,
}

impl FakeControl {
    pub fn inactive() -> Self {
        Self::with_live(Ok(LiveStatus::Inactive))
    }

    pub fn active(peers: Vec<RuntimePeerRecord>) -> Self {
        Self::with_live(Ok(LiveStatus::Active(RuntimeState {
            interface: "wg0".into(),
            public_key: None,
            listen_port: Some(51820),
            peers,
        })))
    }

    pub fn unreachable(message: &str) -> Self {
        Self::with_live(Err(message.to_string()))
    }

    fn with_live(live: std::result::Result<LiveStatus, String>) -> Self {
        Self {
            live,
            query_timeout: None,
            reload_error: None,
            reloads: Mutex::new(Vec::new()),
        }
    }

    /// Every query fails the way a hung `wg show` does.
    pub fn timing_out(timeout: Duration) -> Self {
        let mut control = Self::inactive();
        control.query_timeout = Some(timeout);
        control
    }

    pub fn failing_reload(mut self, message: &str) -> Self {
        self.reload_error = Some(message.to_string());
        self
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.lock().unwrap().len()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl WireGuardControl for FakeControl {
    async fn query(&self, interface: &str) -> Result<LiveStatus> {
        if let Some(timeout) = self.query_timeout {
            return Err(Error::Timeout {
                interface: interface.to_string(),
                timeout,
            });
        }
        self.live.clone().map_err(Error::upstream)
    }

    async fn reload(&self, interface: &str, _config_path: &NormalizedPath) -> Result<ReloadOutcome> {
        self.reloads.lock().unwrap().push(interface.to_string());
        if let Some(message) = &self.reload_error {
            return Err(Error::upstream(message.clone()));
        }
        match &self.live {
            Ok(LiveStatus::Inactive) => Ok(ReloadOutcome::Skipped),
            _ => Ok(ReloadOutcome::Reloaded),
        }
    }
}
