//! Peer, interface and runtime records
//!
//! `PeerRecord` and `RuntimePeerRecord` both implement [`PeerView`], which is
//! the read-only surface the matcher and the diff engine work against.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only view of the comparable fields of a peer.
pub trait PeerView {
    fn public_key(&self) -> &str;

    /// Human label, when the representation carries one.
    fn name(&self) -> Option<&str> {
        None
    }

    fn allowed_ips(&self) -> &str;

    fn endpoint(&self) -> Option<&str>;

    fn persistent_keepalive(&self) -> Option<&str>;
}

/// One peer's declared configuration.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// File stem in the managed folder. Peers read from a merged config have no name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub public_key: String,
    /// Present only for server-generated key pairs.
    #[serde(skip)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub allowed_ips: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_keepalive: Option<String>,
    /// Unrecognised `[Peer]` keys, kept in file order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl PeerRecord {
    pub fn new(public_key: impl Into<String>, allowed_ips: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            allowed_ips: allowed_ips.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_keepalive(mut self, keepalive: impl Into<String>) -> Self {
        self.persistent_keepalive = Some(keepalive.into());
        self
    }

    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    /// The record as it appears in a merged config: no name, no private key.
    pub fn without_secrets(&self) -> Self {
        Self {
            name: None,
            private_key: None,
            ..self.clone()
        }
    }
}

impl PeerView for PeerRecord {
    fn public_key(&self) -> &str {
        &self.public_key
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn allowed_ips(&self) -> &str {
        &self.allowed_ips
    }

    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn persistent_keepalive(&self) -> Option<&str> {
        self.persistent_keepalive.as_deref()
    }
}

impl fmt::Debug for PeerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerRecord")
            .field("name", &self.name)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "[redacted]"))
            .field("allowed_ips", &self.allowed_ips)
            .field("endpoint", &self.endpoint)
            .field("persistent_keepalive", &self.persistent_keepalive)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Live observation of a peer, as reported by the running daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimePeerRecord {
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub allowed_ips: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_handshake: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transfer_rx: u64,
    #[serde(default)]
    pub transfer_tx: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_keepalive: Option<String>,
}

impl RuntimePeerRecord {
    pub fn new(public_key: impl Into<String>, allowed_ips: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            allowed_ips: allowed_ips.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

impl PeerView for RuntimePeerRecord {
    fn public_key(&self) -> &str {
        &self.public_key
    }

    fn allowed_ips(&self) -> &str {
        &self.allowed_ips
    }

    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn persistent_keepalive(&self) -> Option<&str> {
        self.persistent_keepalive.as_deref()
    }
}

/// Live state of an active interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    #[serde(default)]
    pub peers: Vec<RuntimePeerRecord>,
}

/// The `[Interface]` section of a config.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<String>,
    /// Derived from `private_key` when displayed; never read from or written to a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip)]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_up: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_down: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl InterfaceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Equality of everything that is written to disk (ignores the derived public key).
    pub fn same_section(&self, other: &Self) -> bool {
        self.address == other.address
            && self.listen_port == other.listen_port
            && self.private_key == other.private_key
            && self.dns == other.dns
            && self.post_up == other.post_up
            && self.post_down == other.post_down
            && self.extra == other.extra
    }
}

impl fmt::Debug for InterfaceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceRecord")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("listen_port", &self.listen_port)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "[redacted]"))
            .field("dns", &self.dns)
            .field("post_up", &self.post_up)
            .field("post_down", &self.post_down)
            .field("extra", &self.extra)
            .finish()
    }
}

/// An interface section plus its peers, in order.
///
/// This is the shape of both the merged config and the managed folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireGuardConfig {
    pub interface: InterfaceRecord,
    #[serde(default)]
    pub peers: Vec<PeerRecord>,
}

impl WireGuardConfig {
    pub fn new(interface: InterfaceRecord, peers: Vec<PeerRecord>) -> Self {
        Self { interface, peers }
    }

    /// Find a peer by its folder name.
    pub fn peer(&self, name: &str) -> Option<&PeerRecord> {
        self.peers.iter().find(|p| p.name.as_deref() == Some(name))
    }
}
