//! Peer CRUD

use std::sync::Arc;

use tracing::info;

use crate::keys::KeyGenerator;
use crate::model::PeerRecord;
use crate::store::InterfaceStore;
use crate::validation::{validate_peer_name, validate_peer_set};
use crate::{Error, Result};

use super::apply_change;

pub const DEFAULT_ALLOWED_IPS: &str = "10.0.0.2/32";

/// Parameters of a new peer.
///
/// Without `public_key` a key pair is generated and the private half is kept
/// in the peer file. With one, the peer manages its own keys.
#[derive(Debug, Clone, Default)]
pub struct NewPeer {
    pub name: String,
    pub allowed_ips: Option<String>,
    pub endpoint: Option<String>,
    pub persistent_keepalive: Option<String>,
    pub public_key: Option<String>,
}

/// Field edits. `None` leaves a field alone; `Some("")` clears it.
#[derive(Debug, Clone, Default)]
pub struct PeerUpdate {
    pub allowed_ips: Option<String>,
    pub endpoint: Option<String>,
    pub persistent_keepalive: Option<String>,
    /// Re-key. Drops any stored private key.
    pub public_key: Option<String>,
}

impl PeerUpdate {
    pub fn is_empty(&self) -> bool {
        self.allowed_ips.is_none()
            && self.endpoint.is_none()
            && self.persistent_keepalive.is_none()
            && self.public_key.is_none()
    }
}

pub struct PeerManager {
    store: Arc<dyn InterfaceStore>,
    keys: Arc<dyn KeyGenerator>,
}

impl PeerManager {
    pub fn new(store: Arc<dyn InterfaceStore>, keys: Arc<dyn KeyGenerator>) -> Self {
        Self { store, keys }
    }

    pub fn list(&self, interface: &str) -> Result<Vec<PeerRecord>> {
        Ok(self.store.read_folder(interface)?.peers)
    }

    pub fn show(&self, interface: &str, name: &str) -> Result<PeerRecord> {
        self.store.read_peer(interface, name)
    }

    pub fn add(&self, interface: &str, request: NewPeer) -> Result<PeerRecord> {
        validate_peer_name(interface, &request.name)?;
        let _lock = self.store.lock(interface)?;

        let folder = self.store.read_folder(interface)?;
        if folder.peer(&request.name).is_some() {
            return Err(Error::AlreadyExists {
                what: "peer",
                name: request.name,
            });
        }

        let (public_key, private_key) = match request.public_key.filter(|k| !k.trim().is_empty()) {
            Some(public_key) => (public_key.trim().to_string(), None),
            None => {
                let pair = self.keys.generate()?;
                (pair.public, Some(pair.private))
            }
        };

        let peer = PeerRecord {
            name: Some(request.name.clone()),
            public_key,
            private_key,
            allowed_ips: request
                .allowed_ips
                .unwrap_or_else(|| DEFAULT_ALLOWED_IPS.to_string()),
            endpoint: request.endpoint.filter(|e| !e.trim().is_empty()),
            persistent_keepalive: request.persistent_keepalive.filter(|k| !k.trim().is_empty()),
            extra: Vec::new(),
        };

        let mut peers = folder.peers;
        peers.push(peer.clone());
        validate_peer_set(interface, &peers)?;

        self.store.write_peer(interface, &peer)?;
        info!(interface, peer = %request.name, "added peer");
        Ok(peer)
    }

    pub fn update(&self, interface: &str, name: &str, update: PeerUpdate) -> Result<PeerRecord> {
        let _lock = self.store.lock(interface)?;
        let folder = self.store.read_folder(interface)?;
        let mut peer = folder.peer(name).cloned().ok_or_else(|| Error::PeerNotFound {
            interface: interface.to_string(),
            peer: name.to_string(),
        })?;

        if let Some(allowed_ips) = update.allowed_ips {
            peer.allowed_ips = allowed_ips.trim().to_string();
        }
        apply_change(&mut peer.endpoint, update.endpoint);
        apply_change(&mut peer.persistent_keepalive, update.persistent_keepalive);
        if let Some(public_key) = update.public_key {
            let public_key = public_key.trim().to_string();
            if public_key != peer.public_key {
                peer.public_key = public_key;
                peer.private_key = None;
            }
        }

        let peers: Vec<PeerRecord> = folder
            .peers
            .iter()
            .map(|existing| {
                if existing.name.as_deref() == Some(name) {
                    peer.clone()
                } else {
                    existing.clone()
                }
            })
            .collect();
        validate_peer_set(interface, &peers)?;

        self.store.write_peer(interface, &peer)?;
        info!(interface, peer = name, "updated peer");
        Ok(peer)
    }

    pub fn delete(&self, interface: &str, name: &str) -> Result<()> {
        let _lock = self.store.lock(interface)?;
        self.store.delete_peer(interface, name)?;
        info!(interface, peer = name, "deleted peer");
        Ok(())
    }
}
