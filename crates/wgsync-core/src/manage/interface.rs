//! Interface CRUD

use std::sync::Arc;

use tracing::info;

use crate::keys::{KeyGenerator, derive_public_key};
use crate::model::InterfaceRecord;
use crate::store::InterfaceStore;
use crate::validation::{validate_interface, validate_interface_name};
use crate::Result;

use super::apply_change;

pub const DEFAULT_ADDRESS: &str = "10.0.0.1/24";
pub const DEFAULT_LISTEN_PORT: u16 = 51820;

/// Parameters of a new interface.
#[derive(Debug, Clone, Default)]
pub struct NewInterface {
    pub name: String,
    pub address: Option<String>,
    pub listen_port: Option<u16>,
    pub dns: Option<String>,
}

/// Field edits. `None` leaves a field alone; `Some("")` clears it.
#[derive(Debug, Clone, Default)]
pub struct InterfaceUpdate {
    pub address: Option<String>,
    pub listen_port: Option<String>,
    pub dns: Option<String>,
    pub post_up: Option<String>,
    pub post_down: Option<String>,
}

impl InterfaceUpdate {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.listen_port.is_none()
            && self.dns.is_none()
            && self.post_up.is_none()
            && self.post_down.is_none()
    }
}

pub struct InterfaceManager {
    store: Arc<dyn InterfaceStore>,
    keys: Arc<dyn KeyGenerator>,
}

impl InterfaceManager {
    pub fn new(store: Arc<dyn InterfaceStore>, keys: Arc<dyn KeyGenerator>) -> Self {
        Self { store, keys }
    }

    /// Every managed interface, with its public key derived.
    pub fn list(&self) -> Result<Vec<InterfaceRecord>> {
        self.store
            .list_interfaces()?
            .iter()
            .map(|name| self.show(name))
            .collect()
    }

    pub fn show(&self, name: &str) -> Result<InterfaceRecord> {
        let mut record = self.store.read_folder(name)?.interface;
        record.public_key = match record.private_key.as_deref() {
            Some(private_key) if !private_key.is_empty() => derive_public_key(private_key).ok(),
            _ => None,
        };
        Ok(record)
    }

    /// Create a managed folder with a fresh key pair.
    pub fn create(&self, request: NewInterface) -> Result<InterfaceRecord> {
        validate_interface_name(&request.name)?;
        let _lock = self.store.lock(&request.name)?;

        let pair = self.keys.generate()?;
        let mut record = InterfaceRecord::new(&request.name);
        record.address = Some(request.address.unwrap_or_else(|| DEFAULT_ADDRESS.to_string()));
        record.listen_port = Some(request.listen_port.unwrap_or(DEFAULT_LISTEN_PORT).to_string());
        record.dns = request.dns.filter(|d| !d.trim().is_empty());
        record.private_key = Some(pair.private);
        validate_interface(&record)?;

        self.store.create_folder(&record)?;
        info!(interface = %record.name, "created interface");

        record.public_key = Some(pair.public);
        Ok(record)
    }

    pub fn update(&self, name: &str, update: InterfaceUpdate) -> Result<InterfaceRecord> {
        let _lock = self.store.lock(name)?;
        let mut record = self.store.read_folder(name)?.interface;

        apply_change(&mut record.address, update.address);
        apply_change(&mut record.listen_port, update.listen_port);
        apply_change(&mut record.dns, update.dns);
        apply_change(&mut record.post_up, update.post_up);
        apply_change(&mut record.post_down, update.post_down);
        validate_interface(&record)?;

        self.store.write_interface(&record)?;
        info!(interface = name, "updated interface");
        drop(_lock);
        self.show(name)
    }

    /// Remove the managed folder. The merged config stays for the daemon.
    pub fn delete(&self, name: &str) -> Result<()> {
        let _lock = self.store.lock(name)?;
        self.store.delete_interface(name)?;
        info!(interface = name, "deleted interface");
        Ok(())
    }
}
