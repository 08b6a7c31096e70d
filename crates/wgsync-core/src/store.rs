//! Interface file store
//!
//! [`InterfaceStore`] is the persistence contract the synchronizer, the
//! reconciler and the manager work against. [`FolderStore`] implements it on
//! a WireGuard base directory:
//!
//! ```text
//! <base>/<iface>.conf          merged config
//! <base>/<iface>/<iface>.conf  interface section
//! <base>/<iface>/<peer>.conf   one file per peer
//! ```

use std::time::Duration;

use tracing::{debug, info};
use wgsync_fs::{
    FileMode, InterfaceLock, NormalizedPath, RobustnessConfig, WgPath, checksum,
    constants::{CONF_EXTENSION, conf_file_name},
    io::{self, StagedFile},
    validate_path_identifier,
};

use crate::conf::{
    is_secret_key, parse_config, parse_interface_file, parse_peer_file, render_interface_file,
    render_peer_file,
};
use crate::model::{InterfaceRecord, PeerRecord, WireGuardConfig};
use crate::{Error, Result};

/// Persistence of managed folders and merged configs.
pub trait InterfaceStore: Send + Sync {
    fn base_dir(&self) -> &NormalizedPath;

    /// Names of managed interface folders, sorted.
    fn list_interfaces(&self) -> Result<Vec<String>>;

    fn folder_exists(&self, interface: &str) -> Result<bool>;

    fn canonical_exists(&self, interface: &str) -> Result<bool>;

    /// Interface section plus every peer file, in file-name order.
    fn read_folder(&self, interface: &str) -> Result<WireGuardConfig>;

    /// Replace the whole folder with `config`. Every peer must be named.
    fn write_folder(&self, config: &WireGuardConfig) -> Result<()>;

    /// Parsed merged config, `None` when the file does not exist.
    fn read_canonical(&self, interface: &str) -> Result<Option<WireGuardConfig>>;

    fn read_canonical_text(&self, interface: &str) -> Result<Option<String>>;

    /// Atomically write the merged config. Returns whether the content changed.
    fn write_canonical(&self, interface: &str, content: &str) -> Result<bool>;

    fn canonical_path(&self, interface: &str) -> Result<NormalizedPath>;

    /// Create a new folder holding only the interface file.
    fn create_folder(&self, interface: &InterfaceRecord) -> Result<()>;

    fn write_interface(&self, interface: &InterfaceRecord) -> Result<()>;

    fn read_peer(&self, interface: &str, name: &str) -> Result<PeerRecord>;

    fn peer_exists(&self, interface: &str, name: &str) -> Result<bool>;

    fn write_peer(&self, interface: &str, peer: &PeerRecord) -> Result<()>;

    fn delete_peer(&self, interface: &str, name: &str) -> Result<()>;

    /// Remove the managed folder. The merged config is left for the daemon.
    fn delete_interface(&self, interface: &str) -> Result<()>;

    /// Exclusive writer lock for one interface.
    fn lock(&self, interface: &str) -> Result<InterfaceLock>;
}

/// [`InterfaceStore`] over a WireGuard base directory.
#[derive(Debug, Clone)]
pub struct FolderStore {
    base_dir: NormalizedPath,
    robustness: RobustnessConfig,
}

impl FolderStore {
    pub fn new(base_dir: NormalizedPath) -> Self {
        Self {
            base_dir,
            robustness: RobustnessConfig::default(),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.robustness = self.robustness.with_lock_timeout(timeout);
        self
    }

    fn path(&self, kind: WgPath, interface: &str) -> Result<NormalizedPath> {
        validate_path_identifier(interface)?;
        Ok(kind.resolve(&self.base_dir, interface))
    }

    fn existing_folder(&self, interface: &str) -> Result<NormalizedPath> {
        let folder = self.path(WgPath::Folder, interface)?;
        if !folder.is_dir() {
            return Err(Error::InterfaceNotFound {
                name: interface.to_string(),
            });
        }
        Ok(folder)
    }

    fn peer_path(&self, interface: &str, name: &str) -> Result<NormalizedPath> {
        validate_path_identifier(name)?;
        Ok(self.existing_folder(interface)?.join(&conf_file_name(name)))
    }

    fn peer_name<'a>(peer: &'a PeerRecord, interface: &str) -> Result<&'a str> {
        peer.name.as_deref().filter(|n| !n.is_empty()).ok_or_else(|| {
            Error::validation(format!("peer {} on {} has no name", peer.public_key, interface))
        })
    }
}

/// Files holding any secret (own private key or a preshared key) are private.
fn mode_for(private_key: Option<&str>, extra: &[(String, String)]) -> FileMode {
    let has_private_key = private_key.is_some_and(|k| !k.trim().is_empty());
    if has_private_key || extra.iter().any(|(key, _)| is_secret_key(key)) {
        FileMode::Private
    } else {
        FileMode::Shared
    }
}

impl InterfaceStore for FolderStore {
    fn base_dir(&self) -> &NormalizedPath {
        &self.base_dir
    }

    fn list_interfaces(&self) -> Result<Vec<String>> {
        if !self.base_dir.is_dir() {
            return Ok(Vec::new());
        }
        Ok(io::list_dirs(&self.base_dir)?)
    }

    fn folder_exists(&self, interface: &str) -> Result<bool> {
        Ok(self.path(WgPath::Folder, interface)?.is_dir())
    }

    fn canonical_exists(&self, interface: &str) -> Result<bool> {
        Ok(self.path(WgPath::Canonical, interface)?.is_file())
    }

    fn read_folder(&self, interface: &str) -> Result<WireGuardConfig> {
        let folder = self.existing_folder(interface)?;
        let interface_file = self.path(WgPath::InterfaceFile, interface)?;

        let record = match io::read_text_opt(&interface_file)? {
            Some(text) => parse_interface_file(interface, &text, &interface_file.to_native())?,
            None => InterfaceRecord::new(interface),
        };

        let mut peers = Vec::new();
        for path in io::list_files(&folder, CONF_EXTENSION)? {
            let Some(name) = path.file_stem() else {
                continue;
            };
            if name == interface || name.starts_with('.') {
                continue;
            }
            let text = io::read_text(&path)?;
            peers.push(parse_peer_file(name, &text, &path.to_native())?);
        }

        debug!(interface, peers = peers.len(), "read managed folder");
        Ok(WireGuardConfig::new(record, peers))
    }

    fn write_folder(&self, config: &WireGuardConfig) -> Result<()> {
        let interface = config.interface.name.as_str();
        let folder = self.path(WgPath::Folder, interface)?;

        let mut files = vec![StagedFile {
            name: conf_file_name(interface),
            content: render_interface_file(&config.interface),
            mode: mode_for(config.interface.private_key.as_deref(), &config.interface.extra),
        }];
        for peer in &config.peers {
            let name = Self::peer_name(peer, interface)?;
            validate_path_identifier(name)?;
            files.push(StagedFile {
                name: conf_file_name(name),
                content: render_peer_file(peer),
                mode: mode_for(peer.private_key.as_deref(), &peer.extra),
            });
        }

        io::replace_dir(&folder, &files, CONF_EXTENSION)?;
        info!(interface, peers = config.peers.len(), "rewrote managed folder");
        Ok(())
    }

    fn read_canonical(&self, interface: &str) -> Result<Option<WireGuardConfig>> {
        let path = self.path(WgPath::Canonical, interface)?;
        match io::read_text_opt(&path)? {
            Some(text) => Ok(Some(parse_config(interface, &text, &path.to_native())?)),
            None => Ok(None),
        }
    }

    fn read_canonical_text(&self, interface: &str) -> Result<Option<String>> {
        let path = self.path(WgPath::Canonical, interface)?;
        Ok(io::read_text_opt(&path)?)
    }

    fn write_canonical(&self, interface: &str, content: &str) -> Result<bool> {
        let path = self.path(WgPath::Canonical, interface)?;
        if checksum::content_matches(&path, content)? {
            debug!(interface, "merged config already up to date");
            return Ok(false);
        }
        io::write_atomic(&path, content.as_bytes(), FileMode::Private)?;
        info!(interface, checksum = %checksum::compute_content_checksum(content), "wrote merged config");
        Ok(true)
    }

    fn canonical_path(&self, interface: &str) -> Result<NormalizedPath> {
        self.path(WgPath::Canonical, interface)
    }

    fn create_folder(&self, interface: &InterfaceRecord) -> Result<()> {
        let folder = self.path(WgPath::Folder, &interface.name)?;
        if folder.exists() {
            return Err(Error::AlreadyExists {
                what: "interface",
                name: interface.name.clone(),
            });
        }
        io::create_dir(&folder)?;
        self.write_interface(interface)
    }

    fn write_interface(&self, interface: &InterfaceRecord) -> Result<()> {
        self.existing_folder(&interface.name)?;
        let path = self.path(WgPath::InterfaceFile, &interface.name)?;
        io::write_atomic(
            &path,
            render_interface_file(interface).as_bytes(),
            mode_for(interface.private_key.as_deref(), &interface.extra),
        )?;
        Ok(())
    }

    fn read_peer(&self, interface: &str, name: &str) -> Result<PeerRecord> {
        let path = self.peer_path(interface, name)?;
        match io::read_text_opt(&path)? {
            Some(text) => parse_peer_file(name, &text, &path.to_native()),
            None => Err(Error::PeerNotFound {
                interface: interface.to_string(),
                peer: name.to_string(),
            }),
        }
    }

    fn peer_exists(&self, interface: &str, name: &str) -> Result<bool> {
        Ok(self.peer_path(interface, name)?.is_file())
    }

    fn write_peer(&self, interface: &str, peer: &PeerRecord) -> Result<()> {
        let name = Self::peer_name(peer, interface)?;
        let path = self.peer_path(interface, name)?;
        io::write_atomic(
            &path,
            render_peer_file(peer).as_bytes(),
            mode_for(peer.private_key.as_deref(), &peer.extra),
        )?;
        Ok(())
    }

    fn delete_peer(&self, interface: &str, name: &str) -> Result<()> {
        let path = self.peer_path(interface, name)?;
        if !path.is_file() {
            return Err(Error::PeerNotFound {
                interface: interface.to_string(),
                peer: name.to_string(),
            });
        }
        io::remove_file(&path)?;
        Ok(())
    }

    fn delete_interface(&self, interface: &str) -> Result<()> {
        let folder = self.existing_folder(interface)?;
        io::remove_dir_all(&folder)?;
        info!(interface, "deleted managed folder");
        Ok(())
    }

    fn lock(&self, interface: &str) -> Result<InterfaceLock> {
        let path = self.path(WgPath::Lock, interface)?;
        InterfaceLock::acquire(&path, self.robustness).map_err(|e| match e {
            wgsync_fs::Error::LockContended { .. } => Error::Conflict {
                interface: interface.to_string(),
            },
            other => Error::Fs(other),
        })
    }
}
