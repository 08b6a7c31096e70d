//! Well-known paths of a WireGuard configuration directory.

use crate::NormalizedPath;

/// Default directory holding merged configs and managed folders.
pub const DEFAULT_BASE_DIR: &str = "/etc/wireguard";

/// Default location of the wgsync settings file.
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/wireguard/wgsync.toml";

/// Extension shared by every WireGuard config file.
pub const CONF_EXTENSION: &str = "conf";

/// Paths derived from the base directory for one interface.
///
/// ```text
/// <base>/<iface>.conf          merged config read by the daemon
/// <base>/<iface>/<iface>.conf  interface section of the managed folder
/// <base>/<iface>/<peer>.conf   one file per peer
/// <base>/.<iface>.lock         writer lock
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WgPath {
    Canonical,
    Folder,
    InterfaceFile,
    Lock,
}

impl WgPath {
    pub fn resolve(self, base_dir: &NormalizedPath, interface: &str) -> NormalizedPath {
        match self {
            Self::Canonical => base_dir.join(&conf_file_name(interface)),
            Self::Folder => base_dir.join(interface),
            Self::InterfaceFile => base_dir.join(interface).join(&conf_file_name(interface)),
            Self::Lock => base_dir.join(&format!(".{}.lock", interface)),
        }
    }
}

/// `<stem>.conf`
pub fn conf_file_name(stem: &str) -> String {
    format!("{}.{}", stem, CONF_EXTENSION)
}
