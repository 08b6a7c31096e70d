//! Filesystem layer for wgsync
//!
//! Provides normalized paths, atomic writes with restrictive file modes,
//! per-interface advisory locks and format-agnostic settings loading.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;

pub use config::ConfigStore;
pub use constants::WgPath;
pub use error::{Error, Result};
pub use io::FileMode;
pub use lock::{InterfaceLock, RobustnessConfig};
pub use path::{NormalizedPath, validate_path_identifier};
