//! Error types for wgsync-core

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Result type for wgsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    UpstreamUnavailable,
    Io,
}

/// Errors that can occur in wgsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither a managed folder nor a merged config exists
    #[error("Interface not found: {name}")]
    InterfaceNotFound { name: String },

    #[error("Peer '{peer}' not found on interface {interface}")]
    PeerNotFound { interface: String, peer: String },

    /// Reset needs the merged config as its source
    #[error("Merged config not found at {path}")]
    CanonicalNotFound { path: PathBuf },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Malformed line in a config file
    #[error("Invalid config {path} line {line}: {message}")]
    InvalidConf {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Duplicate peer on {interface}: {message}")]
    DuplicatePeer { interface: String, message: String },

    #[error("{what} already exists: {name}")]
    AlreadyExists { what: &'static str, name: String },

    /// Another writer held the interface lock past the timeout
    #[error("Interface {interface} is being modified by another writer")]
    Conflict { interface: String },

    #[error("WireGuard control failed: {message}")]
    Upstream { message: String },

    #[error("Live query for {interface} timed out after {timeout:?}")]
    Timeout { interface: String, timeout: Duration },

    #[error("Command not found: {binary}")]
    CommandNotFound { binary: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from wgsync-fs
    #[error(transparent)]
    Fs(#[from] wgsync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InterfaceNotFound { .. }
            | Self::PeerNotFound { .. }
            | Self::CanonicalNotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. }
            | Self::InvalidConf { .. }
            | Self::DuplicatePeer { .. }
            | Self::AlreadyExists { .. } => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Upstream { .. } | Self::Timeout { .. } | Self::CommandNotFound { .. } => {
                ErrorKind::UpstreamUnavailable
            }
            Self::Fs(wgsync_fs::Error::InvalidIdentifier { .. }) => ErrorKind::Validation,
            Self::Fs(wgsync_fs::Error::LockContended { .. }) => ErrorKind::Conflict,
            Self::Fs(_) | Self::Io(_) | Self::Json(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(
            Error::InterfaceNotFound { name: "wg0".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(Error::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(
            Error::Conflict { interface: "wg0".into() }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            Error::Timeout {
                interface: "wg0".into(),
                timeout: Duration::from_secs(5)
            }
            .kind(),
            ErrorKind::UpstreamUnavailable
        );
    }

    #[test]
    fn wrapped_fs_errors_keep_their_meaning() {
        let contended = Error::from(wgsync_fs::Error::LockContended {
            path: PathBuf::from("/etc/wireguard/.wg0.lock"),
            waited: Duration::from_millis(10),
        });
        assert_eq!(contended.kind(), ErrorKind::Conflict);

        let invalid = Error::from(wgsync_fs::Error::InvalidIdentifier {
            identifier: "../x".into(),
            reason: "contains a path separator".into(),
        });
        assert_eq!(invalid.kind(), ErrorKind::Validation);
    }
}
