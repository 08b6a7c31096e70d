//! Configuration management for wgsync

mod settings;

pub use settings::{
    LoggingSettings, ReconcileSource, Settings, SyncSettings, WireGuardSettings,
};
