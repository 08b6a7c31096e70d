//! Shared test utilities for the wgsync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`keys`]: fixed, well-formed WireGuard keys
//! - [`wireguard`]: [`TestWireGuard`] base-directory builder

pub mod keys;
pub mod wireguard;

pub use wireguard::{TestWireGuard, fixtures_dir};
