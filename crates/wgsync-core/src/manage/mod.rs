//! Explicit interface and peer management
//!
//! The only code that creates, edits or deletes managed files one at a time.
//! Every write holds the interface lock.

mod interface;
mod peer;

pub use interface::{
    DEFAULT_ADDRESS, DEFAULT_LISTEN_PORT, InterfaceManager, InterfaceUpdate, NewInterface,
};
pub use peer::{DEFAULT_ALLOWED_IPS, NewPeer, PeerManager, PeerUpdate};

/// `None` keeps the current value, an empty string clears it.
fn apply_change(slot: &mut Option<String>, change: Option<String>) {
    if let Some(value) = change {
        let value = value.trim();
        *slot = if value.is_empty() { None } else { Some(value.to_string()) };
    }
}
