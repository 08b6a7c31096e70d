//! Command implementations for wgsync-cli

pub mod config;
pub mod diff;
pub mod interface;
pub mod peer;
pub mod state;
pub mod sync;

pub use config::{run_config_init, run_config_show};
pub use diff::run_diff;
pub use interface::run_interface;
pub use peer::run_peer;
pub use state::{run_reconcile, run_state};
pub use sync::{run_apply, run_reset};

use colored::Colorize;
use serde::Serialize;
use wgsync_core::diff::InterfaceFieldChange;
use wgsync_core::{PeerDiff, PeerStatus};

use crate::error::Result;

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Per-peer diff lines, `left`/`right` naming the two sides.
pub(crate) fn print_peer_diffs(diffs: &[PeerDiff], left: &str, right: &str) {
    for diff in diffs {
        let (marker, label) = match diff.status {
            PeerStatus::Added => ("+".green(), format!("only in {}", right).green()),
            PeerStatus::Removed => ("-".red(), format!("only in {}", left).red()),
            PeerStatus::NotLive => ("-".red(), "not live".red()),
            PeerStatus::Modified if diff.is_strict => ("~".yellow(), "modified".yellow()),
            PeerStatus::Modified => ("~".normal(), "endpoint drift".dimmed()),
        };
        println!("  {} {} ({})", marker, diff.identity.cyan(), label);

        if diff.status == PeerStatus::Modified {
            for change in &diff.changed_fields {
                println!(
                    "      {:<20} {} {} {}",
                    change.field.to_string().dimmed(),
                    change.left_value.as_deref().unwrap_or("(none)"),
                    "->".dimmed(),
                    change.right_value.as_deref().unwrap_or("(none)")
                );
            }
        }
    }
}

pub(crate) fn print_interface_changes(changes: &[InterfaceFieldChange]) {
    for change in changes {
        println!(
            "  {} {:<18} {} {} {}",
            "~".yellow(),
            change.field.dimmed(),
            change.left_value.as_deref().unwrap_or("(none)"),
            "->".dimmed(),
            change.right_value.as_deref().unwrap_or("(none)")
        );
    }
}

/// Unified diff text with added and removed lines coloured.
pub(crate) fn print_text_diff(text: &str) {
    for line in text.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{}", line);
        }
    }
}
