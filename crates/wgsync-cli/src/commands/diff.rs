//! Diff command implementation
//!
//! Previews what apply would change without writing anything.

use colored::Colorize;
use wgsync_core::{ConfigDiffReport, SyncStatus};

use super::{print_interface_changes, print_json, print_peer_diffs, print_text_diff};
use crate::context::Context;
use crate::error::Result;

pub fn run_diff(context: &Context, interface: &str, json: bool) -> Result<()> {
    let report = context.synchronizer().diff(interface)?;
    if json {
        return print_json(&report);
    }

    print_diff_report(&report, "merged config", "folder");
    if !report.is_in_sync() {
        println!();
        println!("Run {} to apply these changes.", format!("wgsync apply {}", interface).cyan());
    }
    Ok(())
}

/// Human-readable report body shared by diff, apply and reset.
pub(crate) fn print_diff_report(report: &ConfigDiffReport, left: &str, right: &str) {
    match report.status {
        SyncStatus::InSync => {
            println!(
                "{} {} is in sync.",
                "OK".green().bold(),
                report.interface.cyan()
            );
            return;
        }
        SyncStatus::MinorDrift => println!(
            "{} {} ({} vs {})",
            "DRIFT".yellow().bold(),
            report.interface.cyan(),
            left,
            right
        ),
        SyncStatus::OutOfSync => println!(
            "{} {} ({} vs {})",
            "OUT OF SYNC".red().bold(),
            report.interface.cyan(),
            left,
            right
        ),
    }

    if !report.interface_changes.is_empty() {
        println!();
        println!("{}", "Interface:".bold());
        print_interface_changes(&report.interface_changes);
    }
    if !report.peers.is_empty() {
        println!();
        println!("{}", "Peers:".bold());
        print_peer_diffs(&report.peers, left, right);
    }
    if !report.text_diff.is_empty() {
        println!();
        print_text_diff(&report.text_diff);
    }
}
