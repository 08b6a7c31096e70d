//! Apply and reset command implementations

use colored::Colorize;
use wgsync_core::{ReloadOutcome, SyncOptions};

use super::diff::print_diff_report;
use super::print_json;
use crate::context::Context;
use crate::error::Result;

/// Merge the managed folder into the merged config and reload.
pub async fn run_apply(context: &Context, interface: &str, dry_run: bool, json: bool) -> Result<()> {
    let report = context
        .synchronizer()
        .apply_with_options(interface, SyncOptions { dry_run })
        .await?;
    if json {
        return print_json(&report);
    }

    print_diff_report(&report.diff, "merged config", "folder");
    println!();
    if dry_run {
        if report.changed {
            println!(
                "{} Would write {}",
                "[dry-run]".yellow(),
                report.path.yellow()
            );
        } else {
            println!("{} Nothing to write.", "[dry-run]".yellow());
        }
        return Ok(());
    }

    if report.changed {
        println!("{} Wrote {}", "OK".green().bold(), report.path.yellow());
    } else {
        println!("{} {} already up to date", "OK".green().bold(), report.path.yellow());
    }
    match &report.reload {
        ReloadOutcome::Reloaded => println!("{} Reloaded {}", "OK".green().bold(), interface.cyan()),
        ReloadOutcome::Skipped => println!(
            "{} {} is not running; it picks up the file when brought up",
            "--".dimmed(),
            interface.cyan()
        ),
        ReloadOutcome::Failed { message } => println!(
            "{} File written but reload failed: {}",
            "WARN".yellow().bold(),
            message
        ),
        ReloadOutcome::NotAttempted => {}
    }
    Ok(())
}

/// Split the merged config back into the managed folder.
pub fn run_reset(context: &Context, interface: &str, dry_run: bool, json: bool) -> Result<()> {
    let report = context
        .synchronizer()
        .reset_with_options(interface, SyncOptions { dry_run })?;
    if json {
        return print_json(&report);
    }

    print_diff_report(&report.diff, "folder", "merged config");
    if !report.changed {
        return Ok(());
    }

    println!();
    println!("{}", "Peer files:".bold());
    for assignment in &report.assignments {
        let how = match assignment.matched_by {
            Some(tier) => format!("kept, matched by {}", tier_label(tier)),
            None => "new".to_string(),
        };
        let key_note = if assignment.kept_private_key {
            ", private key kept"
        } else {
            ""
        };
        println!(
            "  {} {}.conf ({}{})",
            "*".green(),
            assignment.name.cyan(),
            how.dimmed(),
            key_note.dimmed()
        );
    }

    println!();
    if dry_run {
        println!("{} Folder not written.", "[dry-run]".yellow());
    } else {
        println!("{} Rewrote managed folder of {}", "OK".green().bold(), interface.cyan());
    }
    Ok(())
}

fn tier_label(tier: wgsync_core::MatchTier) -> &'static str {
    match tier {
        wgsync_core::MatchTier::PublicKey => "public key",
        wgsync_core::MatchTier::Name => "name",
        wgsync_core::MatchTier::AllowedIps => "allowed IPs",
    }
}
