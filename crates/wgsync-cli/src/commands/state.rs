//! Live state and reconciliation commands

use colored::Colorize;
use serde_json::json;
use wgsync_core::{InterfaceStatus, RuntimePeerRecord};

use super::{print_json, print_peer_diffs};
use crate::context::Context;
use crate::error::Result;

/// Show what the running interface reports.
pub async fn run_state(context: &Context, interface: &str, json: bool) -> Result<()> {
    let state = context.reconciler().live_state(interface).await?;

    if json {
        return print_json(&json!({
            "interface": interface,
            "active": state.is_some(),
            "state": state,
        }));
    }

    let Some(state) = state else {
        println!("{} {} is not running.", "--".dimmed(), interface.cyan());
        return Ok(());
    };

    println!("{}", format!("[{}]", interface).bold());
    if let Some(public_key) = &state.public_key {
        println!("  {:<12} {}", "PublicKey:".dimmed(), public_key);
    }
    if let Some(port) = state.listen_port {
        println!("  {:<12} {}", "ListenPort:".dimmed(), port);
    }
    for peer in &state.peers {
        println!();
        print_live_peer(peer);
    }
    Ok(())
}

fn print_live_peer(peer: &RuntimePeerRecord) {
    println!("  {} {}", "peer".bold(), peer.public_key.cyan());
    println!("    {:<12} {}", "AllowedIPs:".dimmed(), peer.allowed_ips);
    if let Some(endpoint) = &peer.endpoint {
        println!("    {:<12} {}", "Endpoint:".dimmed(), endpoint);
    }
    let handshake = peer
        .latest_handshake
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!("    {:<12} {}", "Handshake:".dimmed(), handshake);
    println!(
        "    {:<12} {} received, {} sent",
        "Transfer:".dimmed(),
        human_bytes(peer.transfer_rx),
        human_bytes(peer.transfer_tx)
    );
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Compare configured peers with the live interface.
pub async fn run_reconcile(context: &Context, interface: &str, json: bool) -> Result<()> {
    let report = context.reconciler().reconcile(interface).await?;
    if json {
        return print_json(&report);
    }

    let label = match report.status {
        InterfaceStatus::InSync => "OK".green().bold(),
        InterfaceStatus::MinorDrift => "DRIFT".yellow().bold(),
        InterfaceStatus::OutOfSync => "OUT OF SYNC".red().bold(),
        InterfaceStatus::Inactive => "INACTIVE".dimmed().bold(),
        InterfaceStatus::Unavailable => "UNAVAILABLE".red().bold(),
    };
    println!(
        "{} {} is {} ({} configured peers, {} live)",
        label,
        interface.cyan(),
        report.status,
        report.configured.len(),
        report.live.len()
    );

    if let Some(error) = &report.live_error {
        println!("  {} {}", "!".red(), error);
    }
    if !report.peers.is_empty() {
        println!();
        print_peer_diffs(&report.peers, "configured", "live");
    }
    Ok(())
}
