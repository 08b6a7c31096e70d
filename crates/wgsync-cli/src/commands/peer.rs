//! Peer management commands

use colored::Colorize;
use wgsync_core::{NewPeer, PeerRecord, PeerUpdate};

use super::print_json;
use crate::cli::PeerAction;
use crate::context::Context;
use crate::error::{CliError, Result};

pub fn run_peer(context: &Context, action: PeerAction) -> Result<()> {
    let manager = context.peers();
    match action {
        PeerAction::List { interface, json } => {
            let peers = manager.list(&interface)?;
            if json {
                return print_json(&peers);
            }
            if peers.is_empty() {
                println!("{} has no peers.", interface.cyan());
                return Ok(());
            }
            for peer in &peers {
                println!(
                    "  {} {:<20} {} {}",
                    "*".green(),
                    peer.name.as_deref().unwrap_or("").bold(),
                    peer.allowed_ips,
                    peer.public_key.dimmed()
                );
            }
            Ok(())
        }
        PeerAction::Add {
            interface,
            name,
            allowed_ips,
            endpoint,
            keepalive,
            public_key,
        } => {
            let peer = manager.add(
                &interface,
                NewPeer {
                    name,
                    allowed_ips,
                    endpoint,
                    persistent_keepalive: keepalive,
                    public_key,
                },
            )?;
            println!(
                "{} Added peer {} to {}",
                "OK".green().bold(),
                peer.name.as_deref().unwrap_or("").cyan(),
                interface.cyan()
            );
            print_peer(&peer);
            Ok(())
        }
        PeerAction::Show {
            interface,
            name,
            json,
        } => {
            let peer = manager.show(&interface, &name)?;
            if json {
                return print_json(&peer);
            }
            print_peer(&peer);
            Ok(())
        }
        PeerAction::Update {
            interface,
            name,
            allowed_ips,
            endpoint,
            keepalive,
            public_key,
        } => {
            let update = PeerUpdate {
                allowed_ips,
                endpoint,
                persistent_keepalive: keepalive,
                public_key,
            };
            if update.is_empty() {
                return Err(CliError::user("Nothing to update; pass at least one field option"));
            }
            let peer = manager.update(&interface, &name, update)?;
            println!("{} Updated peer {}", "OK".green().bold(), name.cyan());
            print_peer(&peer);
            Ok(())
        }
        PeerAction::Delete { interface, name } => {
            manager.delete(&interface, &name)?;
            println!("{} Deleted peer {} from {}", "OK".green().bold(), name.cyan(), interface.cyan());
            Ok(())
        }
    }
}

fn print_peer(peer: &PeerRecord) {
    println!("{}", format!("[{}]", peer.name.as_deref().unwrap_or("peer")).bold());
    let key_source = if peer.private_key.is_some() {
        "server-generated"
    } else {
        "self-managed"
    };
    let fields = [
        ("PublicKey", Some(peer.public_key.as_str())),
        ("Keys", Some(key_source)),
        ("AllowedIPs", Some(peer.allowed_ips.as_str())),
        ("Endpoint", peer.endpoint.as_deref()),
        ("Keepalive", peer.persistent_keepalive.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            println!("  {:<12} {}", format!("{}:", label).dimmed(), value);
        }
    }
}
