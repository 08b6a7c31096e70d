//! Interface management commands

use colored::Colorize;
use wgsync_core::{InterfaceRecord, InterfaceUpdate, NewInterface};

use super::print_json;
use crate::cli::InterfaceAction;
use crate::context::Context;
use crate::error::{CliError, Result};

pub fn run_interface(context: &Context, action: InterfaceAction) -> Result<()> {
    let manager = context.interfaces();
    match action {
        InterfaceAction::List { json } => {
            let interfaces = manager.list()?;
            if json {
                return print_json(&interfaces);
            }
            if interfaces.is_empty() {
                println!(
                    "No managed interfaces under {}.",
                    context.settings.base_dir.yellow()
                );
                return Ok(());
            }
            for interface in &interfaces {
                println!(
                    "  {} {:<16} {}",
                    "*".green(),
                    interface.name.bold(),
                    interface.address.as_deref().unwrap_or("").dimmed()
                );
            }
            Ok(())
        }
        InterfaceAction::Create {
            name,
            address,
            listen_port,
            dns,
        } => {
            let record = manager.create(NewInterface {
                name,
                address,
                listen_port,
                dns,
            })?;
            println!("{} Created interface {}", "OK".green().bold(), record.name.cyan());
            print_interface(&record);
            println!();
            println!("Run {} to write the merged config.", format!("wgsync apply {}", record.name).cyan());
            Ok(())
        }
        InterfaceAction::Show { name, json } => {
            let record = manager.show(&name)?;
            if json {
                return print_json(&record);
            }
            print_interface(&record);
            Ok(())
        }
        InterfaceAction::Update {
            name,
            address,
            listen_port,
            dns,
            post_up,
            post_down,
        } => {
            let update = InterfaceUpdate {
                address,
                listen_port,
                dns,
                post_up,
                post_down,
            };
            if update.is_empty() {
                return Err(CliError::user("Nothing to update; pass at least one field option"));
            }
            let record = manager.update(&name, update)?;
            println!("{} Updated interface {}", "OK".green().bold(), record.name.cyan());
            print_interface(&record);
            Ok(())
        }
        InterfaceAction::Delete { name } => {
            manager.delete(&name)?;
            println!(
                "{} Deleted managed folder of {} (merged config left in place)",
                "OK".green().bold(),
                name.cyan()
            );
            Ok(())
        }
    }
}

fn print_interface(record: &InterfaceRecord) {
    println!("{}", format!("[{}]", record.name).bold());
    let fields = [
        ("Address", record.address.as_deref()),
        ("ListenPort", record.listen_port.as_deref()),
        ("PublicKey", record.public_key.as_deref()),
        ("DNS", record.dns.as_deref()),
        ("PostUp", record.post_up.as_deref()),
        ("PostDown", record.post_down.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {:<12} {}", format!("{}:", label).dimmed(), value);
        }
    }
    for (key, value) in &record.extra {
        println!("  {:<12} {}", format!("{}:", key).dimmed(), value);
    }
}
