//! Settings commands

use colored::Colorize;
use wgsync_core::Settings;

use super::print_json;
use crate::context::Context;
use crate::error::{CliError, Result};

/// Print the effective settings, overrides applied.
pub fn run_config_show(context: &Context, json: bool) -> Result<()> {
    let settings = &context.settings;
    if json {
        return print_json(settings);
    }

    let source = if context.settings_path.is_file() {
        context.settings_path.as_str().yellow()
    } else {
        "(defaults)".dimmed()
    };
    println!("{} {}", "Settings".bold(), source);
    println!();
    println!("  {:<20} {}", "base_dir:".dimmed(), settings.base_dir);
    println!("  {:<20} {}", "wg_binary:".dimmed(), settings.wireguard.wg_binary);
    println!("  {:<20} {}", "wg_quick_binary:".dimmed(), settings.wireguard.wg_quick_binary);
    println!("  {:<20} {}s", "query_timeout:".dimmed(), settings.wireguard.query_timeout_secs);
    println!("  {:<20} {}ms", "lock_timeout:".dimmed(), settings.sync.lock_timeout_ms);
    println!(
        "  {:<20} {}",
        "reconcile_source:".dimmed(),
        serde_json::to_value(settings.sync.reconcile_source)?
            .as_str()
            .unwrap_or_default()
    );
    println!("  {:<20} {}", "log level:".dimmed(), settings.logging.level);
    Ok(())
}

/// Write a settings file holding every default.
pub fn run_config_init(context: &Context, force: bool) -> Result<()> {
    let path = &context.settings_path;
    if path.exists() && !force {
        return Err(CliError::user(format!(
            "{} already exists; pass --force to overwrite",
            path
        )));
    }

    Settings::default().save(path)?;
    println!("{} Wrote {}", "OK".green().bold(), path.as_str().yellow());
    Ok(())
}
