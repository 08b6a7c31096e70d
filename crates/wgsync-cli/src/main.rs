//! wgsync CLI
//!
//! Manages WireGuard interfaces as a folder of per-peer files, merges them
//! into the config `wg-quick` reads, and compares the result with the running
//! interface.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, ConfigAction};
use context::Context;
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("{} WireGuard config sync", "wgsync".green().bold());
        println!();
        println!("Run {} for available commands.", "wgsync --help".cyan());
        return Ok(());
    };

    let context = Context::load(cli.config.as_deref(), cli.base_dir.as_deref())?;
    logging::init(cli.verbose, &context.settings.logging.level);
    tracing::debug!(?command, "dispatching");

    execute_command(command, &context).await
}

async fn execute_command(cmd: Commands, context: &Context) -> Result<()> {
    match cmd {
        Commands::Interface { action } => commands::run_interface(context, action),
        Commands::Peer { action } => commands::run_peer(context, action),
        Commands::Diff { interface, json } => commands::run_diff(context, &interface, json),
        Commands::Apply {
            interface,
            dry_run,
            json,
        } => commands::run_apply(context, &interface, dry_run, json).await,
        Commands::Reset {
            interface,
            dry_run,
            json,
        } => commands::run_reset(context, &interface, dry_run, json),
        Commands::State { interface, json } => commands::run_state(context, &interface, json).await,
        Commands::Reconcile { interface, json } => {
            commands::run_reconcile(context, &interface, json).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => commands::run_config_show(context, json),
            ConfigAction::Init { force } => commands::run_config_init(context, force),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cli::{InterfaceAction, PeerAction};
    use tempfile::TempDir;
    use wgsync_test_utils::TestWireGuard;

    fn context(wg: &TestWireGuard) -> Context {
        let missing = wg.path("absent-settings.toml");
        Context::load(Some(&missing), Some(wg.root())).unwrap()
    }

    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[tokio::test]
    async fn test_create_add_apply() {
        let wg = TestWireGuard::new();
        let context = context(&wg);

        execute_command(
            Commands::Interface {
                action: InterfaceAction::Create {
                    name: "wg0".into(),
                    address: None,
                    listen_port: None,
                    dns: None,
                },
            },
            &context,
        )
        .await
        .unwrap();
        execute_command(
            Commands::Peer {
                action: PeerAction::Add {
                    interface: "wg0".into(),
                    name: "laptop".into(),
                    allowed_ips: None,
                    endpoint: None,
                    keepalive: Some("25".into()),
                    public_key: None,
                },
            },
            &context,
        )
        .await
        .unwrap();
        execute_command(
            Commands::Apply {
                interface: "wg0".into(),
                dry_run: true,
                json: true,
            },
            &context,
        )
        .await
        .unwrap();

        wg.assert_file_exists("wg0/laptop.conf");
        wg.assert_file_not_exists("wg0.conf");
    }

    #[tokio::test]
    async fn test_reset_missing_merged_config_fails() {
        let wg = TestWireGuard::new();
        let context = context(&wg);

        let result = execute_command(
            Commands::Reset {
                interface: "wg0".into(),
                dry_run: false,
                json: false,
            },
            &context,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wgsync.toml");
        let context = Context::load(Some(&path), None).unwrap();

        execute_command(Commands::Config { action: ConfigAction::Init { force: false } }, &context)
            .await
            .unwrap();
        assert!(path.exists());

        let again =
            execute_command(Commands::Config { action: ConfigAction::Init { force: false } }, &context).await;
        assert!(again.is_err());

        execute_command(Commands::Config { action: ConfigAction::Init { force: true } }, &context)
            .await
            .unwrap();
    }
}
