//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// wgsync - Keep WireGuard managed folders, merged configs and live state in step
#[derive(Parser, Debug)]
#[command(name = "wgsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "WGSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// WireGuard base directory, overriding the settings file
    #[arg(long, global = true, env = "WGSYNC_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Manage interfaces
    Interface {
        #[command(subcommand)]
        action: InterfaceAction,
    },

    /// Manage peers of an interface
    Peer {
        #[command(subcommand)]
        action: PeerAction,
    },

    /// Preview what apply would change
    Diff {
        interface: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Merge the managed folder into <iface>.conf and reload the interface
    ///
    /// Examples:
    ///   wgsync apply wg0              # Write and reload
    ///   wgsync apply wg0 --dry-run    # Show the pending diff only
    Apply {
        interface: String,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Split <iface>.conf back into the managed folder
    ///
    /// Peers keep the file name they matched; new peers become peer<N>.
    Reset {
        interface: String,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the live state reported by `wg show`
    State {
        interface: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Compare configured peers with the live interface
    Reconcile {
        interface: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show or initialize settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Interface management actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum InterfaceAction {
    /// List managed interfaces
    List {
        #[arg(long)]
        json: bool,
    },

    /// Create a managed interface with a fresh key pair
    Create {
        name: String,

        /// Interface address, e.g. 10.0.0.1/24
        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        listen_port: Option<u16>,

        #[arg(long)]
        dns: Option<String>,
    },

    /// Show one interface
    Show {
        name: String,

        #[arg(long)]
        json: bool,
    },

    /// Change interface fields (pass an empty value to clear one)
    Update {
        name: String,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        listen_port: Option<String>,

        #[arg(long)]
        dns: Option<String>,

        #[arg(long)]
        post_up: Option<String>,

        #[arg(long)]
        post_down: Option<String>,
    },

    /// Delete the managed folder (the merged config is kept)
    Delete { name: String },
}

/// Peer management actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PeerAction {
    /// List peers of an interface
    List {
        interface: String,

        #[arg(long)]
        json: bool,
    },

    /// Add a peer
    ///
    /// Without --public-key a key pair is generated and kept in the peer file.
    Add {
        interface: String,
        name: String,

        /// Comma-separated CIDRs, default 10.0.0.2/32
        #[arg(long)]
        allowed_ips: Option<String>,

        #[arg(long)]
        endpoint: Option<String>,

        /// Persistent keepalive in seconds
        #[arg(long)]
        keepalive: Option<String>,

        /// The peer's own public key
        #[arg(long)]
        public_key: Option<String>,
    },

    /// Show one peer
    Show {
        interface: String,
        name: String,

        #[arg(long)]
        json: bool,
    },

    /// Change peer fields (pass an empty value to clear one)
    Update {
        interface: String,
        name: String,

        #[arg(long)]
        allowed_ips: Option<String>,

        #[arg(long)]
        endpoint: Option<String>,

        #[arg(long)]
        keepalive: Option<String>,

        /// Re-key the peer; drops any stored private key
        #[arg(long)]
        public_key: Option<String>,
    },

    /// Delete a peer file
    Delete { interface: String, name: String },
}

/// Settings actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective settings
    Show {
        #[arg(long)]
        json: bool,
    },

    /// Write a settings file with every default
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from(["wgsync"]);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["wgsync", "diff", "wg0", "-v", "--base-dir", "/tmp/wg"]);
        assert!(cli.verbose);
        assert_eq!(cli.base_dir, Some(PathBuf::from("/tmp/wg")));
        assert_eq!(
            cli.command,
            Some(Commands::Diff {
                interface: "wg0".into(),
                json: false,
            })
        );
    }

    #[test]
    fn parse_apply_dry_run() {
        let cli = Cli::parse_from(["wgsync", "apply", "wg0", "--dry-run", "--json"]);
        assert_eq!(
            cli.command,
            Some(Commands::Apply {
                interface: "wg0".into(),
                dry_run: true,
                json: true,
            })
        );
    }

    #[test]
    fn parse_peer_add() {
        let cli = Cli::parse_from([
            "wgsync",
            "peer",
            "add",
            "wg0",
            "laptop",
            "--allowed-ips",
            "10.0.0.2/32",
            "--keepalive",
            "25",
        ]);
        match cli.command {
            Some(Commands::Peer {
                action:
                    PeerAction::Add {
                        interface,
                        name,
                        allowed_ips,
                        keepalive,
                        public_key,
                        ..
                    },
            }) => {
                assert_eq!(interface, "wg0");
                assert_eq!(name, "laptop");
                assert_eq!(allowed_ips.as_deref(), Some("10.0.0.2/32"));
                assert_eq!(keepalive.as_deref(), Some("25"));
                assert_eq!(public_key, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_interface_create_port() {
        let cli = Cli::parse_from(["wgsync", "interface", "create", "wg1", "--listen-port", "51821"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Interface {
                action: InterfaceAction::Create {
                    listen_port: Some(51821),
                    ..
                }
            })
        ));
    }

    #[test]
    fn rejects_out_of_range_port() {
        let result = Cli::try_parse_from(["wgsync", "interface", "create", "wg1", "--listen-port", "70000"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_config_init_force() {
        let cli = Cli::parse_from(["wgsync", "config", "init", "--force"]);
        assert_eq!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Init { force: true }
            })
        );
    }
}
