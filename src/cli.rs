//! CLI struct definitions for the sshca command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "sshca",
    version = env!("CARGO_PKG_VERSION"),
    about = "An SSH CA bot that publishes how to reach it into every team it serves, and the client side that finds it again."
)]
pub(crate) struct Cli {
    /// Load configuration from FILE (defaults to ~/.config/sshca/config.toml).
    #[clap(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Used in the integration tests to clean all client configs from the store.
    #[clap(long, hide = true)]
    pub wipe_all_configs: bool,
    /// Used in the integration tests to delete the CA log.
    #[clap(long, hide = true)]
    pub wipe_logs: bool,
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Print the current CA private key to stdout for backup purposes
    Backup,
    /// Generate a new CA key
    Generate {
        #[clap(long)]
        overwrite_existing_key: bool,
    },
    /// Start the CA service in the foreground
    Service,
    /// List every CA bot published in the shared store
    Discover {
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Print the client config of the bot this machine should use
    Select {
        /// Team whose bot to use; overrides the default team.
        #[clap(long)]
        team: Option<String>,
    },
    /// Remember which team's bot to use when several teams run one
    SetDefaultTeam {
        team: String,
    },
    /// Show the remembered default team
    DefaultTeam,
}
