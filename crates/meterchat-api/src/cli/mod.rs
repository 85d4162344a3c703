//! CLI command definitions for the `mchat` binary.
//!
//! `serve` runs the relay; `user` and `sessions` are operator commands that
//! work directly against the database.

pub mod sessions;
pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Per-user metered chat relay.
#[derive(Parser)]
#[command(name = "mchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP relay.
    Serve {
        /// Port to listen on (overrides config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Also export tracing spans through OpenTelemetry (stdout).
        #[arg(long)]
        otel: bool,
    },

    /// Manage users and their token balances.
    User {
        #[command(subcommand)]
        action: user::UserCommand,
    },

    /// Manage stored sessions.
    Sessions {
        #[command(subcommand)]
        action: sessions::SessionsCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
