//! Command-line interface for QuickCheck.

pub mod commands;

use clap::{Parser, Subcommand};

/// QuickCheck - loan applications with rule-based fraud screening
#[derive(Debug, Parser)]
#[command(name = "quickcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Override `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create a staff superuser that receives fraud alerts
    #[command(name = "create-superuser", alias = "createsuperuser")]
    CreateSuperuser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long, env = "QUICKCHECK_SUPERUSER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}
