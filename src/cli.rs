use clap::{Parser, Subcommand};

/// Gatehouse — remote-login token service for managed hosting
#[derive(Parser)]
#[command(name = "gatehouse", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the login service
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8443")]
        port: u16,
    },

    /// Issue a one-time remote-login secret for an account
    Login {
        /// Email address of the account to log in as
        #[arg(long)]
        email: String,
    },

    /// Manage the account directory
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Register a new account
    Add {
        #[arg(long)]
        email: String,
        /// Display name, shown in listings only
        #[arg(long)]
        name: Option<String>,
    },
    /// List registered accounts
    List,
}
