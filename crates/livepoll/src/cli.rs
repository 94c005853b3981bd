//! CLI argument parsing.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "livepoll")]
#[command(about = "Live poll client: vote, run polls, save poll drafts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Join a poll as a voter
    Join {
        /// Invite id from the poll link
        #[arg(value_name = "POLL_ID")]
        poll_id: String,
    },

    /// Open the control panel for a poll
    Admin {
        #[arg(value_name = "POLL_ID")]
        poll_id: String,
    },

    /// Create or update a poll from a JSON draft
    Save {
        /// Draft file (`~` is expanded)
        #[arg(value_name = "FILE")]
        path: String,
    },
}
