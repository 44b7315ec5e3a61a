use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paytrack-core")]
#[command(about = "Payment lifecycle & reconciliation engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server and the reminder scheduler (default)
    Serve,

    /// Import a bank extract CSV and run one reconciliation pass
    Reconcile {
        /// Path to the CSV extract
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Run one reminder scan and exit
    Remind,

    /// Validate configuration and exit
    Config,
}
