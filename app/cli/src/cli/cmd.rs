use clap::{Parser, Subcommand};

use super::args::Args;

#[derive(Parser, Debug)]
#[command(name = "chain-explorer")]
#[command(about = "CLI tool for the chain indexer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sync the chain into the local database
    Sync(Args),
}
