mod cli {
    pub mod args;
    pub mod cmd;
    pub mod run;
}

use clap::Parser;
use eyre::Result;

use crate::cli::cmd::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // install global subscriber configured based on RUST_LOG envvar.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Sync(args) => {
            tracing::info!("Sync Command: {args:?}");
            cli::run::start(args).await
        }
    }
}
