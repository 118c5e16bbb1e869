use clap::{Parser, ValueEnum};
use engine::args::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliMode {
    /// Run one sync pass and exit
    Manual,
    /// Keep syncing on every new chain head
    Automatic,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Manual => Mode::Manual,
            CliMode::Automatic => Mode::Automatic,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Start the chain indexer", long_about = None)]
pub struct Args {
    /// Node HTTP endpoint
    #[arg(long, env = "HTTP_URL")]
    pub http_url: String,

    /// Node websocket endpoint, required in automatic mode
    #[arg(long, env = "WS_URL")]
    pub ws_url: Option<String>,

    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://explorer.db")]
    pub db_url: String,

    #[arg(long, env = "MODE", value_enum, default_value_t = CliMode::Manual)]
    pub mode: CliMode,

    /// Concurrent block-fetching workers
    #[arg(long, env = "WORKERS_COUNT", default_value_t = 32)]
    pub workers_count: usize,

    /// Block numbers per worker batch
    #[arg(long, env = "STEP", default_value_t = 1000)]
    pub step: usize,

    /// Per-RPC-call timeout in seconds
    #[arg(long, env = "CALL_TIMEOUT_IN_SECONDS", default_value_t = 10)]
    pub call_timeout: u64,

    /// Block number to start syncing from
    #[arg(long, env = "CHECKPOINT", default_value_t = 0)]
    pub checkpoint: u64,

    /// Head distance above the checkpoint before verification runs
    #[arg(long, env = "CHECKPOINT_WINDOW", default_value_t = 1000)]
    pub checkpoint_window: u64,

    /// Youngest blocks left out of verification
    #[arg(long, env = "CHECKPOINT_DISTANCE", default_value_t = 16)]
    pub checkpoint_distance: u64,

    /// Persist receipt logs
    #[arg(long, default_value_t = false)]
    pub include_logs: bool,

    /// Track NFT transfers and resolve their metadata
    #[arg(long, default_value_t = false)]
    pub include_nfts: bool,

    /// Gateway prefix for ipfs:// token URIs
    #[arg(long, env = "IPFS_GATEWAY", default_value = "https://ipfs.io/ipfs/")]
    pub ipfs_gateway: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_mode_maps_onto_engine_mode() {
        assert_eq!(Mode::from(CliMode::Manual), Mode::Manual);
        assert_eq!(Mode::from(CliMode::Automatic), Mode::Automatic);
    }
}
