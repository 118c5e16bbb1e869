use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One sync pass, then exit.
    Manual,
    /// Follow the chain head over websocket and sync on every new block.
    Automatic,
}

#[derive(Debug, Clone)]
pub struct SyncArgs {
    pub workers_count: usize,
    /// Max block numbers per worker job, and max items per RPC batch.
    pub step: usize,
    pub call_timeout: Duration,
    pub mode: Mode,
    /// Head distance above the checkpoint before verification kicks in.
    pub checkpoint_window: u64,
    /// Blocks below the head left out of verification; they are still
    /// young enough to reorg.
    pub checkpoint_distance: u64,
    pub include_logs: bool,
    pub include_nfts: bool,
}
