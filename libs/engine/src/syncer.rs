use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chain::rpc::NodeClient;
use chain::utils::to_u64;
use eyre::{Result, eyre};
use store::model::{BlockBundle, BlockRef};
use store::store::Store;
use tokio_util::sync::CancellationToken;
use workers::job::Job;
use workers::pool::WorkerPool;

use crate::args::{Mode, SyncArgs};
use crate::checkpoint::{WindowVerdict, validate_window};
use crate::gap;
use crate::job::fetch_batch;
use crate::nft::resolver::MetadataResolver;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Drives one synchronization pass at a time: finds the blocks missing
/// between the checkpoint and the chain head, fans them out to a fresh
/// worker pool, persists whatever the workers report, then verifies the
/// checkpoint window against the node.
///
/// The checkpoint lives in memory only. Restarting from the configured
/// value is safe because already-persisted blocks are skipped by gap
/// detection.
pub struct Syncer {
    client: Arc<NodeClient>,
    store: Store,
    args: SyncArgs,
    checkpoint: AtomicU64,
    resolver: Option<MetadataResolver>,
}

impl Syncer {
    pub fn new(
        client: Arc<NodeClient>,
        store: Store,
        args: SyncArgs,
        checkpoint: u64,
        resolver: Option<MetadataResolver>,
    ) -> Self {
        Self { client, store, args, checkpoint: AtomicU64::new(checkpoint), resolver }
    }

    pub fn checkpoint(&self) -> u64 {
        self.checkpoint.load(Ordering::SeqCst)
    }

    pub async fn sync_missing_blocks(&self) -> Result<()> {
        let started = Instant::now();
        tracing::info!("Synchronization started");

        let head = self.latest_block_number().await;
        let checkpoint = self.checkpoint();

        let persisted: Vec<u64> = self
            .store
            .block_numbers_from(checkpoint as i64)
            .await?
            .into_iter()
            .map(|number| number as u64)
            .collect();

        let missing = gap::find_missing_blocks(head, &persisted, checkpoint);
        if missing.is_empty() {
            tracing::info!("Nothing to sync below head {head}");
        } else {
            tracing::info!("Syncing {} missing blocks below head {head}", missing.len());
            self.run_batches(&missing).await?;
        }

        if self.args.mode == Mode::Automatic
            && head.saturating_sub(self.checkpoint()) > self.args.checkpoint_window
        {
            if let Err(e) = self.validate_checkpoint(head).await {
                tracing::error!("Checkpoint validation failed: {e:?}");
            }
        }

        tracing::info!("Synchronization DONE in {:?}", started.elapsed());
        Ok(())
    }

    async fn run_batches(&self, missing: &[u64]) -> Result<()> {
        let batches = gap::partition(missing, self.args.step);
        let expected = batches.len();

        let token = CancellationToken::new();
        let mut pool: WorkerPool<BlockBundle> = WorkerPool::new(self.args.workers_count);
        let mut results = pool.results().ok_or_else(|| eyre!("results already taken"))?;

        let jobs: Vec<Job<BlockBundle>> = batches
            .into_iter()
            .map(|numbers| {
                let client = Arc::clone(&self.client);
                let args = self.args.clone();
                let resolver = self.resolver.clone();
                let token = token.clone();
                Job::new(move || fetch_batch(client, numbers, args, resolver, token))
            })
            .collect();

        let submitted = pool.submit(jobs);
        let done = pool.run(token);

        // a failed batch is dropped here; the next pass re-detects its
        // blocks as missing and fetches them again
        let mut reported = 0;
        while let Some(outcome) = results.recv().await {
            reported += 1;
            match outcome {
                Ok(bundle) => {
                    if let Err(e) = self.store.insert_batch(&bundle).await {
                        tracing::error!("Failed to persist batch: {e:?}");
                    }
                }
                Err(e) => tracing::error!("Batch job failed: {e:?}"),
            }
        }

        let _ = done.await;
        let _ = submitted.await;

        if reported != expected {
            tracing::warn!("Expected {expected} batch reports, received {reported}");
        }

        Ok(())
    }

    /// Compares the persisted window above the checkpoint with the
    /// node's view of the same numbers. A clean window advances the
    /// checkpoint; any disagreement deletes the whole window so the
    /// next pass re-syncs it from scratch.
    async fn validate_checkpoint(&self, head: u64) -> Result<()> {
        let checkpoint = self.checkpoint();
        let upper = head.saturating_sub(self.args.checkpoint_distance);

        let db_refs = self
            .store
            .block_refs_in(checkpoint as i64, upper as i64, self.args.checkpoint_window as i64)
            .await?;
        if db_refs.len() <= 1 {
            return Ok(());
        }

        let numbers: Vec<u64> = db_refs.iter().map(|r| r.number as u64).collect();
        let chain_refs = self.chain_refs(&numbers).await;

        match validate_window(&db_refs, &chain_refs, checkpoint) {
            WindowVerdict::Rollback => {
                tracing::warn!(
                    "Reorg within blocks {:?}..{:?}, rolling the window back",
                    numbers.first(),
                    numbers.last()
                );
                let window: Vec<i64> = db_refs.iter().map(|r| r.number).collect();
                self.store.delete_blocks(&window).await?;
            }
            WindowVerdict::Advance(next) => {
                tracing::info!("Checkpoint advanced from {checkpoint} to {next}");
                self.checkpoint.store(next, Ordering::SeqCst);
            }
        }

        Ok(())
    }

    async fn chain_refs(&self, numbers: &[u64]) -> Vec<BlockRef> {
        let responses = loop {
            match self.client.blocks_by_number(numbers, self.args.call_timeout).await {
                Ok(responses) if responses.first().is_some_and(Option::is_some) => break responses,
                Ok(_) => tracing::debug!("Verification window not served yet, retrying"),
                Err(e) => tracing::warn!("Verification fetch failed, retrying: {e:?}"),
            }
            tokio::time::sleep(RETRY_BACKOFF).await;
        };

        responses
            .into_iter()
            .flatten()
            .map(|block| BlockRef { number: to_u64(&block.number) as i64, hash: block.hash })
            .collect()
    }

    async fn latest_block_number(&self) -> u64 {
        loop {
            match self.client.latest_block(self.args.call_timeout).await {
                Ok(Some(block)) if !block.number.is_empty() => return to_u64(&block.number),
                Ok(_) => tracing::debug!("Latest block not well formed yet, retrying"),
                Err(e) => tracing::warn!("Latest block lookup failed, retrying: {e:?}"),
            }
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
    }
}
