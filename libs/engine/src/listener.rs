use std::sync::Arc;
use std::time::Duration;

use chain::rpc::NodeClient;
use eyre::Result;
use futures_util::StreamExt;

use crate::signal::SyncGate;
use crate::syncer::Syncer;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Follows `newHeads` and triggers a sync pass per head, single-flight.
///
/// A head arriving while a pass is running is dropped, not queued; the
/// running pass syncs up to the latest head anyway. The subscription is
/// re-established whenever the stream ends or fails to open.
pub async fn listen_for_new_blocks(
    client: Arc<NodeClient>,
    syncer: Arc<Syncer>,
    gate: Arc<SyncGate>,
) -> Result<()> {
    // prime the single permit so the first head starts a pass
    gate.finish();

    loop {
        let mut heads = match client.subscribe_heads().await {
            Ok(heads) => heads,
            Err(e) => {
                tracing::error!("Head subscription failed, reconnecting: {e:?}");
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }
        };

        while let Some(header) = heads.next().await {
            tracing::info!("New block: {}", header.number);

            if !gate.try_start() {
                continue;
            }

            let syncer = Arc::clone(&syncer);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                if let Err(e) = syncer.sync_missing_blocks().await {
                    tracing::error!("Sync pass failed: {e:?}");
                }
                gate.finish();
            });
        }

        tracing::warn!("Head subscription ended, reconnecting");
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}
