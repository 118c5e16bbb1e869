use std::sync::Arc;

use store::model::ResolvedMetadata;
use store::store::Store;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::nft::dictionary::MetadataDictionary;

/// Single writer for resolved metadata. Resolution tasks never touch
/// the metadata tables directly; they send here and this task commits.
/// The in-flight keys are released even when the insert fails, so a
/// later mint of the same token gets another chance.
pub fn spawn_metadata_drain(
    store: Store,
    dictionary: Arc<MetadataDictionary>,
    mut commits: mpsc::Receiver<Vec<ResolvedMetadata>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(resolved) = commits.recv().await {
            if let Err(e) = store.insert_nft_metadata(&resolved).await {
                tracing::error!("Failed to persist {} metadata rows: {e:?}", resolved.len());
            }

            let keys: Vec<String> = resolved
                .iter()
                .map(|item| format!("{}-{}", item.metadata.token_id, item.metadata.address))
                .collect();
            dictionary.try_remove_range(&keys).await;
        }
    })
}
