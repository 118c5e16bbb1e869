use std::sync::Arc;
use std::time::Duration;

use chain::rpc::NodeClient;
use chain::utils::to_u64;
use eyre::{Result, eyre};
use store::adapter;
use store::model::BlockBundle;
use tokio_util::sync::CancellationToken;

use crate::args::SyncArgs;
use crate::nft::decode;
use crate::nft::resolver::MetadataResolver;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Fetches one batch of block numbers and everything derived from them.
///
/// The node is retried until it serves a well-formed response, bounded
/// only by cancellation; a block number handed to a job is missing from
/// the store, so giving up on it would leave a permanent gap. Individual
/// items that fail conversion are logged and skipped instead, since the
/// next pass re-detects them as missing.
pub async fn fetch_batch(
    client: Arc<NodeClient>,
    numbers: Vec<u64>,
    args: SyncArgs,
    resolver: Option<MetadataResolver>,
    token: CancellationToken,
) -> Result<BlockBundle> {
    if numbers.is_empty() {
        return Ok(BlockBundle::default());
    }

    let responses = loop {
        if token.is_cancelled() {
            return Err(eyre!("batch cancelled"));
        }

        match client.blocks_by_number(&numbers, args.call_timeout).await {
            Ok(responses) if responses.first().is_some_and(Option::is_some) => break responses,
            Ok(_) => tracing::debug!("Blocks {:?}.. not yet served, retrying", numbers.first()),
            Err(e) => tracing::warn!("Block batch failed, retrying: {e:?}"),
        }

        tokio::time::sleep(RETRY_BACKOFF).await;
    };

    let mut bundle = BlockBundle::default();
    let mut timestamps = std::collections::HashMap::new();
    let mut hashes = Vec::new();

    for (number, response) in numbers.iter().zip(responses) {
        let Some(block) = response else {
            tracing::warn!("Block {number} missing from batch response, skipping");
            continue;
        };

        timestamps.insert(block.hash.clone(), to_u64(&block.timestamp) as i64);
        hashes.extend(block.transactions.iter().cloned());
        bundle.blocks.push(adapter::block_row(&block));
    }

    if hashes.is_empty() {
        return Ok(bundle);
    }

    let pairs = loop {
        if token.is_cancelled() {
            return Err(eyre!("batch cancelled"));
        }

        match client.transactions_with_receipts(&hashes, args.call_timeout).await {
            Ok(pairs) if pairs.first().is_some_and(|(tx, _)| tx.is_some()) => break pairs,
            Ok(_) => tracing::debug!("Transactions not yet served, retrying"),
            Err(e) => tracing::warn!("Transaction batch failed, retrying: {e:?}"),
        }

        tokio::time::sleep(RETRY_BACKOFF).await;
    };

    let mut receipt_logs = Vec::new();

    for (hash, (transaction, receipt)) in hashes.iter().zip(pairs) {
        let (Some(transaction), Some(receipt)) = (transaction, receipt) else {
            tracing::warn!("Transaction {hash} incomplete in batch response, skipping");
            continue;
        };

        let timestamp = timestamps.get(&transaction.block_hash).copied().unwrap_or_default();
        match adapter::transaction_row(&transaction, &receipt, timestamp) {
            Ok(row) => bundle.transactions.push(row),
            Err(e) => {
                tracing::error!("Skip: inconsistent transaction {hash}: {e:?}");
                continue;
            }
        }

        if let Some(contract) = adapter::contract_row(&receipt) {
            bundle.contracts.push(contract);
        }

        if args.include_logs {
            for log in &receipt.logs {
                match adapter::log_row(log, &receipt) {
                    Ok(row) => bundle.logs.push(row),
                    Err(e) => tracing::error!("Skip: inconsistent log in {hash}: {e:?}"),
                }
            }
        }

        if args.include_nfts {
            receipt_logs.extend(receipt.logs.iter().cloned());
        }
    }

    if args.include_nfts {
        bundle.nft_transfers = decode::nft_transfers(&receipt_logs)?;

        if let Some(resolver) = &resolver {
            resolver.admit(&bundle.nft_transfers).await;
        }
    }

    Ok(bundle)
}
