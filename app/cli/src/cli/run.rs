use std::sync::Arc;
use std::time::Duration;

use chain::rpc::NodeClient;
use engine::args::{Mode, SyncArgs};
use engine::listener::listen_for_new_blocks;
use engine::nft::dictionary::MetadataDictionary;
use engine::nft::drain::spawn_metadata_drain;
use engine::nft::resolver::{MetadataResolver, ResolverArgs};
use engine::signal::SyncGate;
use engine::syncer::Syncer;
use eyre::{Result, eyre};
use store::client::Client;
use store::store::Store;
use tokio::sync::mpsc;

use super::args::Args;

const METADATA_COMMIT_BUFFER: usize = 64;

pub async fn start(args: Args) -> Result<()> {
    let mode = Mode::from(args.mode);

    if mode == Mode::Automatic && args.ws_url.is_none() {
        return Err(eyre!("automatic mode needs a websocket endpoint (--ws-url / WS_URL)"));
    }

    let client = Client::init(&args.db_url).await?;
    let store = Store::new(client);
    let node = Arc::new(NodeClient::new(&args.http_url, args.ws_url.clone())?);

    let sync_args = SyncArgs {
        workers_count: args.workers_count,
        step: args.step,
        call_timeout: Duration::from_secs(args.call_timeout),
        mode,
        checkpoint_window: args.checkpoint_window,
        checkpoint_distance: args.checkpoint_distance,
        include_logs: args.include_logs,
        include_nfts: args.include_nfts,
    };

    let mut resolver = None;
    let mut drain = None;
    if args.include_nfts {
        let dictionary = Arc::new(MetadataDictionary::new());
        let (commits_tx, commits_rx) = mpsc::channel(METADATA_COMMIT_BUFFER);

        resolver = Some(MetadataResolver::new(
            Arc::clone(&node),
            store.clone(),
            Arc::clone(&dictionary),
            commits_tx,
            ResolverArgs {
                call_timeout: sync_args.call_timeout,
                step: args.step,
                ipfs_gateway: args.ipfs_gateway.clone(),
            },
        )?);
        drain = Some(spawn_metadata_drain(store.clone(), dictionary, commits_rx));
    }

    let syncer =
        Arc::new(Syncer::new(Arc::clone(&node), store, sync_args, args.checkpoint, resolver.clone()));

    tracing::info!("Starting the indexer in {mode:?} mode");

    match mode {
        Mode::Manual => {
            syncer.sync_missing_blocks().await?;

            // let in-flight metadata land before the process exits
            if let Some(resolver) = resolver {
                resolver.settle().await;
            }
            drop(syncer);
            if let Some(drain) = drain {
                let _ = drain.await;
            }
        }
        Mode::Automatic => {
            let gate = Arc::new(SyncGate::new());
            listen_for_new_blocks(node, syncer, gate).await?;
        }
    }

    Ok(())
}
