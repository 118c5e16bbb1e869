use crate::model::{Block, CallParams, Transaction, TransactionReceipt};
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::Header;
use alloy::transports::http::reqwest::Url;
use eyre::{Result, eyre};
use futures_util::{Stream, StreamExt};
use std::time::Duration;

/// Read-only JSON-RPC client for the blockchain node.
///
/// Single and batch calls go over HTTP; `newHeads` subscriptions go over the
/// optional websocket endpoint. Every call is bounded by the caller-supplied
/// timeout; retry policy stays with the callers.
pub struct NodeClient {
    client: RpcClient,
    ws_url: Option<String>,
}

impl NodeClient {
    pub fn new(http_url: &str, ws_url: Option<String>) -> Result<Self> {
        let http_url: Url = http_url.parse()?;
        Ok(Self { client: RpcClient::new_http(http_url), ws_url })
    }

    /// `eth_getBlockByNumber("latest", false)`.
    pub async fn latest_block(&self, call_timeout: Duration) -> Result<Option<Block>> {
        let call = self.client.request("eth_getBlockByNumber", ("latest", false));
        let block: Option<Block> = tokio::time::timeout(call_timeout, call).await??;
        Ok(block)
    }

    /// Fetches the given blocks (without transaction bodies) in one batch
    /// round trip. Blocks the node does not know yet come back as `None`;
    /// per-element RPC errors are logged and also yield `None`.
    pub async fn blocks_by_number(
        &self,
        numbers: &[u64],
        call_timeout: Duration,
    ) -> Result<Vec<Option<Block>>> {
        if numbers.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = self.client.new_batch();
        let mut waiters = Vec::with_capacity(numbers.len());
        for number in numbers {
            let params = (format!("0x{number:x}"), false);
            waiters.push(batch.add_call::<_, Option<Block>>("eth_getBlockByNumber", &params)?);
        }
        tokio::time::timeout(call_timeout, batch.send()).await??;

        let mut blocks = Vec::with_capacity(numbers.len());
        for waiter in waiters {
            match waiter.await {
                Ok(block) => blocks.push(block),
                Err(e) => {
                    tracing::error!("Error in get-block batch element: {e:?}");
                    blocks.push(None);
                }
            }
        }
        Ok(blocks)
    }

    /// Fetches transaction body and receipt for every hash, paired in one
    /// batch round trip.
    pub async fn transactions_with_receipts(
        &self,
        hashes: &[String],
        call_timeout: Duration,
    ) -> Result<Vec<(Option<Transaction>, Option<TransactionReceipt>)>> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = self.client.new_batch();
        let mut waiters = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let params = (hash.clone(),);
            let transaction =
                batch.add_call::<_, Option<Transaction>>("eth_getTransactionByHash", &params)?;
            let receipt =
                batch.add_call::<_, Option<TransactionReceipt>>("eth_getTransactionReceipt", &params)?;
            waiters.push((transaction, receipt));
        }
        tokio::time::timeout(call_timeout, batch.send()).await??;

        let mut pairs = Vec::with_capacity(hashes.len());
        for (transaction, receipt) in waiters {
            let transaction = match transaction.await {
                Ok(transaction) => transaction,
                Err(e) => {
                    tracing::error!("Error in get-transaction batch element: {e:?}");
                    None
                }
            };
            let receipt = match receipt.await {
                Ok(receipt) => receipt,
                Err(e) => {
                    tracing::error!("Error in get-receipt batch element: {e:?}");
                    None
                }
            };
            pairs.push((transaction, receipt));
        }
        Ok(pairs)
    }

    /// `eth_call` against "latest" for every request, batched. A reverted or
    /// otherwise failed individual call yields an empty string; only a
    /// transport/timeout failure errors the whole batch.
    pub async fn call_many(
        &self,
        calls: &[CallParams],
        call_timeout: Duration,
    ) -> Result<Vec<String>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = self.client.new_batch();
        let mut waiters = Vec::with_capacity(calls.len());
        for call in calls {
            waiters.push(batch.add_call::<_, String>("eth_call", &(call.clone(), "latest"))?);
        }
        tokio::time::timeout(call_timeout, batch.send()).await??;

        let mut results = Vec::with_capacity(calls.len());
        for waiter in waiters {
            match waiter.await {
                Ok(data) => results.push(data),
                Err(e) => {
                    tracing::debug!("eth_call element failed, treating as empty: {e:?}");
                    results.push(String::new());
                }
            }
        }
        Ok(results)
    }

    /// Subscribes to `newHeads` over the websocket endpoint. The caller owns
    /// reconnecting when the stream ends.
    pub async fn subscribe_heads(&self) -> Result<impl Stream<Item = Header> + Send + Unpin> {
        let Some(ws_url) = self.ws_url.clone() else {
            return Err(eyre!("no websocket url configured"));
        };

        let provider = ProviderBuilder::new().connect_ws(WsConnect::new(ws_url)).await?;
        let subscription = provider.subscribe_blocks().await?;

        // the closure keeps the ws provider alive for the stream's lifetime
        Ok(subscription.into_stream().map(move |header| {
            let _ = &provider;
            header
        }))
    }
}
