use std::sync::Arc;
use std::time::Duration;

use alloy::hex;
use alloy::primitives::U256;
use alloy::sol_types::SolCall;
use chain::model::CallParams;
use chain::rpc::NodeClient;
use eyre::Result;
use serde::Deserialize;
use store::model::{NftMetadata, NftMetadataAttribute, NftTransfer, ResolvedMetadata};
use store::store::Store;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use crate::nft::decode::{TOKEN_TYPE_ERC721, tokenURICall, uriCall};
use crate::nft::dictionary::MetadataDictionary;

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

const CALL_ATTEMPTS: usize = 3;
const CALL_BACKOFF: Duration = Duration::from_millis(250);

/// Characters that may appear in a token URI. Everything else in the
/// raw call return (ABI padding, length words) is stripped.
const URI_CHARS: &str = "@:%._+~#?&/=-";

#[derive(Debug, Clone)]
pub struct ResolverArgs {
    pub call_timeout: Duration,
    pub step: usize,
    pub ipfs_gateway: String,
}

#[derive(Debug, Clone)]
struct Candidate {
    token_id: String,
    address: String,
    token_type_id: i64,
    key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct MetadataJson {
    name: String,
    image: String,
    description: String,
    attributes: Vec<AttributeJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AttributeJson {
    trait_type: String,
    value: serde_json::Value,
}

/// Resolves metadata for freshly minted tokens in the background.
///
/// Admission is guarded twice: once against the database and once
/// against the in-flight [`MetadataDictionary`], so a token minted in
/// two concurrent passes is still resolved exactly once. Resolution
/// failures leave the metadata fields empty but commit the row anyway;
/// an unreachable URI is not retried on every later transfer.
#[derive(Clone)]
pub struct MetadataResolver {
    client: Arc<NodeClient>,
    store: Store,
    dictionary: Arc<MetadataDictionary>,
    commits: mpsc::Sender<Vec<ResolvedMetadata>>,
    tracker: TaskTracker,
    http: reqwest::Client,
    args: ResolverArgs,
}

impl MetadataResolver {
    pub fn new(
        client: Arc<NodeClient>,
        store: Store,
        dictionary: Arc<MetadataDictionary>,
        commits: mpsc::Sender<Vec<ResolvedMetadata>>,
        args: ResolverArgs,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(args.call_timeout).build()?;

        Ok(Self { client, store, dictionary, commits, tracker: TaskTracker::new(), http, args })
    }

    /// Admits the mints among `transfers` and spawns one resolution task
    /// for them. The task outlives the sync pass that triggered it.
    pub async fn admit(&self, transfers: &[NftTransfer]) {
        let mut candidates = Vec::new();

        for transfer in transfers {
            if transfer.from_address != ZERO_ADDRESS {
                continue;
            }

            let key = format!("{}-{}", transfer.token_id, transfer.address);

            match self.store.nft_metadata_exists(&transfer.token_id, &transfer.address).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("Metadata lookup failed for {key}: {e:?}");
                    continue;
                }
            }

            if !self.dictionary.try_add(&key).await {
                continue;
            }

            // Another task may have committed between the lookup and the claim.
            match self.store.nft_metadata_exists(&transfer.token_id, &transfer.address).await {
                Ok(false) => {}
                _ => {
                    self.dictionary.try_remove(&key).await;
                    continue;
                }
            }

            candidates.push(Candidate {
                token_id: transfer.token_id.clone(),
                address: transfer.address.clone(),
                token_type_id: transfer.token_type_id,
                key,
            });
        }

        if candidates.is_empty() {
            return;
        }

        let resolver = self.clone();
        self.tracker.spawn(async move { resolver.resolve(candidates).await });
    }

    /// Waits for every spawned resolution task to finish.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    async fn resolve(&self, candidates: Vec<Candidate>) {
        for chunk in candidates.chunks(self.args.step.max(1)) {
            let mut calls = Vec::with_capacity(chunk.len());
            let mut kept = Vec::with_capacity(chunk.len());
            let mut dropped = Vec::new();

            for candidate in chunk {
                match uri_call(candidate) {
                    Some(call) => {
                        calls.push(call);
                        kept.push(candidate.clone());
                    }
                    None => dropped.push(candidate.key.clone()),
                }
            }
            self.dictionary.try_remove_range(&dropped).await;

            let chunk = kept;
            if calls.is_empty() {
                continue;
            }

            let Some(returns) = self.call_with_retries(&calls).await else {
                let keys: Vec<String> = chunk.iter().map(|c| c.key.clone()).collect();
                self.dictionary.try_remove_range(&keys).await;
                continue;
            };

            let mut resolved = Vec::with_capacity(chunk.len());
            for (candidate, raw) in chunk.iter().zip(&returns) {
                resolved.push(self.resolve_one(candidate, raw).await);
            }

            if let Err(e) = self.commits.send(resolved).await {
                tracing::error!("Metadata commit channel closed: {e:?}");
                let keys: Vec<String> = chunk.iter().map(|c| c.key.clone()).collect();
                self.dictionary.try_remove_range(&keys).await;
            }
        }
    }

    async fn call_with_retries(&self, calls: &[CallParams]) -> Option<Vec<String>> {
        for attempt in 1..=CALL_ATTEMPTS {
            match self.client.call_many(calls, self.args.call_timeout).await {
                Ok(returns) => return Some(returns),
                Err(e) => {
                    tracing::warn!("URI call batch failed (attempt {attempt}): {e:?}");
                    tokio::time::sleep(CALL_BACKOFF).await;
                }
            }
        }

        None
    }

    async fn resolve_one(&self, candidate: &Candidate, raw: &str) -> ResolvedMetadata {
        let json = match metadata_url(raw, &self.args.ipfs_gateway) {
            Some(url) => self.fetch(&url).await,
            None => MetadataJson::default(),
        };

        let attributes = json
            .attributes
            .into_iter()
            .map(|attribute| NftMetadataAttribute {
                trait_type: attribute.trait_type,
                value: attribute_value(attribute.value),
                nft_metadata_id: 0,
            })
            .collect();

        ResolvedMetadata {
            metadata: NftMetadata {
                id: 0,
                token_id: candidate.token_id.clone(),
                address: candidate.address.clone(),
                name: json.name,
                image: json.image,
                description: json.description,
            },
            attributes,
        }
    }

    async fn fetch(&self, url: &str) -> MetadataJson {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Metadata fetch failed for {url}: {e:?}");
                return MetadataJson::default();
            }
        };

        match response.json().await {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!("Metadata body unreadable for {url}: {e:?}");
                MetadataJson::default()
            }
        }
    }
}

fn uri_call(candidate: &Candidate) -> Option<CallParams> {
    let token_id: U256 = match candidate.token_id.parse() {
        Ok(token_id) => token_id,
        Err(e) => {
            tracing::error!("Unparseable token id {}: {e:?}", candidate.token_id);
            return None;
        }
    };

    let data = if candidate.token_type_id == TOKEN_TYPE_ERC721 {
        tokenURICall { tokenId: token_id }.abi_encode()
    } else {
        uriCall { id: token_id }.abi_encode()
    };

    Some(CallParams { to: candidate.address.clone(), data: format!("0x{}", hex::encode(data)) })
}

/// Digs the URI out of a raw `eth_call` return and rewrites it to a
/// fetchable URL. The return is an ABI-encoded string, so everything
/// outside the URI character set is padding and gets stripped before
/// the scheme is inspected. `https` must be tested before `http`.
pub fn metadata_url(raw: &str, ipfs_gateway: &str) -> Option<String> {
    let bytes = hex::decode(raw.trim_start_matches("0x")).ok()?;
    let text: String = String::from_utf8_lossy(&bytes)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || URI_CHARS.contains(*c))
        .collect();

    let (scheme_part, route) = text.split_once("://")?;
    let scheme: String = scheme_part
        .chars()
        .rev()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .chars()
        .rev()
        .collect();

    if scheme.contains("ipfs") {
        Some(format!("{ipfs_gateway}{route}"))
    } else if scheme.contains("https") {
        Some(format!("https://{route}"))
    } else if scheme.contains("http") {
        Some(format!("http://{route}"))
    } else {
        None
    }
}

fn attribute_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
