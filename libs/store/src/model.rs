use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Block {
    pub hash: String,
    pub number: i64,
    pub parent_hash: String,
    pub nonce: String,
    pub miner: String,
    pub difficulty: String,
    pub total_difficulty: String,
    pub extra_data: String,
    pub size: i64,
    pub gas_limit: i64,
    pub gas_used: i64,
    pub timestamp: i64,
    pub transactions_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Transaction {
    pub hash: String,
    pub block_hash: String,
    pub block_number: i64,
    pub from_address: String,
    pub to_address: String,
    pub gas: i64,
    pub gas_used: i64,
    pub gas_price: i64,
    pub nonce: i64,
    pub transaction_index: i64,
    pub value: String,
    pub contract_address: String,
    pub status: i64,
    pub timestamp: i64,
    pub input_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Contract {
    pub address: String,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Log {
    pub block_hash: String,
    pub log_index: i64,
    pub address: String,
    pub data: String,
    pub block_number: i64,
    pub transaction_hash: String,
    pub topic_0: String,
    pub topic_1: String,
    pub topic_2: String,
    pub topic_3: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct NftTransfer {
    pub block_hash: String,
    pub log_index: i64,
    pub block_number: i64,
    pub transaction_hash: String,
    pub address: String,
    pub from_address: String,
    pub to_address: String,
    pub token_id: String,
    pub value: String,
    pub token_type_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct NftMetadata {
    pub id: i64,
    pub token_id: String,
    pub address: String,
    pub name: String,
    pub image: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct NftMetadataAttribute {
    pub trait_type: String,
    pub value: String,
    pub nft_metadata_id: i64,
}

/// The unit compared during reorg detection.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BlockRef {
    pub number: i64,
    pub hash: String,
}

/// Everything one batch job produced; persisted in a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockBundle {
    pub blocks: Vec<Block>,
    pub transactions: Vec<Transaction>,
    pub contracts: Vec<Contract>,
    pub logs: Vec<Log>,
    pub nft_transfers: Vec<NftTransfer>,
}

/// Resolved metadata plus its attributes; the attribute FK is wired up at
/// insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub metadata: NftMetadata,
    pub attributes: Vec<NftMetadataAttribute>,
}
