use alloy::hex;
use alloy::primitives::B256;
use alloy::sol;
use alloy::sol_types::SolEvent;
use chain::model as wire;
use chain::utils::{to_u32, to_u64};
use eyre::{Result, WrapErr, ensure};
use store::model::NftTransfer;

pub const TOKEN_TYPE_ERC721: i64 = 1;
pub const TOKEN_TYPE_ERC1155: i64 = 2;

sol! {
    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    event TransferSingle(address indexed operator, address indexed from, address indexed to, uint256 id, uint256 value);
    event TransferBatch(address indexed operator, address indexed from, address indexed to, uint256[] ids, uint256[] values);

    function tokenURI(uint256 tokenId) external view returns (string);
    function uri(uint256 id) external view returns (string);
}

/// Extracts NFT transfers from receipt logs.
///
/// The ERC-721 `Transfer` shares its signature with ERC-20, so only
/// fully-indexed logs (four topics) are considered; an ERC-20 transfer
/// carries the amount in the data field and has three. A log whose
/// signature matches but whose payload fails to decode is an error, not
/// a skip, so a malformed batch is retried instead of silently losing
/// transfers.
pub fn nft_transfers(logs: &[wire::Log]) -> Result<Vec<NftTransfer>> {
    let mut transfers = Vec::new();

    for log in logs {
        if log.topics.len() != 4 {
            continue;
        }

        let signature: B256 = match log.topics[0].parse() {
            Ok(signature) => signature,
            Err(_) => continue,
        };

        let topics = parse_topics(&log.topics)?;
        let data = hex::decode(log.data.trim_start_matches("0x"))
            .wrap_err_with(|| format!("malformed log data in {}", log.transaction_hash))?;

        if signature == Transfer::SIGNATURE_HASH {
            let event = Transfer::decode_raw_log(topics, &data)
                .wrap_err_with(|| format!("undecodable Transfer in {}", log.transaction_hash))?;
            transfers.push(transfer_row(
                log,
                event.from.to_string(),
                event.to.to_string(),
                event.tokenId.to_string(),
                "1".to_owned(),
                TOKEN_TYPE_ERC721,
            ));
        } else if signature == TransferSingle::SIGNATURE_HASH {
            let event = TransferSingle::decode_raw_log(topics, &data).wrap_err_with(|| {
                format!("undecodable TransferSingle in {}", log.transaction_hash)
            })?;
            transfers.push(transfer_row(
                log,
                event.from.to_string(),
                event.to.to_string(),
                event.id.to_string(),
                event.value.to_string(),
                TOKEN_TYPE_ERC1155,
            ));
        } else if signature == TransferBatch::SIGNATURE_HASH {
            let event = TransferBatch::decode_raw_log(topics, &data).wrap_err_with(|| {
                format!("undecodable TransferBatch in {}", log.transaction_hash)
            })?;
            ensure!(
                event.ids.len() == event.values.len(),
                "TransferBatch in {} has {} ids but {} values",
                log.transaction_hash,
                event.ids.len(),
                event.values.len()
            );
            for (id, value) in event.ids.iter().zip(&event.values) {
                transfers.push(transfer_row(
                    log,
                    event.from.to_string(),
                    event.to.to_string(),
                    id.to_string(),
                    value.to_string(),
                    TOKEN_TYPE_ERC1155,
                ));
            }
        }
    }

    Ok(transfers)
}

fn parse_topics(topics: &[String]) -> Result<Vec<B256>> {
    topics
        .iter()
        .map(|topic| topic.parse().wrap_err_with(|| format!("malformed topic {topic}")))
        .collect()
}

fn transfer_row(
    log: &wire::Log,
    from: String,
    to: String,
    token_id: String,
    value: String,
    token_type_id: i64,
) -> NftTransfer {
    NftTransfer {
        block_hash: log.block_hash.clone(),
        log_index: to_u32(&log.log_index) as i64,
        block_number: to_u64(&log.block_number) as i64,
        transaction_hash: log.transaction_hash.clone(),
        address: log.address.clone(),
        from_address: from,
        to_address: to,
        token_id,
        value,
        token_type_id,
    }
}
