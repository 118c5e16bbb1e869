use chain::model as wire;
use chain::utils::{to_u32, to_u64};
use eyre::{Result, ensure};

use crate::model::{Block, Contract, Log, Transaction};

/// Flattens a wire block into its row shape. Quantities are parsed with
/// the lenient converters, so a malformed field degrades to 0 instead of
/// dropping the block.
pub fn block_row(block: &wire::Block) -> Block {
    Block {
        hash: block.hash.clone(),
        number: to_u64(&block.number) as i64,
        parent_hash: block.parent_hash.clone(),
        nonce: block.nonce.clone(),
        miner: block.miner.clone(),
        difficulty: block.difficulty.clone(),
        total_difficulty: block.total_difficulty.clone(),
        extra_data: block.extra_data.clone(),
        size: to_u64(&block.size) as i64,
        gas_limit: to_u64(&block.gas_limit) as i64,
        gas_used: to_u64(&block.gas_used) as i64,
        timestamp: to_u64(&block.timestamp) as i64,
        transactions_count: block.transactions.len() as i64,
    }
}

/// Joins a transaction with its receipt. The pair must agree on the
/// identifying fields; a disagreement means the two responses describe
/// different inclusions and the item cannot be persisted coherently.
pub fn transaction_row(
    transaction: &wire::Transaction,
    receipt: &wire::TransactionReceipt,
    timestamp: i64,
) -> Result<Transaction> {
    ensure!(
        transaction.hash == receipt.transaction_hash,
        "transaction {} paired with receipt {}",
        transaction.hash,
        receipt.transaction_hash
    );
    ensure!(
        transaction.block_hash == receipt.block_hash
            && transaction.block_number == receipt.block_number
            && transaction.transaction_index == receipt.transaction_index,
        "transaction {} and its receipt disagree on inclusion",
        transaction.hash
    );

    Ok(Transaction {
        hash: transaction.hash.clone(),
        block_hash: transaction.block_hash.clone(),
        block_number: to_u64(&transaction.block_number) as i64,
        from_address: transaction.from.clone(),
        to_address: transaction.to.clone().unwrap_or_default(),
        gas: to_u64(&transaction.gas) as i64,
        gas_used: to_u64(&receipt.gas_used) as i64,
        gas_price: to_u64(&transaction.gas_price) as i64,
        nonce: to_u64(&transaction.nonce) as i64,
        transaction_index: to_u32(&transaction.transaction_index) as i64,
        value: transaction.value.clone(),
        contract_address: receipt.contract_address.clone().unwrap_or_default(),
        status: to_u64(&receipt.status) as i64,
        timestamp,
        input_data: transaction.input.clone(),
    })
}

/// A contract creation shows up as a receipt with a `contract_address`.
pub fn contract_row(receipt: &wire::TransactionReceipt) -> Option<Contract> {
    let address = receipt.contract_address.clone().filter(|a| !a.is_empty())?;

    Some(Contract { address, transaction_hash: receipt.transaction_hash.clone() })
}

/// Converts a receipt log, padding absent topics with empty strings so
/// the row shape is fixed regardless of how many the event carried.
pub fn log_row(log: &wire::Log, receipt: &wire::TransactionReceipt) -> Result<Log> {
    ensure!(
        log.block_hash == receipt.block_hash && log.transaction_hash == receipt.transaction_hash,
        "log {} of transaction {} does not match its receipt",
        log.log_index,
        receipt.transaction_hash
    );

    let topic = |i: usize| log.topics.get(i).cloned().unwrap_or_default();

    Ok(Log {
        block_hash: log.block_hash.clone(),
        log_index: to_u32(&log.log_index) as i64,
        address: log.address.clone(),
        data: log.data.clone(),
        block_number: to_u64(&log.block_number) as i64,
        transaction_hash: log.transaction_hash.clone(),
        topic_0: topic(0),
        topic_1: topic(1),
        topic_2: topic(2),
        topic_3: topic(3),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pair() -> (wire::Transaction, wire::TransactionReceipt) {
        let transaction = wire::Transaction {
            hash: "0xaa".into(),
            block_hash: "0xb1".into(),
            block_number: "0x10".into(),
            from: "0xf0".into(),
            to: Some("0xt0".into()),
            gas: "0x5208".into(),
            gas_price: "0x3b9aca00".into(),
            input: "0x".into(),
            nonce: "0x1".into(),
            transaction_index: "0x0".into(),
            value: "0x0".into(),
        };
        let receipt = wire::TransactionReceipt {
            transaction_hash: "0xaa".into(),
            transaction_index: "0x0".into(),
            block_hash: "0xb1".into(),
            block_number: "0x10".into(),
            gas_used: "0x5208".into(),
            status: "0x1".into(),
            ..Default::default()
        };
        (transaction, receipt)
    }

    #[test]
    fn joins_transaction_with_receipt() {
        let (transaction, receipt) = sample_pair();
        let row = transaction_row(&transaction, &receipt, 1700000000).unwrap();

        assert_eq!(row.hash, "0xaa");
        assert_eq!(row.block_number, 16);
        assert_eq!(row.gas_used, 21000);
        assert_eq!(row.status, 1);
        assert_eq!(row.timestamp, 1700000000);
        assert_eq!(row.contract_address, "");
    }

    #[test]
    fn rejects_mismatched_pair() {
        let (transaction, mut receipt) = sample_pair();
        receipt.block_hash = "0xb2".into();

        assert!(transaction_row(&transaction, &receipt, 0).is_err());
    }

    #[test]
    fn contract_creation_has_no_to_address() {
        let (mut transaction, mut receipt) = sample_pair();
        transaction.to = None;
        receipt.contract_address = Some("0xc0".into());

        let row = transaction_row(&transaction, &receipt, 0).unwrap();
        assert_eq!(row.to_address, "");
        assert_eq!(row.contract_address, "0xc0");

        let contract = contract_row(&receipt).unwrap();
        assert_eq!(contract.address, "0xc0");
        assert_eq!(contract.transaction_hash, "0xaa");
    }

    #[test]
    fn pads_missing_topics() {
        let receipt = wire::TransactionReceipt {
            transaction_hash: "0xaa".into(),
            block_hash: "0xb1".into(),
            ..Default::default()
        };
        let log = wire::Log {
            address: "0xc0".into(),
            topics: vec!["0x01".into(), "0x02".into()],
            data: "0x".into(),
            block_number: "0x10".into(),
            transaction_hash: "0xaa".into(),
            block_hash: "0xb1".into(),
            log_index: "0x3".into(),
            ..Default::default()
        };

        let row = log_row(&log, &receipt).unwrap();
        assert_eq!(row.log_index, 3);
        assert_eq!(row.topic_0, "0x01");
        assert_eq!(row.topic_1, "0x02");
        assert_eq!(row.topic_2, "");
        assert_eq!(row.topic_3, "");
    }
}
