#[cfg(test)]
mod tests {
    use chain::model::{Block, Log, TransactionReceipt};
    use chain::utils::to_u64;
    use eyre::Result;

    #[test]
    fn deserializes_block_wire_shape() -> Result<()> {
        let payload = r#"{
            "hash": "0xd4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3",
            "number": "0x14816c8",
            "parentHash": "0xac5e1f4e9db5a1ab1b8456862d54f9ed74c5fd6a04a5c61b6805af13b322895d",
            "nonce": "0x0000000000000000",
            "miner": "0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5",
            "difficulty": "0x0",
            "gasLimit": "0x1c9c380",
            "gasUsed": "0xd2f7aa",
            "timestamp": "0x676a3f73",
            "transactions": ["0xd3e218036b9bd2561a797341806baf6b04f37cec9b6ce16288a24f12742da8e0"]
        }"#;

        let block: Block = serde_json::from_str(payload)?;
        assert_eq!(to_u64(&block.number), 21501640);
        assert_eq!(block.transactions.len(), 1);
        // fields the node omitted default to empty
        assert_eq!(block.total_difficulty, "");
        Ok(())
    }

    #[test]
    fn deserializes_receipt_with_null_contract_address() -> Result<()> {
        let payload = r#"{
            "transactionHash": "0xd3e218036b9bd2561a797341806baf6b04f37cec9b6ce16288a24f12742da8e0",
            "transactionIndex": "0x0",
            "blockHash": "0x09afa661a1c383fe926015a8df4e38d43035e3b33c24167454b9e4ad772312db",
            "blockNumber": "0x14816c8",
            "gasUsed": "0x5208",
            "contractAddress": null,
            "logs": [],
            "status": "0x1"
        }"#;

        let receipt: TransactionReceipt = serde_json::from_str(payload)?;
        assert!(receipt.contract_address.is_none());
        assert_eq!(to_u64(&receipt.status), 1);
        Ok(())
    }

    #[test]
    fn deserializes_log_topics() -> Result<()> {
        let payload = r#"{
            "address": "0x68614481aef06e53d23bbe0772343fb555ac40c8",
            "topics": [
                "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
                "0x0000000000000000000000000000000000000000000000000000000000000000",
                "0x0000000000000000000000002b6ec277bec8b7b1b19efca00c1969cac63c9f0f",
                "0x0000000000000000000000000000000000000000000000000000000000000007"
            ],
            "data": "0x",
            "blockNumber": "0x14816c8",
            "transactionHash": "0xd3e218036b9bd2561a797341806baf6b04f37cec9b6ce16288a24f12742da8e0",
            "transactionIndex": "0x0",
            "blockHash": "0x09afa661a1c383fe926015a8df4e38d43035e3b33c24167454b9e4ad772312db",
            "logIndex": "0x0"
        }"#;

        let log: Log = serde_json::from_str(payload)?;
        assert_eq!(log.topics.len(), 4);
        assert_eq!(to_u64(&log.log_index), 0);
        Ok(())
    }
}
