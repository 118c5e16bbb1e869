use eyre::Result;

use crate::client::Client;
use crate::model::{BlockBundle, BlockRef, ResolvedMetadata};

#[derive(Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Persists everything one batch produced in a single transaction.
    /// Any conflict rolls the whole bundle back, so a batch is either
    /// fully visible or absent.
    pub async fn insert_batch(&self, bundle: &BlockBundle) -> Result<()> {
        let mut tx = self.client.pool().begin().await?;

        for block in &bundle.blocks {
            sqlx::query(
                r#"
                INSERT INTO blocks
                    (hash, number, parent_hash, nonce, miner, difficulty, total_difficulty,
                     extra_data, size, gas_limit, gas_used, timestamp, transactions_count)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&block.hash)
            .bind(block.number)
            .bind(&block.parent_hash)
            .bind(&block.nonce)
            .bind(&block.miner)
            .bind(&block.difficulty)
            .bind(&block.total_difficulty)
            .bind(&block.extra_data)
            .bind(block.size)
            .bind(block.gas_limit)
            .bind(block.gas_used)
            .bind(block.timestamp)
            .bind(block.transactions_count)
            .execute(&mut *tx)
            .await?;
        }

        for transaction in &bundle.transactions {
            sqlx::query(
                r#"
                INSERT INTO transactions
                    (hash, block_hash, block_number, from_address, to_address, gas, gas_used,
                     gas_price, nonce, transaction_index, value, contract_address, status,
                     timestamp, input_data)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&transaction.hash)
            .bind(&transaction.block_hash)
            .bind(transaction.block_number)
            .bind(&transaction.from_address)
            .bind(&transaction.to_address)
            .bind(transaction.gas)
            .bind(transaction.gas_used)
            .bind(transaction.gas_price)
            .bind(transaction.nonce)
            .bind(transaction.transaction_index)
            .bind(&transaction.value)
            .bind(&transaction.contract_address)
            .bind(transaction.status)
            .bind(transaction.timestamp)
            .bind(&transaction.input_data)
            .execute(&mut *tx)
            .await?;
        }

        for contract in &bundle.contracts {
            sqlx::query(
                r#"
                INSERT INTO contracts (address, transaction_hash)
                VALUES (?, ?)
                "#,
            )
            .bind(&contract.address)
            .bind(&contract.transaction_hash)
            .execute(&mut *tx)
            .await?;
        }

        for log in &bundle.logs {
            sqlx::query(
                r#"
                INSERT INTO logs
                    (block_hash, log_index, address, data, block_number, transaction_hash,
                     topic_0, topic_1, topic_2, topic_3)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&log.block_hash)
            .bind(log.log_index)
            .bind(&log.address)
            .bind(&log.data)
            .bind(log.block_number)
            .bind(&log.transaction_hash)
            .bind(&log.topic_0)
            .bind(&log.topic_1)
            .bind(&log.topic_2)
            .bind(&log.topic_3)
            .execute(&mut *tx)
            .await?;
        }

        for transfer in &bundle.nft_transfers {
            sqlx::query(
                r#"
                INSERT INTO nft_transfers
                    (block_hash, log_index, block_number, transaction_hash, address,
                     from_address, to_address, token_id, value, token_type_id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&transfer.block_hash)
            .bind(transfer.log_index)
            .bind(transfer.block_number)
            .bind(&transfer.transaction_hash)
            .bind(&transfer.address)
            .bind(&transfer.from_address)
            .bind(&transfer.to_address)
            .bind(&transfer.token_id)
            .bind(&transfer.value)
            .bind(transfer.token_type_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Every persisted block number at or above the checkpoint, ascending.
    pub async fn block_numbers_from(&self, checkpoint: i64) -> Result<Vec<i64>> {
        let numbers = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT number FROM blocks
            WHERE number >= ?
            ORDER BY number ASC
            "#,
        )
        .bind(checkpoint)
        .fetch_all(self.client.pool())
        .await?;

        Ok(numbers)
    }

    /// (number, hash) pairs inside the verification window, ascending.
    pub async fn block_refs_in(&self, from: i64, to: i64, limit: i64) -> Result<Vec<BlockRef>> {
        let refs = sqlx::query_as::<_, BlockRef>(
            r#"
            SELECT number, hash FROM blocks
            WHERE number >= ? AND number <= ?
            ORDER BY number ASC
            LIMIT ?
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(self.client.pool())
        .await?;

        Ok(refs)
    }

    /// Removes the given blocks and every row derived from them in a
    /// single transaction. Used to roll back a reorged window before it
    /// is re-synced from the node.
    pub async fn delete_blocks(&self, numbers: &[i64]) -> Result<()> {
        if numbers.is_empty() {
            return Ok(());
        }

        let placeholders = vec!["?"; numbers.len()].join(", ");
        let mut tx = self.client.pool().begin().await?;

        for table in ["logs", "nft_transfers", "transactions"] {
            let sql = format!("DELETE FROM {table} WHERE block_number IN ({placeholders})");
            let mut query = sqlx::query(&sql);
            for number in numbers {
                query = query.bind(number);
            }
            query.execute(&mut *tx).await?;
        }

        let sql = format!("DELETE FROM blocks WHERE number IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for number in numbers {
            query = query.bind(number);
        }
        query.execute(&mut *tx).await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn nft_metadata_exists(&self, token_id: &str, address: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM nft_metadata
            WHERE token_id = ? AND address = ?
            "#,
        )
        .bind(token_id)
        .bind(address)
        .fetch_one(self.client.pool())
        .await?;

        Ok(count > 0)
    }

    /// Persists resolved metadata with its attributes; the attribute FK
    /// is taken from the rowid of the metadata insert.
    pub async fn insert_nft_metadata(&self, resolved: &[ResolvedMetadata]) -> Result<()> {
        let mut tx = self.client.pool().begin().await?;

        for item in resolved {
            let result = sqlx::query(
                r#"
                INSERT INTO nft_metadata (token_id, address, name, image, description)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.metadata.token_id)
            .bind(&item.metadata.address)
            .bind(&item.metadata.name)
            .bind(&item.metadata.image)
            .bind(&item.metadata.description)
            .execute(&mut *tx)
            .await?;

            let metadata_id = result.last_insert_rowid();

            for attribute in &item.attributes {
                sqlx::query(
                    r#"
                    INSERT INTO nft_metadata_attributes (trait_type, value, nft_metadata_id)
                    VALUES (?, ?, ?)
                    "#,
                )
                .bind(&attribute.trait_type)
                .bind(&attribute.value)
                .bind(metadata_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(())
    }
}
