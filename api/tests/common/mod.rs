use async_trait::async_trait;
use ledger_api::app_state::AppState;
use ledger_api::repository::{Pagination, TransactionRecord, TransactionStore};
use serde_json::json;
use std::sync::Arc;

/// Static table kept sorted by `transaction_hash`.
pub struct MemoryStore {
    rows: Vec<TransactionRecord>,
}

impl MemoryStore {
    pub fn with_rows(count: usize) -> Self {
        let mut rows: Vec<TransactionRecord> = (0..count)
            .map(|i| {
                TransactionRecord::from(json!({
                    "transaction_hash": format!("{:064x}", i * 7919 + 1),
                    "account": format!("0.0.{}", 1000 + i),
                    "successful": i % 3 != 0,
                    "memo": null
                }))
            })
            .collect();
        rows.sort_by(|a, b| a.transaction_hash().cmp(&b.transaction_hash()));
        Self { rows }
    }

    pub fn hashes(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|r| r.transaction_hash().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_by_hash(&self, txn_hash: &str) -> Result<Option<TransactionRecord>, sqlx::Error> {
        Ok(self
            .rows
            .iter()
            .find(|r| r.transaction_hash() == Some(txn_hash))
            .cloned())
    }

    async fn list_page(&self, pagination: Pagination) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(pagination.limit).unwrap_or(0);
        Ok(self.rows.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        Ok(self.rows.len() as i64)
    }
}

/// Every call fails as if the database were down.
pub struct UnreachableStore;

#[async_trait]
impl TransactionStore for UnreachableStore {
    async fn find_by_hash(&self, _txn_hash: &str) -> Result<Option<TransactionRecord>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn list_page(&self, _pagination: Pagination) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }
}

pub fn state(environment: &str, port: u16, store: impl TransactionStore + 'static) -> AppState {
    AppState::new(environment, port, Arc::new(store))
}
