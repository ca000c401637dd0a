use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;

use super::pagination::Pagination;

/// One row of the transactions table, passed through column by column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRecord(pub Map<String, Value>);

impl TransactionRecord {
    pub fn transaction_hash(&self) -> Option<&str> {
        self.0.get("transaction_hash").and_then(Value::as_str)
    }
}

impl From<Value> for TransactionRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(columns) => TransactionRecord(columns),
            other => {
                let mut columns = Map::new();
                columns.insert("value".to_string(), other);
                TransactionRecord(columns)
            }
        }
    }
}

/// Read-only access to the transactions table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// First row whose `transaction_hash` equals `txn_hash`.
    async fn find_by_hash(&self, txn_hash: &str) -> Result<Option<TransactionRecord>, sqlx::Error>;

    /// One page of rows ordered by `transaction_hash` ascending.
    async fn list_page(&self, pagination: Pagination) -> Result<Vec<TransactionRecord>, sqlx::Error>;

    /// Unfiltered row count of the table.
    async fn count(&self) -> Result<i64, sqlx::Error>;
}

pub struct TransactionRepository {
    pool: PgPool,
    table: String,
}

impl TransactionRepository {
    /// `table` must already be a validated identifier; it is spliced into the SQL text.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    fn lookup_sql(&self) -> String {
        format!(
            "SELECT to_jsonb(t) FROM {} AS t WHERE t.transaction_hash = $1",
            self.table
        )
    }

    fn page_sql(&self) -> String {
        format!(
            "SELECT to_jsonb(t) FROM {} AS t ORDER BY t.transaction_hash LIMIT $1 OFFSET $2",
            self.table
        )
    }

    fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.table)
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    async fn find_by_hash(&self, txn_hash: &str) -> Result<Option<TransactionRecord>, sqlx::Error> {
        let row = sqlx::query_scalar::<_, Value>(&self.lookup_sql())
            .bind(txn_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(TransactionRecord::from))
    }

    async fn list_page(&self, pagination: Pagination) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        let rows = sqlx::query_scalar::<_, Value>(&self.page_sql())
            .bind(pagination.limit)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(TransactionRecord::from).collect())
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(&self.count_sql())
            .fetch_one(&self.pool)
            .await
    }
}
