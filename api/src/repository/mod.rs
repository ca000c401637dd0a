// Repository layer for database operations
// Provides abstraction over sqlx for clean data access

pub mod pagination;
pub mod transactions;

pub use pagination::{Pagination, PaginationMeta};
pub use transactions::{TransactionRecord, TransactionRepository, TransactionStore};
