//! Application state

use std::sync::Arc;

use crate::repository::TransactionStore;

#[derive(Clone)]
pub struct AppState {
    pub environment: String,
    pub port: u16,
    pub transactions: Arc<dyn TransactionStore>,
}

impl AppState {
    pub fn new(environment: impl Into<String>, port: u16, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            environment: environment.into(),
            port,
            transactions,
        }
    }
}
