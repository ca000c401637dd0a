use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::repository::{Pagination, PaginationMeta, TransactionRecord};

/// Raw listing parameters; anything unparsable falls back to defaults.
#[derive(Debug, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    /// Picks `page` and `limit` out of the decoded query pairs. A repeated
    /// key keeps its first value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub success: bool,
    pub data: TransactionRecord,
    #[serde(rename = "txnHash")]
    pub txn_hash: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub data: Vec<TransactionRecord>,
    pub pagination: PaginationMeta,
    pub environment: String,
}

// GET /transaction/{txn_hash}
pub async fn get_transaction(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let txn_hash = path.into_inner();

    match state.transactions.find_by_hash(&txn_hash).await {
        Ok(Some(record)) => Ok(HttpResponse::Ok().json(TransactionResponse {
            success: true,
            data: record,
            txn_hash,
            environment: state.environment.clone(),
        })),
        Ok(None) => Err(ApiError::TransactionNotFound {
            txn_hash,
            environment: state.environment.clone(),
        }),
        Err(e) => {
            tracing::error!(error = %e, txn_hash = %txn_hash, "Failed to get transaction");
            Err(ApiError::internal(e, &state.environment))
        }
    }
}

// GET /transactions
pub async fn list_transactions(
    query: web::Query<Vec<(String, String)>>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let query = ListQuery::from_pairs(query.into_inner());
    let pagination = Pagination::from_raw(query.page.as_deref(), query.limit.as_deref());

    // Page and count are independent reads; under concurrent writes the
    // totals may briefly disagree with the page contents.
    let data = state
        .transactions
        .list_page(pagination)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, page = pagination.page, limit = pagination.limit, "Failed to list transactions");
            ApiError::internal(e, &state.environment)
        })?;

    let total = state.transactions.count().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count transactions");
        ApiError::internal(e, &state.environment)
    })?;

    tracing::debug!(
        page = pagination.page,
        limit = pagination.limit,
        returned = data.len(),
        total = total,
        "Fetched transaction page"
    );

    Ok(HttpResponse::Ok().json(ListResponse {
        success: true,
        data,
        pagination: pagination.meta(total),
        environment: state.environment.clone(),
    }))
}
