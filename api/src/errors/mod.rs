//! Error handling module
//!
//! Every error envelope carries the environment tag of the deployment that
//! produced it.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Transaction not found: {txn_hash}")]
    TransactionNotFound {
        txn_hash: String,
        environment: String,
    },
    #[error("Endpoint not found")]
    EndpointNotFound { environment: String },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        environment: String,
    },
    #[error("Unhandled failure")]
    Unhandled { environment: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(rename = "txnHash", skip_serializing_if = "Option::is_none")]
    pub txn_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub environment: String,
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display, environment: &str) -> Self {
        ApiError::Internal {
            message: err.to_string(),
            environment: environment.to_string(),
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::TransactionNotFound {
                txn_hash,
                environment,
            } => ErrorResponse {
                error: "Transaction not found",
                txn_hash: Some(txn_hash.clone()),
                message: None,
                environment: environment.clone(),
            },
            ApiError::EndpointNotFound { environment } => ErrorResponse {
                error: "Endpoint not found",
                txn_hash: None,
                message: None,
                environment: environment.clone(),
            },
            ApiError::Internal {
                message,
                environment,
            } => ErrorResponse {
                error: "Internal server error",
                txn_hash: None,
                message: Some(message.clone()),
                environment: environment.clone(),
            },
            ApiError::Unhandled { environment } => ErrorResponse {
                error: "Something broke!",
                txn_hash: None,
                message: None,
                environment: environment.clone(),
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::TransactionNotFound { .. } | ApiError::EndpointNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ApiError::Internal { .. } | ApiError::Unhandled { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}
