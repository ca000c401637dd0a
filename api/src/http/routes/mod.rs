//! Route modules

pub mod health;
pub mod transactions;

use actix_web::{web, HttpResponse};

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::http::middleware::recover::Recover;

/// Registers the API routes. Each resource runs behind its own `Recover`.
pub fn configure(cfg: &mut web::ServiceConfig, environment: &str) {
    // Resources fall back to `not_found` so an unregistered method answers
    // 404 like an unknown path instead of 405.
    cfg.service(
        web::resource("/health")
            .route(web::get().to(health::health))
            .default_service(web::to(not_found))
            .wrap(Recover::new(environment)),
    )
    .service(
        web::resource("/transaction/{txn_hash}")
            .route(web::get().to(transactions::get_transaction))
            .default_service(web::to(not_found))
            .wrap(Recover::new(environment)),
    )
    .service(
        web::resource("/transactions")
            .route(web::get().to(transactions::list_transactions))
            .default_service(web::to(not_found))
            .wrap(Recover::new(environment)),
    )
    .default_service(web::to(not_found));
}

/// Catch-all for unmatched routes, including `/transaction/` with an empty hash.
pub async fn not_found(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Err(ApiError::EndpointNotFound {
        environment: state.environment.clone(),
    })
}
