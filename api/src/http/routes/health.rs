//! Health check route

use actix_web::{web, HttpResponse, Responder};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    environment: String,
    port: String,
}

/// Liveness only: never touches the database pool.
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "OK",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        environment: state.environment.clone(),
        port: state.port.to_string(),
    })
}
