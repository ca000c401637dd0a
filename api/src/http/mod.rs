//! HTTP server module

pub mod middleware;
pub mod routes;

use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::NormalizePath,
    web, App, HttpServer,
};
use std::io;

use crate::app_state::AppState;
use crate::config::Config;
use middleware::{logger::Logger, request_id::RequestId};

/// Builds the application served by every worker: routes, path
/// normalization, CORS, the access log and request ids, outermost last.
pub fn build_app(
    app_state: web::Data<AppState>,
    request_id_header: &str,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let environment = app_state.environment.clone();

    App::new()
        .app_data(app_state)
        .configure(|cfg| routes::configure(cfg, &environment))
        .wrap(NormalizePath::trim())
        .wrap(Cors::permissive())
        .wrap(Logger::new(&environment))
        .wrap(RequestId::new(request_id_header))
}

pub async fn start_server(config: Config, app_state: AppState) -> io::Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let environment = config.service.environment.clone();

    tracing::info!(
        service_name = %config.service.name,
        environment = %environment,
        bind_addr = %bind_addr,
        workers = %config.server.workers,
        log_level = %config.telemetry.log_level,
        log_format = %config.telemetry.log_format,
        "Starting HTTP server"
    );

    let app_state = web::Data::new(app_state);
    let request_id_header = config.telemetry.request_id_header.clone();

    let mut server = HttpServer::new(move || build_app(app_state.clone(), &request_id_header));

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let server = server.bind(&bind_addr)?;

    tracing::info!(url = %format!("http://{}/health", bind_addr), "Health check");
    tracing::info!(url = %format!("http://{}/transaction/{{txnHash}}", bind_addr), "Transaction endpoint");
    tracing::info!(url = %format!("http://{}/transactions", bind_addr), "Transaction listing");

    server.run().await
}
