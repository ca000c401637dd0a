//! Access log middleware
//!
//! Opens an `http_request` span carrying the request id, deployment, method
//! and path. Handler and repository logs emitted while the request runs
//! inherit those fields, and one completion event records status and latency.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Instant,
};
use tracing::Instrument;

use super::request_id::RequestIdValue;

pub struct Logger {
    environment: Rc<str>,
}

impl Logger {
    pub fn new(environment: &str) -> Self {
        Self {
            environment: Rc::from(environment),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Logger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddleware {
            service: Rc::new(service),
            environment: self.environment.clone(),
        }))
    }
}

pub struct LoggerMiddleware<S> {
    service: Rc<S>,
    environment: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();

        // Set by `RequestId`, which must wrap this middleware
        let request_id = req
            .extensions()
            .get::<RequestIdValue>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let remote_addr = req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_string();

        let span = tracing::info_span!(
            "http_request",
            request_id = %request_id,
            environment = %self.environment,
            method = %req.method(),
            path = %req.path(),
        );

        let fut = span.in_scope(|| self.service.call(req));

        Box::pin(
            async move {
                let result = fut.await;
                let duration_ms = start.elapsed().as_millis() as u64;

                match &result {
                    Ok(res) => tracing::info!(
                        status = res.status().as_u16(),
                        duration_ms,
                        remote_addr = %remote_addr,
                        "HTTP request"
                    ),
                    Err(err) => tracing::warn!(
                        error = %err,
                        duration_ms,
                        remote_addr = %remote_addr,
                        "HTTP request failed"
                    ),
                }

                result
            }
            .instrument(span),
        )
    }
}
