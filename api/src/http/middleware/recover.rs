//! Recovery middleware
//!
//! Turns panics and errors that did not come from `ApiError` into the
//! service's JSON envelopes.
//!
//! `Recover` wraps resources, not the `App`. It keeps a handle on the request
//! while the handler runs, and the app-level router and `NormalizePath` need
//! sole ownership of the request until routing is done.

use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpRequest, ResponseError,
};
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::{
    any::Any,
    future::{ready, Ready},
    panic::AssertUnwindSafe,
    rc::Rc,
};

use crate::errors::ApiError;

pub struct Recover {
    environment: Rc<str>,
}

impl Recover {
    pub fn new(environment: &str) -> Self {
        Self {
            environment: Rc::from(environment),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Recover
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RecoverMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RecoverMiddleware {
            service: Rc::new(service),
            environment: self.environment.clone(),
        }))
    }
}

pub struct RecoverMiddleware<S> {
    service: Rc<S>,
    environment: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for RecoverMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Routing has already happened, so sharing the request is safe here
        let http_req = req.request().clone();
        let service = self.service.clone();
        let environment = self.environment.clone();

        Box::pin(async move {
            let outcome = AssertUnwindSafe(async move { service.call(req).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(res)) => Ok(rewrite_foreign_error(res, &environment)),
                Ok(Err(err)) => {
                    tracing::error!(error = %err, path = %http_req.path(), "Unhandled service error");
                    Ok(unhandled(http_req, &environment))
                }
                Err(panic) => {
                    tracing::error!(
                        panic = %panic_message(panic.as_ref()),
                        path = %http_req.path(),
                        "Request handler panicked"
                    );
                    Ok(unhandled(http_req, &environment))
                }
            }
        })
    }
}

fn unhandled<B>(req: HttpRequest, environment: &str) -> ServiceResponse<EitherBody<B>> {
    let response = ApiError::Unhandled {
        environment: environment.to_string(),
    }
    .error_response();
    ServiceResponse::new(req, response).map_into_right_body()
}

/// Errors raised outside `ApiError` (extractors, routing) keep their 404 as
/// "Endpoint not found"; anything else becomes "Something broke!".
fn rewrite_foreign_error<B>(res: ServiceResponse<B>, environment: &str) -> ServiceResponse<EitherBody<B>> {
    let foreign = res
        .response()
        .error()
        .map_or(false, |err| err.as_error::<ApiError>().is_none());
    if !foreign {
        return res.map_into_left_body();
    }

    let replacement = if res.status() == StatusCode::NOT_FOUND {
        ApiError::EndpointNotFound {
            environment: environment.to_string(),
        }
    } else {
        if let Some(err) = res.response().error() {
            tracing::error!(error = %err, status = %res.status(), path = %res.request().path(), "Unhandled request error");
        }
        ApiError::Unhandled {
            environment: environment.to_string(),
        }
    };

    let (req, _) = res.into_parts();
    ServiceResponse::new(req, replacement.error_response()).map_into_right_body()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
