use crate::errors::{CausesError, UpsertError};
use crate::handler::{CauseUpsertHandler, error_response};
use crate::metrics_defs::REQUESTS_INFLIGHT;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use metrics::Gauge;
use shared::gauge;
use shared::http::{full_body, make_error_response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type ServiceBody = BoxBody<Bytes, CausesError>;

/// Gateway-facing service: forwards the body of `POST`/`PUT` requests on the
/// configured path to the upsert handler.
#[derive(Clone)]
pub struct CausesService {
    handler: Arc<CauseUpsertHandler>,
    path: Arc<str>,
}

impl CausesService {
    pub fn new(handler: Arc<CauseUpsertHandler>, path: &str) -> Self {
        CausesService {
            handler,
            path: Arc::from(path),
        }
    }

    pub async fn route<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        if req.uri().path() != &*self.path {
            tracing::warn!(path = %req.uri().path(), "No route matched");
            return make_error_response(StatusCode::NOT_FOUND);
        }

        if *req.method() != Method::POST && *req.method() != Method::PUT {
            tracing::warn!(method = %req.method(), "Method not allowed");
            return make_error_response(StatusCode::METHOD_NOT_ALLOWED);
        }

        match read_body(req.into_body()).await {
            Ok(body) => self.handler.handle(&body).await,
            Err(err) => error_response(&err),
        }
    }
}

async fn read_body<B>(body: B) -> Result<String, UpsertError>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let bytes = body
        .collect()
        .await
        .map_err(|e| UpsertError::RequestBody(format!("failed to read request body: {e}")))?
        .to_bytes();

    String::from_utf8(bytes.to_vec())
        .map_err(|e| UpsertError::RequestBody(format!("request body is not UTF-8: {e}")))
}

impl Service<Request<Incoming>> for CausesService {
    type Response = Response<ServiceBody>;
    type Error = CausesError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move {
            let _inflight = InflightGuard::new();
            let response = service.route(req).await;

            Ok(response.map(full_body))
        })
    }
}

/// Counts a request as in flight until dropped, including when hyper drops
/// the request future before it completes.
struct InflightGuard(Gauge);

impl InflightGuard {
    fn new() -> Self {
        let gauge = gauge!(REQUESTS_INFLIGHT);
        gauge.increment(1.0);
        InflightGuard(gauge)
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0.decrement(1.0);
    }
}
