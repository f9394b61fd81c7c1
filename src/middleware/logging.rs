//! Request logging middleware.
//!
//! The outermost layer of the chain: assigns or propagates a request id,
//! opens a tracing span so every downstream event carries it, seeds the
//! user-id slot for later authentication middleware, and logs one summary
//! event when the request completes.

use std::time::Instant;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::userid;

/// Header used to propagate the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id extension, reused from the inbound header when present.
#[derive(Debug, Clone)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Middleware that logs one "served" event per completed request.
///
/// Fields: protocol, remote address, request URI, method, duration, status,
/// response size, and the user identity when authentication middleware set
/// one. The identity is read after the inner service finishes because
/// authentication runs further down the stack than logging.
pub async fn log_requests(mut req: Request, next: Next) -> Response {
    let started = Instant::now();

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|id| RequestId::from_string(id.to_string()))
        .unwrap_or_default();

    let proto = format!("{:?}", req.version());
    // Behind a proxy the peer address is in the forwarded header; the raw
    // socket address is not visible at this layer.
    let remote = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let method = req.method().clone();
    let uri = req.uri().to_string();

    req.extensions_mut().insert(request_id.clone());
    // Seed the identity slot so downstream auth middleware mutates it in
    // place and we can read it back after the handler.
    let user = userid::init(req.extensions_mut());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %req.uri().path(),
    );

    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = request_id.as_str().parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);

    let user_id = user.get();
    if user_id.is_empty() {
        tracing::info!(
            %proto,
            %remote,
            request = %uri,
            %method,
            took = ?started.elapsed(),
            status = response.status().as_u16(),
            size,
            request_id = %request_id,
            "served",
        );
    } else {
        tracing::info!(
            %proto,
            %remote,
            request = %uri,
            %method,
            took = ?started.elapsed(),
            status = response.status().as_u16(),
            size,
            request_id = %request_id,
            %user_id,
            "served",
        );
    }

    response
}
