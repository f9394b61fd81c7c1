//! Response rendering and the error dispatcher.
//!
//! [`render_error`] is the single place a failure becomes a wire response:
//! it reports to the optional [`crate::reporter::Reporter`], logs the full
//! cause chain, and then either delegates to a self-rendering error, emits
//! the uniform `{error, fields}` body for a classified [`ApiError`], or
//! falls back to an opaque 500 for anything unrecognized so internal detail
//! never leaks to clients.

use std::error::Error as StdError;
use std::fmt;

use axum::{
    http::{Extensions, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    error::{ApiError, ErrorResponse},
    reporter,
};

/// Capability for errors that fully own their HTTP response.
///
/// When the dispatcher sees one (via [`SelfRendered`]) it writes no status,
/// headers, or body of its own.
pub trait RenderHttp: StdError + Send + Sync + 'static {
    fn render_http(&self) -> Response;
}

/// Adapter marking an error as self-rendering.
///
/// `&dyn Error` cannot be downcast to another trait object on stable Rust,
/// so the capability is carried by this concrete wrapper, which
/// [`render_error`] recognizes by downcast. Wrap the error at the point it
/// is returned:
///
/// ```ignore
/// return Err(SelfRendered::new(RedirectToLogin { url }).into());
/// ```
pub struct SelfRendered(Box<dyn RenderHttp>);

impl SelfRendered {
    pub fn new(err: impl RenderHttp) -> Self {
        Self(Box::new(err))
    }

    pub fn render_http(&self) -> Response {
        self.0.render_http()
    }
}

impl fmt::Debug for SelfRendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SelfRendered").field(&self.0.to_string()).finish()
    }
}

impl fmt::Display for SelfRendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for SelfRendered {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        // Upcast the self-rendering error so logs still see its chain.
        let inner: &(dyn StdError + 'static) = self.0.as_ref();
        Some(inner)
    }
}

/// Displays an error followed by its cause chain, `outer: cause: cause`.
pub(crate) struct ErrorChain<'a>(pub &'a (dyn StdError + 'static));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut last = self.0.to_string();
        write!(f, "{last}")?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            let msg = cause.to_string();
            // Skip layers that only restate their cause.
            if msg != last {
                write!(f, ": {msg}")?;
                last = msg;
            }
            source = cause.source();
        }
        Ok(())
    }
}

/// Serializes `data` and builds a JSON response with the given status.
///
/// The body is serialized before the status is committed, so a marshal
/// failure degrades to an empty 500 rather than an already-sent status with
/// a broken body. A 204 writes no body at all.
pub fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response {
    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }

    let body = match serde_json::to_vec(data) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "marshalling JSON response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Turns any error value into the wire response, logging and reporting it.
///
/// Dispatch order:
/// 1. forward the raw error to the [`reporter`] extension when one is set;
/// 2. log at error severity with the full cause chain (the only place full
///    internal detail is guaranteed to surface);
/// 3. a [`SelfRendered`] error renders itself, nothing else is written;
/// 4. an [`ApiError`] found in the cause chain renders `{error, fields}`
///    with its status;
/// 5. anything else renders an opaque `{"error":"Internal Server Error"}`
///    with 500 -- the original message is deliberately not shown to the
///    client.
pub fn render_error(extensions: &Extensions, err: &(dyn StdError + 'static)) -> Response {
    if let Some(handler) = reporter::get(extensions) {
        handler.report(err);
    }

    tracing::error!(error = %ErrorChain(err), "web handler error");

    if let Some(renderable) = err.downcast_ref::<SelfRendered>() {
        return renderable.render_http();
    }

    if let Some(api_err) = ApiError::find(err) {
        let body = ErrorResponse {
            error: api_err.to_string(),
            fields: api_err.fields().to_vec(),
        };
        return json_response(api_err.status(), &body);
    }

    // Arbitrary, unclassified error: opaque 500 only.
    let body = ErrorResponse {
        error: StatusCode::INTERNAL_SERVER_ERROR
            .canonical_reason()
            .unwrap_or("Internal Server Error")
            .to_string(),
        fields: Vec::new(),
    };
    json_response(StatusCode::INTERNAL_SERVER_ERROR, &body)
}

/// Renders a plain message with the given status, `{"error": msg}`.
///
/// Convenience wrapper over [`render_error`].
pub fn render_message(extensions: &Extensions, msg: &str, status: StatusCode) -> Response {
    let err = ApiError::request_error(msg.to_string(), status);
    render_error(extensions, &err)
}
