//! Schema validation middleware.
//!
//! Wraps handlers with request validation against a loaded API contract:
//! route resolution first, then structural checks on path, query, headers,
//! and body. A rejected request is rendered through the error dispatcher
//! and never reaches the wrapped handler.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use bytes::Bytes;
use http_body_util::BodyExt;

use crate::{
    error::ApiError,
    response::render_error,
    schema::{SchemaDocument, ValidationFailure, ValidationOptions},
};

/// Validator state shared across requests.
///
/// The document is read-only after construction, so clones are cheap and
/// concurrent validation needs no locking. Install with
/// `axum::middleware::from_fn_with_state`:
///
/// ```ignore
/// let validator = SchemaValidator::new(document);
/// let app = Router::new()
///     .route("/users/{id}", get(show_user))
///     .layer(middleware::from_fn_with_state(validator, validate_request));
/// ```
#[derive(Clone)]
pub struct SchemaValidator {
    document: Arc<dyn SchemaDocument>,
    options: ValidationOptions,
}

impl SchemaValidator {
    pub fn new(document: Arc<dyn SchemaDocument>) -> Self {
        Self {
            document,
            options: ValidationOptions::default(),
        }
    }

    pub fn with_options(document: Arc<dyn SchemaDocument>, options: ValidationOptions) -> Self {
        Self { document, options }
    }
}

/// Middleware that validates a request against the schema document.
///
/// Statuses on rejection: 400 for a route miss or schema mismatch, 401 for
/// a security requirement failure, 500 for anything the document reports
/// that we cannot classify. On success the matched [`crate::schema::Operation`]
/// is added to the request extensions and the buffered body is replayed to
/// the handler.
pub async fn validate_request(
    State(validator): State<SchemaValidator>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let operation = match validator
        .document
        .find_operation(&parts.method, parts.uri.path())
    {
        Ok(operation) => operation,
        Err(err) => return render_error(&parts.extensions, &ApiError::bad_request(err)),
    };

    // Structural validation needs the body, so buffer it once and replay
    // the bytes to the handler afterwards.
    let bytes: Bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => return render_error(&parts.extensions, &ApiError::internal(err)),
    };

    if let Err(failure) =
        validator
            .document
            .validate(&parts, &bytes, &operation, &validator.options)
    {
        let err = classify(failure);
        return render_error(&parts.extensions, &err);
    }

    parts.extensions.insert(operation);
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Maps a document failure to a taxonomy error.
fn classify(failure: ValidationFailure) -> ApiError {
    match failure {
        ValidationFailure::Request { message, fields } => {
            // Validator diagnostics can be verbose and multi-line with a
            // decent message on the first line; only that line is
            // API-facing.
            let first_line = message.lines().next().unwrap_or_default().to_string();
            ApiError::bad_request(first_line).with_fields(fields)
        }
        ValidationFailure::Security(message) => ApiError::unauthorized(message),
        // Unknown failure categories degrade to a safe 500 instead of
        // propagating.
        ValidationFailure::Other(message) => {
            ApiError::internal(format!("error validating request: {message}"))
        }
    }
}
