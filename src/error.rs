//! Taxonomy errors carried through handlers and middleware.
//!
//! An [`ApiError`] classifies a failure with an HTTP status and optional
//! per-field detail while keeping the underlying cause intact. The
//! dispatcher in [`crate::response`] unwraps arbitrary error values back to
//! an `ApiError` (through any intermediate wrapping) to pick the status and
//! body for the wire.

use std::error::Error as StdError;
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Boxed error alias used for wrapped causes.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Classification of an [`ApiError`].
///
/// Each kind maps to exactly one HTTP status; `Custom` carries the status
/// explicitly on the error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    UnsupportedMediaType,
    Internal,
    /// Explicit-status error built with [`ApiError::request_error`].
    Custom,
}

impl ErrorKind {
    /// The status a kind maps to. `Custom` has no fixed status.
    fn status(self) -> Option<StatusCode> {
        match self {
            ErrorKind::BadRequest => Some(StatusCode::BAD_REQUEST),
            ErrorKind::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ErrorKind::Forbidden => Some(StatusCode::FORBIDDEN),
            ErrorKind::NotFound => Some(StatusCode::NOT_FOUND),
            ErrorKind::UnsupportedMediaType => Some(StatusCode::UNSUPPORTED_MEDIA_TYPE),
            ErrorKind::Internal => Some(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorKind::Custom => None,
        }
    }
}

/// An error with a specific request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

/// Wire shape for every API failure.
///
/// `fields` is omitted from the JSON entirely when empty. This is the only
/// body shape clients see for failures, unless a [`crate::response::RenderHttp`]
/// error overrides rendering.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// A failure classified for the wire: kind, HTTP status, wrapped cause, and
/// optional ordered field errors.
///
/// `Display` is always the cause's message, never a kind label, so logs show
/// the real failure and the dispatcher's opaque-500 fallback stays safe for
/// anything unclassified.
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    status: StatusCode,
    source: BoxError,
    fields: Vec<FieldError>,
}

impl ApiError {
    fn from_kind(kind: ErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            status: kind.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            source: source.into(),
            fields: Vec::new(),
        }
    }

    /// A 400 response carrying the cause's message.
    pub fn bad_request(source: impl Into<BoxError>) -> Self {
        Self::from_kind(ErrorKind::BadRequest, source)
    }

    /// A 401 response carrying the cause's message.
    pub fn unauthorized(source: impl Into<BoxError>) -> Self {
        Self::from_kind(ErrorKind::Unauthorized, source)
    }

    /// A 403 response carrying the cause's message.
    pub fn forbidden(source: impl Into<BoxError>) -> Self {
        Self::from_kind(ErrorKind::Forbidden, source)
    }

    /// A 404 response carrying the cause's message.
    pub fn not_found(source: impl Into<BoxError>) -> Self {
        Self::from_kind(ErrorKind::NotFound, source)
    }

    /// A 415 response carrying the cause's message.
    pub fn unsupported_media_type(source: impl Into<BoxError>) -> Self {
        Self::from_kind(ErrorKind::UnsupportedMediaType, source)
    }

    /// A 500 response carrying the cause's message.
    pub fn internal(source: impl Into<BoxError>) -> Self {
        Self::from_kind(ErrorKind::Internal, source)
    }

    /// Wraps a cause with an explicit status code, for call sites that need
    /// inline status control rather than a dedicated kind.
    pub fn request_error(source: impl Into<BoxError>, status: StatusCode) -> Self {
        Self {
            kind: ErrorKind::Custom,
            status,
            source: source.into(),
            fields: Vec::new(),
        }
    }

    /// Attaches per-field detail, preserving the given order.
    ///
    /// Field errors are only meaningful on `BadRequest` (and `Custom` errors
    /// standing in for one); the dispatcher echoes them verbatim.
    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        self.fields = fields;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    /// Finds an `ApiError` in `err` or anywhere down its cause chain.
    ///
    /// Intermediate layers routinely wrap handler errors with extra context;
    /// classification still has to work on the wrapped value, so this walks
    /// `source()` links rather than only downcasting the outermost error.
    pub fn find<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a ApiError> {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(api_err) = e.downcast_ref::<ApiError>() {
                return Some(api_err);
            }
            current = e.source();
        }
        None
    }

    /// Whether `err` (or any of its causes) is an `ApiError` of `kind`.
    pub fn is_kind(err: &(dyn StdError + 'static), kind: ErrorKind) -> bool {
        Self::find(err).is_some_and(|e| e.kind == kind)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The wrapped cause's message, which is what shows up in logs and in
        // the client-facing body for classified errors.
        write!(f, "{}", self.source)
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

impl IntoResponse for ApiError {
    /// Renders the generic `{error, fields}` body with this error's status.
    ///
    /// Handlers returning `Result<_, ApiError>` get the uniform shape for
    /// free. The full dispatcher, [`crate::response::render_error`], should
    /// be preferred where request extensions are available since it also
    /// forwards the error to the configured reporter.
    fn into_response(self) -> Response {
        tracing::error!(error = %crate::response::ErrorChain(&self), "web handler error");
        let body = ErrorResponse {
            error: self.to_string(),
            fields: self.fields,
        };
        (self.status, Json(body)).into_response()
    }
}
