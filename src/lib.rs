//! portico -- request validation and uniform error rendering for axum.
//!
//! A small toolkit that sits in front of HTTP API handlers:
//!
//! - [`error::ApiError`] classifies failures into a closed taxonomy, each
//!   kind mapping to exactly one HTTP status, with optional ordered
//!   per-field detail;
//! - [`response::render_error`] turns any error value into the single wire
//!   shape `{"error": ..., "fields": [...]}`, logging full diagnostic
//!   context internally and showing clients an opaque 500 for anything
//!   unclassified;
//! - [`middleware::validate_request`] checks requests against a loaded API
//!   contract (via the [`schema::SchemaDocument`] seam) before the handler
//!   runs;
//! - [`middleware::log_requests`] assigns request ids, opens the tracing
//!   span, and seeds the per-request identity slot that authentication
//!   middleware fills in via [`userid`];
//! - [`body::JsonBody`] decodes JSON request bodies with precise failure
//!   statuses.
//!
//! Wiring order matters: logging outermost, then any reporter/auth layers,
//! then validation, then handlers.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/users/{id}", get(show_user))
//!     .layer(middleware::from_fn_with_state(validator, portico::middleware::validate_request))
//!     .layer(Extension(reporter))
//!     .layer(middleware::from_fn(portico::middleware::log_requests));
//! ```

pub mod body;
pub mod error;
pub mod middleware;
pub mod reporter;
pub mod response;
pub mod schema;
pub mod userid;

#[cfg(test)]
mod tests;

pub use body::{JsonBody, decode_json_body};
pub use error::{ApiError, BoxError, ErrorKind, ErrorResponse, FieldError};
pub use reporter::{ErrorReporter, Reporter};
pub use response::{RenderHttp, SelfRendered, json_response, render_error, render_message};
pub use schema::{Operation, RouteError, SchemaDocument, ValidationFailure, ValidationOptions};
