//! Schema document interface consumed by the validator middleware.
//!
//! The API contract document (OpenAPI or similar) is parsed and loaded
//! elsewhere; this crate only consumes two capabilities through the
//! [`SchemaDocument`] trait: matching a request to an operation, and
//! validating the request against that operation's declared constraints.
//! Documents are loaded once, shared via `Arc`, and treated as read-only
//! for the life of the process, so validation never takes a lock.

use std::collections::HashMap;

use http::{Method, request::Parts};
use thiserror::Error;

use crate::error::FieldError;

/// A matched schema operation for one request.
///
/// Derived from the (method, path) pair on every request and handed to the
/// wrapped handler as a request extension; never persisted.
#[derive(Debug, Clone)]
pub struct Operation {
    /// The contract's identifier for the operation, when it declares one.
    pub operation_id: Option<String>,
    /// Path-parameter bindings extracted during route matching.
    pub path_params: HashMap<String, String>,
}

impl Operation {
    pub fn new(operation_id: Option<String>) -> Self {
        Self {
            operation_id,
            path_params: HashMap::new(),
        }
    }

    pub fn with_path_params(mut self, path_params: HashMap<String, String>) -> Self {
        self.path_params = path_params;
        self
    }
}

/// No operation in the document matches the request's method and path.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RouteError(pub String);

/// A request failed validation against its matched operation.
#[derive(Debug, Error)]
pub enum ValidationFailure {
    /// Schema mismatch in query, headers, path parameters, or body.
    ///
    /// `message` may be a multi-line diagnostic; only its first line is
    /// surfaced to the client. `fields` carries structured per-field detail
    /// when the document can attribute failures to request fields.
    #[error("{message}")]
    Request {
        message: String,
        fields: Vec<FieldError>,
    },

    /// Missing or invalid security credentials.
    #[error("{0}")]
    Security(String),

    /// Anything the document reports that fits neither category above.
    #[error("{0}")]
    Other(String),
}

impl ValidationFailure {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

/// Knobs passed through to the document's validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Skip the operation's security requirements (useful when a separate
    /// authentication layer already enforces them).
    pub skip_security: bool,
    /// Skip body schema checks, validating only path, query, and headers.
    pub skip_body: bool,
}

/// The loaded API contract, reduced to the two capabilities the validator
/// middleware needs.
pub trait SchemaDocument: Send + Sync + 'static {
    /// Matches a request to an operation, binding its path parameters.
    fn find_operation(&self, method: &Method, path: &str) -> Result<Operation, RouteError>;

    /// Checks the request's query, headers, path parameters, and body
    /// against the operation's declared schema.
    fn validate(
        &self,
        parts: &Parts,
        body: &[u8],
        operation: &Operation,
        options: &ValidationOptions,
    ) -> Result<(), ValidationFailure>;
}
