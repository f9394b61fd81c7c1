//! JSON request body decoding with taxonomy errors.
//!
//! Checks run in a fixed order: the `Content-Type` header is rejected
//! before a single body byte is read, then emptiness, then JSON syntax,
//! then trailing content after the first value (concatenated-object
//! bodies). Each failure maps to a specific [`ApiError`] so clients always
//! see the uniform error shape.

use axum::{
    body::Body,
    extract::{FromRequest, Request},
    http::{header, request::Parts},
    response::Response,
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::{error::ApiError, response::render_error};

/// Decodes the request body as a single JSON value.
///
/// Failure statuses: 415 for a `Content-Type` other than exactly
/// `application/json`, 400 for an empty, malformed, or multi-document body.
pub async fn decode_json_body<T: DeserializeOwned>(req: Request) -> Result<T, ApiError> {
    let (parts, body) = req.into_parts();
    decode_parts(&parts, body).await
}

/// Extractor form of [`decode_json_body`].
///
/// The rejection is a fully rendered response: decode failures pass through
/// [`render_error`] so they are logged and reported like any other handler
/// error.
///
/// ```ignore
/// async fn create_user(JsonBody(input): JsonBody<CreateUser>) -> Response { ... }
/// ```
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        match decode_parts(&parts, body).await {
            Ok(value) => Ok(JsonBody(value)),
            Err(err) => Err(render_error(&parts.extensions, &err)),
        }
    }
}

async fn decode_parts<T: DeserializeOwned>(parts: &Parts, body: Body) -> Result<T, ApiError> {
    // Content-Type is checked before any byte of the body is read.
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if content_type != "application/json" {
        return Err(ApiError::unsupported_media_type(
            "Content-Type header is not application/json",
        ));
    }

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => return Err(ApiError::internal(err)),
    };

    decode_json(&bytes)
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("request body must not be empty"));
    }

    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut deserializer).map_err(|err| match err.classify() {
        Category::Syntax | Category::Eof => {
            ApiError::bad_request("request body contains badly-formed JSON")
        }
        _ => ApiError::bad_request(err),
    })?;

    // Reject concatenated documents: `{"a":1}{"b":2}` decodes the first
    // value fine but must not be accepted.
    deserializer.end().map_err(|_| {
        ApiError::bad_request("request body must only contain a single JSON object")
    })?;

    Ok(value)
}
