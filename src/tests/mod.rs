//! End-to-end tests for the full middleware pipeline: logging, reporter,
//! schema validation, body decoding, and error rendering composed the way a
//! real service wires them.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Router,
    body::Body,
    extract::Request,
    http::{Method, StatusCode, header, request::Parts},
    middleware,
    response::Response,
    routing::post,
};
use http_body_util::BodyExt;
use serde::Deserialize;
use tower::ServiceExt;

use crate::{
    body::decode_json_body,
    error::{ApiError, ErrorResponse},
    middleware::{REQUEST_ID_HEADER, SchemaValidator, log_requests, validate_request},
    reporter::{ErrorReporter, Reporter},
    response::{json_response, render_error},
    schema::{Operation, RouteError, SchemaDocument, ValidationFailure, ValidationOptions},
};

#[derive(Default)]
struct RecordingReporter {
    seen: Mutex<Vec<String>>,
}

impl ErrorReporter for Arc<RecordingReporter> {
    fn report(&self, error: &(dyn StdError + 'static)) {
        self.seen.lock().unwrap().push(error.to_string());
    }
}

/// Contract with a single operation, `POST /orders`, that requires an api
/// key header and a JSON content type.
struct OrdersContract;

impl SchemaDocument for OrdersContract {
    fn find_operation(&self, method: &Method, path: &str) -> Result<Operation, RouteError> {
        if method == Method::POST && path == "/orders" {
            Ok(Operation::new(Some("createOrder".to_string()))
                .with_path_params(HashMap::new()))
        } else {
            Err(RouteError(format!("no matching operation for {method} {path}")))
        }
    }

    fn validate(
        &self,
        parts: &Parts,
        _body: &[u8],
        _operation: &Operation,
        options: &ValidationOptions,
    ) -> Result<(), ValidationFailure> {
        if !options.skip_security && !parts.headers.contains_key("x-api-key") {
            return Err(ValidationFailure::Security(
                "security requirements failed: x-api-key header missing".to_string(),
            ));
        }
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if content_type != "application/json" {
            return Err(ValidationFailure::request(format!(
                "header Content-Type has unexpected value: \"{content_type}\"\nexpected application/json"
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct CreateOrder {
    item: String,
    quantity: u32,
}

async fn create_order(req: Request) -> Response {
    let extensions = req.extensions().clone();
    let order: CreateOrder = match decode_json_body(req).await {
        Ok(order) => order,
        Err(err) => return render_error(&extensions, &err),
    };
    if order.quantity == 0 {
        return render_error(
            &extensions,
            &ApiError::bad_request("quantity must be at least 1"),
        );
    }
    if order.item == "unobtainium" {
        // Deliberately unclassified to exercise the opaque-500 path.
        return render_error(&extensions, &std::io::Error::other("inventory db offline"));
    }
    json_response(
        StatusCode::CREATED,
        &serde_json::json!({ "item": order.item, "quantity": order.quantity }),
    )
}

fn app(reporter: Arc<RecordingReporter>) -> Router {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let validator = SchemaValidator::new(Arc::new(OrdersContract));
    Router::new()
        .route("/orders", post(create_order))
        .layer(middleware::from_fn_with_state(validator, validate_request))
        .layer(Extension(Reporter::new(reporter)))
        .layer(middleware::from_fn(log_requests))
}

fn request(path: &str, body: &str, content_type: Option<&str>, api_key: bool) -> Request {
    let mut builder = axum::http::Request::builder().method(Method::POST).uri(path);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if api_key {
        builder = builder.header("x-api-key", "sk-test");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn error_body(response: Response) -> ErrorResponse {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_happy_path_passes_validation_and_decodes_body() {
    let reporter = Arc::new(RecordingReporter::default());
    let response = app(Arc::clone(&reporter))
        .oneshot(request(
            "/orders",
            r#"{"item": "bolt", "quantity": 4}"#,
            Some("application/json"),
            true,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["item"], "bolt");
    assert_eq!(value["quantity"], 4);
    assert!(reporter.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_route_miss_never_reaches_handler() {
    let reporter = Arc::new(RecordingReporter::default());
    let response = app(Arc::clone(&reporter))
        .oneshot(request("/invoices", "{}", Some("application/json"), true))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(body.error, "no matching operation for POST /invoices");
    assert_eq!(
        reporter.seen.lock().unwrap().as_slice(),
        ["no matching operation for POST /invoices"]
    );
}

#[tokio::test]
async fn test_missing_credentials_is_401() {
    let reporter = Arc::new(RecordingReporter::default());
    let response = app(reporter)
        .oneshot(request("/orders", "{}", Some("application/json"), false))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = error_body(response).await;
    assert_eq!(
        body.error,
        "security requirements failed: x-api-key header missing"
    );
}

#[tokio::test]
async fn test_validator_diagnostic_truncated_to_first_line() {
    let reporter = Arc::new(RecordingReporter::default());
    let response = app(reporter)
        .oneshot(request("/orders", "{}", Some("text/plain"), true))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(
        body.error,
        "header Content-Type has unexpected value: \"text/plain\""
    );
    assert!(!body.error.contains("expected application/json"));
}

#[tokio::test]
async fn test_malformed_body_rejected_by_decoder() {
    let reporter = Arc::new(RecordingReporter::default());
    let response = app(Arc::clone(&reporter))
        .oneshot(request("/orders", "{", Some("application/json"), true))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(body.error, "request body contains badly-formed JSON");
    // The extractor's rejection also went through the dispatcher.
    assert_eq!(
        reporter.seen.lock().unwrap().as_slice(),
        ["request body contains badly-formed JSON"]
    );
}

#[tokio::test]
async fn test_unclassified_handler_error_is_opaque_to_clients() {
    let reporter = Arc::new(RecordingReporter::default());
    let response = app(Arc::clone(&reporter))
        .oneshot(request(
            "/orders",
            r#"{"item": "unobtainium", "quantity": 1}"#,
            Some("application/json"),
            true,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(response).await;
    assert_eq!(body.error, "Internal Server Error");

    // Operators still get the real failure through the reporter.
    assert_eq!(
        reporter.seen.lock().unwrap().as_slice(),
        ["inventory db offline"]
    );
}

#[tokio::test]
async fn test_classified_handler_error_keeps_its_message() {
    let reporter = Arc::new(RecordingReporter::default());
    let response = app(reporter)
        .oneshot(request(
            "/orders",
            r#"{"item": "bolt", "quantity": 0}"#,
            Some("application/json"),
            true,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(body.error, "quantity must be at least 1");
}
