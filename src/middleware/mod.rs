mod logging;
mod validator;

pub use logging::{REQUEST_ID_HEADER, RequestId, log_requests};
pub use validator::{SchemaValidator, validate_request};
