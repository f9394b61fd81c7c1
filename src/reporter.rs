//! Optional error reporter reached through request extensions.
//!
//! When a [`Reporter`] is present, [`crate::response::render_error`]
//! forwards every error to it before rendering -- crash trackers and
//! alerting sinks plug in here without the handlers knowing about them.

use std::error::Error as StdError;
use std::sync::Arc;

use http::Extensions;

/// Sink for raw error values.
///
/// Called fire-and-forget on the response path: implementations must not
/// panic and must not block. Queue the error and return.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, error: &(dyn StdError + 'static));
}

/// Cloneable handle to an [`ErrorReporter`], stored as a request extension.
#[derive(Clone)]
pub struct Reporter(Arc<dyn ErrorReporter>);

impl Reporter {
    pub fn new(reporter: impl ErrorReporter) -> Self {
        Self(Arc::new(reporter))
    }

    pub fn report(&self, error: &(dyn StdError + 'static)) {
        self.0.report(error);
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Reporter")
    }
}

/// The reporter from the request extensions, if one was attached.
pub fn get(extensions: &Extensions) -> Option<Reporter> {
    extensions.get::<Reporter>().cloned()
}

/// Attaches a reporter so [`crate::response::render_error`] forwards errors
/// to it. Typically added once via `axum::Extension` when building the app.
pub fn set(extensions: &mut Extensions, reporter: Reporter) {
    extensions.insert(reporter);
}
