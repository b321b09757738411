use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::warn;

use crate::types::QsoId;

/// A scorer, accumulator, or summarizer call that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Input lacked data the handler needs.
    #[error("missing data: {0}")]
    MissingData(String),
    /// Handler-specific failure.
    #[error("{0}")]
    Failed(String),
    /// The call panicked; the payload message is kept.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Result type returned by handler capabilities.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Fire-and-forget sink for isolated handler failures.
pub trait ErrorSink: Send + Sync {
    /// Records one failure. Must not panic.
    fn report_error(&self, message: &str, error: &HandlerError);
}

/// Sink that emits a `tracing` warning per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report_error(&self, message: &str, error: &HandlerError) {
        warn!(%error, "{message}");
    }
}

/// Runs one handler call. Failures and panics go to `errors` and yield `None`.
pub(crate) fn isolate<T>(
    errors: &dyn ErrorSink,
    key: &str,
    qso: Option<QsoId>,
    phase: &str,
    call: impl FnOnce() -> HandlerResult<T>,
) -> Option<T> {
    let result = panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload))));
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            let message = match qso {
                Some(id) => format!("{phase} failed in handler `{key}` for QSO {id}"),
                None => format!("{phase} failed in handler `{key}`"),
            };
            errors.report_error(&message, &error);
            None
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
