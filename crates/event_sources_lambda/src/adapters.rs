use thiserror::Error;

pub mod event_bus;
pub mod queue;
pub mod stream;
pub mod table;

/// Failure reported by a downstream AWS service. The message keeps the SDK
/// detail for logs; callers never show it to API clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{sink} request failed: {message}")]
pub struct SinkError {
    pub sink: &'static str,
    pub message: String,
}

impl SinkError {
    pub fn new(sink: &'static str, message: impl Into<String>) -> Self {
        Self {
            sink,
            message: message.into(),
        }
    }
}
