//! Log and metric plumbing shared by every function binary.
//!
//! Logs are JSON lines from `tracing-subscriber`. Each invocation runs in a
//! span carrying the Lambda context, and metrics recorded during the
//! invocation are written as one EMF document on stdout when it ends.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use event_sources_core::metrics::MetricsRecorder;
use tracing::Span;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

static COLD_START: ColdStart = ColdStart::new();

/// Installs the global JSON subscriber. `RUST_LOG` wins over `LOG_LEVEL`;
/// both fall back to `info`.
pub fn init_tracing() {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(false)
        .init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub function_name: String,
    pub correlation_id: Option<String>,
    pub cold_start: bool,
}

impl InvocationContext {
    /// Consumes the process-wide cold start flag.
    pub fn from_lambda(context: &lambda_runtime::Context) -> Self {
        Self {
            request_id: context.request_id.clone(),
            function_name: context.env_config.function_name.clone(),
            correlation_id: None,
            cold_start: COLD_START.take(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}

/// Set until the first invocation served by this process takes it.
#[derive(Debug)]
pub struct ColdStart(AtomicBool);

impl ColdStart {
    pub const fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

impl Default for ColdStart {
    fn default() -> Self {
        Self::new()
    }
}

pub fn invocation_span(service: &str, context: &InvocationContext) -> Span {
    tracing::info_span!(
        "invocation",
        service = %service,
        request_id = %context.request_id,
        function_name = %context.function_name,
        correlation_id = context.correlation_id.as_deref(),
        cold_start = context.cold_start,
    )
}

/// Runs `handler` inside the invocation span with a fresh recorder, then
/// writes whatever it recorded to `metrics_out`. The flush happens whether
/// the handler succeeded or not.
pub fn run_invocation<R>(
    telemetry: &TelemetryConfig,
    context: &InvocationContext,
    metrics_out: &mut impl Write,
    handler: impl FnOnce(&mut MetricsRecorder) -> R,
) -> R {
    let span = invocation_span(&telemetry.service_name, context);
    let mut metrics = telemetry.metrics_recorder();

    let output = span.in_scope(|| handler(&mut metrics));

    let timestamp_ms = chrono::Utc::now().timestamp_millis();
    if let Err(error) = write_metrics(&mut metrics, timestamp_ms, metrics_out) {
        span.in_scope(|| tracing::warn!(error = %error, "failed to write metrics document"));
    }
    output
}

/// Writes the pending EMF document as a single line. Nothing is written
/// when no metric was recorded.
pub fn write_metrics(
    metrics: &mut MetricsRecorder,
    timestamp_ms: i64,
    sink: &mut impl Write,
) -> std::io::Result<()> {
    let Some(document) = metrics.flush(timestamp_ms) else {
        return Ok(());
    };
    writeln!(sink, "{document}")?;
    sink.flush()
}
