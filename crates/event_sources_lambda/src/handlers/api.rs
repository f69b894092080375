use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use event_sources_core::contract::{
    ApiGatewayRequest, ApiGatewayResponse, ForwardedResponse, Payload, ServiceError,
};
use event_sources_core::metrics::{
    MetricsRecorder, API_ERROR_DYNAMO, API_ERROR_EVENTS, API_ERROR_KINESIS, API_ERROR_SIMULATED,
    API_ERROR_SQS,
};
use event_sources_core::records::{ensure_id, parse_payload, RecordError};
use serde_json::Value;
use thiserror::Error;

use crate::adapters::event_bus::{EventBus, EventEntry};
use crate::adapters::queue::MessageQueue;
use crate::adapters::stream::RecordStream;
use crate::adapters::table::ItemTable;
use crate::adapters::SinkError;

/// Downstream services the façade forwards to, one per POST route.
#[derive(Clone, Copy)]
pub struct ApiSinks<'a> {
    pub table: &'a dyn ItemTable,
    pub queue: &'a dyn MessageQueue,
    pub event_bus: &'a dyn EventBus,
    pub stream: &'a dyn RecordStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SimulatedError,
    Dynamo,
    Sqs,
    Kinesis,
    Events,
}

impl Route {
    pub fn resolve(method: &str, path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        match (method.to_ascii_uppercase().as_str(), path) {
            ("GET", "/error") => Some(Self::SimulatedError),
            ("POST", "/dynamo") => Some(Self::Dynamo),
            ("POST", "/sqs") => Some(Self::Sqs),
            ("POST", "/kinesis") => Some(Self::Kinesis),
            ("POST", "/events") => Some(Self::Events),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SimulatedError => "error",
            Self::Dynamo => "dynamo",
            Self::Sqs => "sqs",
            Self::Kinesis => "kinesis",
            Self::Events => "events",
        }
    }

    pub fn error_metric(self) -> &'static str {
        match self {
            Self::SimulatedError => API_ERROR_SIMULATED,
            Self::Dynamo => API_ERROR_DYNAMO,
            Self::Sqs => API_ERROR_SQS,
            Self::Kinesis => API_ERROR_KINESIS,
            Self::Events => API_ERROR_EVENTS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("demo error")]
    Simulated,
    #[error("request body is missing")]
    MissingBody,
    #[error("request body is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("request body is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] RecordError),
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("partition key must be a string id, got {0}")]
    PartitionKey(Value),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Routes one API Gateway proxy event. Failures never escape as errors:
/// they are logged, counted, and answered with the fixed 502 body.
pub fn handle_api_event(
    event: Value,
    sinks: &ApiSinks<'_>,
    metrics: &mut MetricsRecorder,
) -> ApiGatewayResponse {
    let request = match serde_json::from_value::<ApiGatewayRequest>(event) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(component = "api", error = %error, "unrecognised proxy event");
            return ServiceError::not_found().into_response();
        }
    };

    let Some(route) = Route::resolve(&request.http_method, &request.path) else {
        tracing::info!(
            component = "api",
            method = %request.http_method,
            path = %request.path,
            "no route matched"
        );
        return ServiceError::not_found().into_response();
    };

    match forward(route, &request, sinks) {
        Ok(id) => ApiGatewayResponse::json(200, &ForwardedResponse { result: id }),
        Err(error) => {
            tracing::error!(
                component = "api",
                route = route.name(),
                error = %error,
                "request failed"
            );
            metrics.increment(route.error_metric());
            ServiceError::bad_gateway().into_response()
        }
    }
}

#[tracing::instrument(skip_all, fields(route = route.name()))]
fn forward(
    route: Route,
    request: &ApiGatewayRequest,
    sinks: &ApiSinks<'_>,
) -> Result<Value, ForwardError> {
    match route {
        Route::SimulatedError => Err(ForwardError::Simulated),
        Route::Dynamo => forward_body(request, |body, _| Ok(sinks.table.put_item(body)?)),
        Route::Sqs => forward_body(request, |body, _| {
            Ok(sinks.queue.send_message(&serde_json::to_string(body)?)?)
        }),
        Route::Events => forward_body(request, |body, _| {
            let entry = EventEntry::new_item(serde_json::to_string(body)?);
            Ok(sinks.event_bus.put_event(&entry)?)
        }),
        Route::Kinesis => forward_body(request, |body, id| {
            let partition_key = id
                .as_str()
                .ok_or_else(|| ForwardError::PartitionKey(id.clone()))?;
            Ok(sinks
                .stream
                .put_record(&serde_json::to_vec(body)?, partition_key)?)
        }),
    }
}

/// Reads the request body, assigns an id when it has none, and hands both
/// to `send`. Returns the id the forwarded payload carries.
fn forward_body(
    request: &ApiGatewayRequest,
    send: impl FnOnce(&Payload, &Value) -> Result<(), ForwardError>,
) -> Result<Value, ForwardError> {
    let mut body = request_body(request)?;
    let id = ensure_id(&mut body);
    send(&body, &id)?;
    Ok(id)
}

fn request_body(request: &ApiGatewayRequest) -> Result<Payload, ForwardError> {
    let Some(body) = request.body.as_deref() else {
        return Err(ForwardError::MissingBody);
    };

    if request.is_base64_encoded {
        let bytes = STANDARD.decode(body.trim())?;
        let text = String::from_utf8(bytes).map_err(|_| ForwardError::InvalidUtf8)?;
        return Ok(parse_payload(&text)?);
    }

    Ok(parse_payload(body)?)
}
