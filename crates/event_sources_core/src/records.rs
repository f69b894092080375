use serde_json::Value;
use thiserror::Error;

use crate::contract::Payload;

pub const ID_FIELD: &str = "id";

/// Substring that marks a record as a simulated processing failure.
pub const ERROR_MARKER: &str = "error";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record has no `{0}`")]
    MissingField(&'static str),
    #[error("record payload has no `id` field")]
    MissingId,
    #[error("record `id` must be a string, got {0}")]
    NonStringId(Value),
    #[error("record payload must be a JSON object")]
    NotAnObject,
    #[error("record payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unsupported stream event name `{0}`")]
    UnknownEventName(String),
    #[error("stream record has no new image")]
    MissingImage,
    #[error("stream image is not a valid item: {0}")]
    InvalidImage(#[from] serde_dynamo::Error),
}

/// Assigns a fresh UUID v4 `id` when the payload has none and returns the
/// id the payload now carries. An existing id is left untouched.
pub fn ensure_id(payload: &mut Payload) -> Value {
    payload
        .entry(ID_FIELD)
        .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()))
        .clone()
}

pub fn record_id(payload: &Payload) -> Result<&str, RecordError> {
    match payload.get(ID_FIELD) {
        None => Err(RecordError::MissingId),
        Some(Value::String(id)) => Ok(id),
        Some(other) => Err(RecordError::NonStringId(other.clone())),
    }
}

pub fn has_error_marker(id: &str) -> bool {
    id.contains(ERROR_MARKER)
}

pub fn parse_payload(text: &str) -> Result<Payload, RecordError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(RecordError::NotAnObject),
    }
}

pub fn payload_from_value(value: &Value) -> Result<&Payload, RecordError> {
    value.as_object().ok_or(RecordError::NotAnObject)
}

/// Kinesis hands over the producer's bytes already base64 decoded.
pub fn parse_payload_bytes(data: &[u8]) -> Result<Payload, RecordError> {
    match serde_json::from_slice::<Value>(data)? {
        Value::Object(map) => Ok(map),
        _ => Err(RecordError::NotAnObject),
    }
}

/// Decodes a DynamoDB stream image. Removals and keys-only streams deliver
/// no image, which arrives as an empty item.
pub fn decode_image(image: &serde_dynamo::Item) -> Result<Payload, RecordError> {
    let item: Payload = serde_dynamo::from_item(image.clone())?;
    if item.is_empty() {
        return Err(RecordError::MissingImage);
    }
    Ok(item)
}
