use aws_lambda_events::event::eventbridge::EventBridgeEvent;
use event_sources_core::records::{has_error_marker, payload_from_value, record_id, RecordError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AsyncEventError {
    #[error("simulated failure for item `{id}`")]
    SimulatedFailure { id: String },
    #[error("malformed event: {0}")]
    Malformed(#[from] RecordError),
}

/// Asynchronous invocations have no partial-failure channel. A marked item
/// fails the whole invocation and the platform's retry policy and failure
/// destination take over.
pub fn handle_async_event(envelope: EventBridgeEvent) -> Result<(), AsyncEventError> {
    tracing::info!(component = "async_event", event = ?envelope, "received event");

    let detail = payload_from_value(&envelope.detail)?;
    let id = record_id(detail)?;

    if has_error_marker(id) {
        tracing::error!(
            component = "async_event",
            event_id = ?envelope.id,
            source = ?envelope.source,
            detail_type = ?envelope.detail_type,
            detail = %envelope.detail,
            "event detail carries the error marker"
        );
        return Err(AsyncEventError::SimulatedFailure { id: id.to_string() });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn event(detail: Value) -> EventBridgeEvent {
        serde_json::from_value(json!({
            "version": "0",
            "id": "6a7e8feb-b491-4cf7-a9f1-bf3703467718",
            "detail-type": "NewItem",
            "source": "events-api",
            "account": "111122223333",
            "time": "2024-01-01T00:00:00Z",
            "region": "eu-west-1",
            "resources": [],
            "detail": detail
        }))
        .expect("fixture should be an EventBridge event")
    }

    #[test]
    fn accepts_clean_event() {
        handle_async_event(event(json!({"id": "abc", "something": "value"})))
            .expect("clean event should succeed");
    }

    #[test]
    fn fails_marked_event() {
        let error = handle_async_event(event(json!({"id": "abc_error"})))
            .expect_err("marked event should fail");

        assert!(matches!(
            error,
            AsyncEventError::SimulatedFailure { ref id } if id == "abc_error"
        ));
    }

    #[test]
    fn fails_event_without_detail_id() {
        let error = handle_async_event(event(json!({"something": "value"})))
            .expect_err("event without id should fail");
        assert!(matches!(error, AsyncEventError::Malformed(RecordError::MissingId)));
    }

    #[test]
    fn fails_event_with_non_object_detail() {
        let error = handle_async_event(event(json!(["abc_error"])))
            .expect_err("array detail should fail");
        assert!(matches!(error, AsyncEventError::Malformed(RecordError::NotAnObject)));
    }
}
