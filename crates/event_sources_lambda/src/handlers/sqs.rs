use aws_lambda_events::event::sqs::{BatchItemFailure, SqsBatchResponse, SqsEvent};
use event_sources_core::records::{has_error_marker, parse_payload, record_id, RecordError};

/// SQS retries individual messages, so unlike the stream consumers every
/// marked message in the batch is reported.
pub fn handle_sqs_event(event: SqsEvent) -> Result<SqsBatchResponse, RecordError> {
    tracing::info!(
        component = "sqs",
        records = event.records.len(),
        event = ?event,
        "received batch"
    );

    let mut batch_item_failures = Vec::new();
    let mut batch_ids = Vec::with_capacity(event.records.len());

    for message in event.records {
        let body = message.body.as_deref().ok_or(RecordError::MissingField("body"))?;
        let payload = parse_payload(body)?;
        let id = record_id(&payload)?;
        batch_ids.push(id.to_string());

        if has_error_marker(id) {
            let message_id = message
                .message_id
                .ok_or(RecordError::MissingField("messageId"))?;
            batch_item_failures.push(BatchItemFailure {
                item_identifier: message_id,
            });
        }
    }

    tracing::debug!(component = "sqs", batch_ids = ?batch_ids, "processed batch");
    if !batch_item_failures.is_empty() {
        tracing::error!(
            component = "sqs",
            failed = ?batch_item_failures,
            "messages carry the error marker"
        );
    }

    Ok(SqsBatchResponse {
        batch_item_failures,
    })
}
