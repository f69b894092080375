use aws_lambda_events::event::kinesis::KinesisEvent;
use aws_lambda_events::event::streams::{KinesisBatchItemFailure, KinesisEventResponse};
use event_sources_core::records::{has_error_marker, parse_payload_bytes, record_id, RecordError};

/// Like the DynamoDB stream consumer, reports only the first marked record:
/// Kinesis resumes the shard from that sequence number.
pub fn handle_kinesis_stream_event(
    event: KinesisEvent,
) -> Result<KinesisEventResponse, RecordError> {
    tracing::info!(
        component = "kinesis_stream",
        records = event.records.len(),
        event = ?event,
        "received batch"
    );

    for record in event.records {
        let item = parse_payload_bytes(&record.kinesis.data)?;

        if has_error_marker(record_id(&item)?) {
            tracing::error!(
                component = "kinesis_stream",
                sequence_number = ?record.kinesis.sequence_number,
                item = %serde_json::Value::Object(item),
                "stream item carries the error marker"
            );
            return Ok(KinesisEventResponse {
                batch_item_failures: vec![KinesisBatchItemFailure {
                    item_identifier: record.kinesis.sequence_number.into(),
                }],
            });
        }
    }

    Ok(KinesisEventResponse {
        batch_item_failures: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::{json, Value};

    use super::*;

    fn record(sequence_number: &str, data: &[u8]) -> Value {
        json!({
            "kinesis": {
                "kinesisSchemaVersion": "1.0",
                "partitionKey": "pk",
                "sequenceNumber": sequence_number,
                "data": STANDARD.encode(data),
                "approximateArrivalTimestamp": 1_700_000_000.5
            },
            "eventSource": "aws:kinesis",
            "eventVersion": "1.0",
            "eventID": format!("shardId-000000000000:{sequence_number}"),
            "eventName": "aws:kinesis:record",
            "invokeIdentityArn": "arn:aws:iam::111122223333:role/consumer",
            "awsRegion": "eu-west-1",
            "eventSourceARN": "arn:aws:kinesis:eu-west-1:111122223333:stream/items"
        })
    }

    fn item(sequence_number: &str, id: &str) -> Value {
        record(
            sequence_number,
            json!({"id": id, "something": "value"}).to_string().as_bytes(),
        )
    }

    fn batch(records: Vec<Value>) -> KinesisEvent {
        serde_json::from_value(json!({ "Records": records }))
            .expect("fixture should be a Kinesis event")
    }

    fn failures(response: &KinesisEventResponse) -> Value {
        serde_json::to_value(response).expect("response should serialize")["batchItemFailures"]
            .clone()
    }

    #[test]
    fn clean_batch_reports_no_failures() {
        let response =
            handle_kinesis_stream_event(batch(vec![item("4950", "a"), item("4951", "b")]))
                .expect("batch should be processed");

        assert_eq!(failures(&response), json!([]));
    }

    #[test]
    fn reports_only_first_marked_record() {
        let response = handle_kinesis_stream_event(batch(vec![
            item("4950", "a"),
            item("4951", "b_error"),
            item("4952", "c_error"),
        ]))
        .expect("batch should be processed");

        assert_eq!(failures(&response), json!([{"itemIdentifier": "4951"}]));
    }

    #[test]
    fn records_after_the_failure_are_not_evaluated() {
        let response = handle_kinesis_stream_event(batch(vec![
            item("4950", "first_error"),
            record("4951", b"not json at all"),
        ]))
        .expect("batch should stop before the undecodable record");

        assert_eq!(failures(&response), json!([{"itemIdentifier": "4950"}]));
    }

    #[test]
    fn undecodable_data_fails_the_batch() {
        let error = handle_kinesis_stream_event(batch(vec![record("1", b"plain text")]))
            .expect_err("non-json data should fail");

        assert!(matches!(error, RecordError::InvalidJson(_)));
    }
}
