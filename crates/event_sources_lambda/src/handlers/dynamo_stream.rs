use aws_lambda_events::event::dynamodb::Event;
use aws_lambda_events::event::streams::{DynamoDbBatchItemFailure, DynamoDbEventResponse};
use event_sources_core::metrics::{stream_metric_name, MetricsRecorder};
use event_sources_core::records::{decode_image, has_error_marker, record_id, RecordError};

/// Counts every change by event name and inspects the new image of inserts
/// and updates. Stream shards are ordered, so the first marked record is
/// reported alone and the rest of the batch is left for redelivery.
pub fn handle_dynamo_stream_event(
    event: Event,
    metrics: &mut MetricsRecorder,
) -> Result<DynamoDbEventResponse, RecordError> {
    tracing::info!(
        component = "dynamo_stream",
        records = event.records.len(),
        event = ?event,
        "received batch"
    );

    for record in event.records {
        let metric = stream_metric_name(&record.event_name)
            .ok_or_else(|| RecordError::UnknownEventName(record.event_name.clone()))?;
        metrics.increment(metric);

        if !matches!(record.event_name.as_str(), "INSERT" | "MODIFY") {
            continue;
        }

        let item = decode_image(&record.change.new_image)?;
        if has_error_marker(record_id(&item)?) {
            let sequence_number = record
                .change
                .sequence_number
                .ok_or(RecordError::MissingField("SequenceNumber"))?;
            tracing::error!(
                component = "dynamo_stream",
                sequence_number = %sequence_number,
                item = %serde_json::Value::Object(item),
                "stream item carries the error marker"
            );
            return Ok(DynamoDbEventResponse {
                batch_item_failures: vec![DynamoDbBatchItemFailure {
                    item_identifier: sequence_number.into(),
                }],
            });
        }
    }

    Ok(DynamoDbEventResponse {
        batch_item_failures: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use event_sources_core::metrics::{STREAM_DELETE_ITEM, STREAM_NEW_ITEM, STREAM_UPDATE_ITEM};
    use serde_json::{json, Value};

    use super::*;

    fn stream_record(event_name: &str, sequence_number: &str, change: Value) -> Value {
        let mut dynamodb = json!({
            "ApproximateCreationDateTime": 1_700_000_000.0,
            "SequenceNumber": sequence_number,
            "SizeBytes": 59,
            "StreamViewType": "NEW_AND_OLD_IMAGES"
        });
        if let (Some(target), Value::Object(extra)) = (dynamodb.as_object_mut(), change) {
            target.extend(extra);
        }
        json!({
            "eventID": format!("evt-{sequence_number}"),
            "eventName": event_name,
            "eventVersion": "1.1",
            "eventSource": "aws:dynamodb",
            "awsRegion": "eu-west-1",
            "eventSourceARN": "arn:aws:dynamodb:eu-west-1:111122223333:table/items/stream/2024",
            "dynamodb": dynamodb
        })
    }

    fn change(event_name: &str, sequence_number: &str, id: &str) -> Value {
        stream_record(
            event_name,
            sequence_number,
            json!({
                "Keys": {"id": {"S": id}},
                "NewImage": {"id": {"S": id}, "something": {"S": "value"}}
            }),
        )
    }

    fn removal(sequence_number: &str, id: &str) -> Value {
        stream_record(
            "REMOVE",
            sequence_number,
            json!({
                "Keys": {"id": {"S": id}},
                "OldImage": {"id": {"S": id}}
            }),
        )
    }

    fn batch(records: Vec<Value>) -> Event {
        serde_json::from_value(json!({ "Records": records }))
            .expect("fixture should be a DynamoDB stream event")
    }

    fn failures(response: &DynamoDbEventResponse) -> Value {
        serde_json::to_value(response).expect("response should serialize")["batchItemFailures"]
            .clone()
    }

    fn recorder() -> MetricsRecorder {
        MetricsRecorder::new("EventSources")
    }

    #[test]
    fn clean_batch_reports_no_failures() {
        let mut metrics = recorder();
        let response = handle_dynamo_stream_event(
            batch(vec![change("INSERT", "100", "a"), change("MODIFY", "101", "a")]),
            &mut metrics,
        )
        .expect("batch should be processed");

        assert_eq!(failures(&response), json!([]));
        assert_eq!(metrics.total(STREAM_NEW_ITEM), 1.0);
        assert_eq!(metrics.total(STREAM_UPDATE_ITEM), 1.0);
    }

    #[test]
    fn stops_at_first_marked_record() {
        let mut metrics = recorder();
        let response = handle_dynamo_stream_event(
            batch(vec![
                change("INSERT", "100", "a"),
                change("INSERT", "101", "b_error"),
                change("INSERT", "102", "c_error"),
                change("NOT_EVALUATED", "103", "d"),
            ]),
            &mut metrics,
        )
        .expect("batch should be processed");

        assert_eq!(failures(&response), json!([{"itemIdentifier": "101"}]));
        assert_eq!(metrics.total(STREAM_NEW_ITEM), 2.0);
    }

    #[test]
    fn removals_are_counted_but_not_inspected() {
        let mut metrics = recorder();
        let response = handle_dynamo_stream_event(
            batch(vec![removal("200", "gone_error"), change("INSERT", "201", "fine")]),
            &mut metrics,
        )
        .expect("batch should be processed");

        assert_eq!(failures(&response), json!([]));
        assert_eq!(metrics.total(STREAM_DELETE_ITEM), 1.0);
        assert_eq!(metrics.total(STREAM_NEW_ITEM), 1.0);
    }

    #[test]
    fn unknown_event_name_fails_the_batch() {
        let error = handle_dynamo_stream_event(
            batch(vec![change("TRUNCATE", "1", "a")]),
            &mut recorder(),
        )
        .expect_err("unknown event name should fail");

        assert!(matches!(error, RecordError::UnknownEventName(ref name) if name == "TRUNCATE"));
    }

    #[test]
    fn insert_without_new_image_fails_the_batch() {
        let error = handle_dynamo_stream_event(
            batch(vec![stream_record("INSERT", "1", json!({"Keys": {"id": {"S": "a"}}}))]),
            &mut recorder(),
        )
        .expect_err("insert without image should fail");

        assert!(matches!(error, RecordError::MissingImage));
    }

    #[test]
    fn empty_batch_succeeds() {
        let response = handle_dynamo_stream_event(batch(Vec::new()), &mut recorder())
            .expect("empty batch should be processed");
        assert_eq!(failures(&response), json!([]));
    }
}
