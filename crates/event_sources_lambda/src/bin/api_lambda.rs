use aws_sdk_kinesis::primitives::Blob;
use event_sources_core::contract::{ApiGatewayResponse, Payload};
use event_sources_lambda::adapters::event_bus::{EventBus, EventEntry};
use event_sources_lambda::adapters::queue::MessageQueue;
use event_sources_lambda::adapters::stream::RecordStream;
use event_sources_lambda::adapters::table::{to_item, ItemTable};
use event_sources_lambda::adapters::SinkError;
use event_sources_lambda::config::{ApiConfig, TelemetryConfig};
use event_sources_lambda::handlers::api::{handle_api_event, ApiSinks};
use event_sources_lambda::telemetry::{init_tracing, run_invocation, InvocationContext};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct DynamoTable {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl ItemTable for DynamoTable {
    fn put_item(&self, item: &Payload) -> Result<(), SinkError> {
        let client = self.client.clone();
        let table_name = self.table_name.clone();
        let item = to_item(item)?;

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_item()
                    .table_name(table_name)
                    .set_item(Some(item))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| SinkError::new("dynamodb", format!("put_item: {error:?}")))
            })
        })
    }
}

struct SqsQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl MessageQueue for SqsQueue {
    fn send_message(&self, body: &str) -> Result<(), SinkError> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();
        let body = body.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .send_message()
                    .queue_url(queue_url)
                    .message_body(body)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| SinkError::new("sqs", format!("send_message: {error:?}")))
            })
        })
    }
}

struct EventBridgeBus {
    client: aws_sdk_eventbridge::Client,
    event_bus_name: String,
}

impl EventBus for EventBridgeBus {
    fn put_event(&self, entry: &EventEntry) -> Result<(), SinkError> {
        let client = self.client.clone();
        let request_entry = aws_sdk_eventbridge::types::PutEventsRequestEntry::builder()
            .source(entry.source.clone())
            .detail_type(entry.detail_type.clone())
            .detail(entry.detail.clone())
            .event_bus_name(self.event_bus_name.clone())
            .build();

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_events()
                    .entries(request_entry)
                    .send()
                    .await
                    .map_err(|error| {
                        SinkError::new("eventbridge", format!("put_events: {error:?}"))
                    })
            })
        })?;

        // Rejected entries come back in a successful response.
        for rejected in output.entries().iter().filter(|entry| entry.error_code().is_some()) {
            tracing::warn!(
                component = "api",
                error_code = rejected.error_code(),
                error_message = rejected.error_message(),
                "event bus rejected entry"
            );
        }
        Ok(())
    }
}

struct KinesisStream {
    client: aws_sdk_kinesis::Client,
    stream_name: String,
}

impl RecordStream for KinesisStream {
    fn put_record(&self, data: &[u8], partition_key: &str) -> Result<(), SinkError> {
        let client = self.client.clone();
        let stream_name = self.stream_name.clone();
        let data = Blob::new(data.to_vec());
        let partition_key = partition_key.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_record()
                    .stream_name(stream_name)
                    .data(data)
                    .partition_key(partition_key)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| SinkError::new("kinesis", format!("put_record: {error:?}")))
            })
        })
    }
}

struct RuntimeDependencies {
    telemetry: TelemetryConfig,
    table: DynamoTable,
    queue: SqsQueue,
    event_bus: EventBridgeBus,
    stream: KinesisStream,
}

impl RuntimeDependencies {
    fn sinks(&self) -> ApiSinks<'_> {
        ApiSinks {
            table: &self.table,
            queue: &self.queue,
            event_bus: &self.event_bus,
            stream: &self.stream,
        }
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ApiGatewayResponse, Error> {
    let (payload, context) = event.into_parts();
    let correlation_id = payload
        .pointer("/requestContext/requestId")
        .and_then(Value::as_str)
        .map(str::to_string);
    let invocation = InvocationContext::from_lambda(&context).with_correlation_id(correlation_id);

    Ok(run_invocation(
        &deps.telemetry,
        &invocation,
        &mut std::io::stdout(),
        |metrics| handle_api_event(payload, &deps.sinks(), metrics),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let telemetry = TelemetryConfig::from_env("api", true)?;
    let config = ApiConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let deps = RuntimeDependencies {
        telemetry,
        table: DynamoTable {
            client: aws_sdk_dynamodb::Client::new(&aws_config),
            table_name: config.table_name,
        },
        queue: SqsQueue {
            client: aws_sdk_sqs::Client::new(&aws_config),
            queue_url: config.queue_url,
        },
        event_bus: EventBridgeBus {
            client: aws_sdk_eventbridge::Client::new(&aws_config),
            event_bus_name: config.event_bus_name,
        },
        stream: KinesisStream {
            client: aws_sdk_kinesis::Client::new(&aws_config),
            stream_name: config.stream_name,
        },
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps).await
    }))
    .await
}
