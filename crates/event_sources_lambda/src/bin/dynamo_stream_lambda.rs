use aws_lambda_events::event::dynamodb::Event;
use aws_lambda_events::event::streams::DynamoDbEventResponse;
use event_sources_lambda::config::TelemetryConfig;
use event_sources_lambda::handlers::dynamo_stream::handle_dynamo_stream_event;
use event_sources_lambda::telemetry::{init_tracing, run_invocation, InvocationContext};
use lambda_runtime::{service_fn, Error, LambdaEvent};

async fn handle_request(
    event: LambdaEvent<Event>,
    telemetry: &TelemetryConfig,
) -> Result<DynamoDbEventResponse, Error> {
    let (payload, context) = event.into_parts();
    let invocation = InvocationContext::from_lambda(&context);

    run_invocation(telemetry, &invocation, &mut std::io::stdout(), |metrics| {
        handle_dynamo_stream_event(payload, metrics).inspect_err(|error| {
            tracing::error!(component = "dynamo_stream", error = %error, "batch failed");
        })
    })
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let telemetry = TelemetryConfig::from_env("dynamo_stream", true)?;
    let telemetry = &telemetry;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Event>| async move {
        handle_request(event, telemetry).await
    }))
    .await
}
