use aws_lambda_events::event::kinesis::KinesisEvent;
use aws_lambda_events::event::streams::KinesisEventResponse;
use event_sources_lambda::config::TelemetryConfig;
use event_sources_lambda::handlers::kinesis_stream::handle_kinesis_stream_event;
use event_sources_lambda::telemetry::{init_tracing, run_invocation, InvocationContext};
use lambda_runtime::{service_fn, Error, LambdaEvent};

async fn handle_request(
    event: LambdaEvent<KinesisEvent>,
    telemetry: &TelemetryConfig,
) -> Result<KinesisEventResponse, Error> {
    let (payload, context) = event.into_parts();
    let invocation = InvocationContext::from_lambda(&context);

    run_invocation(telemetry, &invocation, &mut std::io::stdout(), |_| {
        handle_kinesis_stream_event(payload).inspect_err(|error| {
            tracing::error!(component = "kinesis_stream", error = %error, "batch failed");
        })
    })
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let telemetry = TelemetryConfig::from_env("kinesis_stream", false)?;
    let telemetry = &telemetry;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<KinesisEvent>| async move {
        handle_request(event, telemetry).await
    }))
    .await
}
