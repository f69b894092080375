use aws_lambda_events::event::sqs::{SqsBatchResponse, SqsEvent};
use event_sources_lambda::config::TelemetryConfig;
use event_sources_lambda::handlers::sqs::handle_sqs_event;
use event_sources_lambda::telemetry::{init_tracing, run_invocation, InvocationContext};
use lambda_runtime::{service_fn, Error, LambdaEvent};

async fn handle_request(
    event: LambdaEvent<SqsEvent>,
    telemetry: &TelemetryConfig,
) -> Result<SqsBatchResponse, Error> {
    let (payload, context) = event.into_parts();
    let invocation = InvocationContext::from_lambda(&context);

    run_invocation(telemetry, &invocation, &mut std::io::stdout(), |_| {
        handle_sqs_event(payload).inspect_err(|error| {
            tracing::error!(component = "sqs", error = %error, "batch failed");
        })
    })
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let telemetry = TelemetryConfig::from_env("sqs", false)?;
    let telemetry = &telemetry;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        handle_request(event, telemetry).await
    }))
    .await
}
