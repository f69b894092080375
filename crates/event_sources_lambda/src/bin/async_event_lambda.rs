use aws_lambda_events::event::eventbridge::EventBridgeEvent;
use event_sources_lambda::config::TelemetryConfig;
use event_sources_lambda::handlers::async_event::handle_async_event;
use event_sources_lambda::telemetry::{init_tracing, run_invocation, InvocationContext};
use lambda_runtime::{service_fn, Error, LambdaEvent};

async fn handle_request(
    event: LambdaEvent<EventBridgeEvent>,
    telemetry: &TelemetryConfig,
) -> Result<(), Error> {
    let (payload, context) = event.into_parts();
    let invocation = InvocationContext::from_lambda(&context);

    run_invocation(telemetry, &invocation, &mut std::io::stdout(), |_| {
        handle_async_event(payload).inspect_err(|error| {
            tracing::error!(component = "async_event", error = %error, "invocation failed");
        })
    })
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let telemetry = TelemetryConfig::from_env("async_event", false)?;
    let telemetry = &telemetry;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<EventBridgeEvent>| async move {
        handle_request(event, telemetry).await
    }))
    .await
}
