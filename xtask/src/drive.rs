//! Exercises a deployed stack the way a client would: one clean and one
//! error-marked request per forwarding route, then the always-failing route.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};

pub const SAM_CONFIG_FILE: &str = "samconfig.toml";
pub const ENDPOINT_OUTPUT_KEY: &str = "ApiEndpoint";
pub const DRIVEN_ROUTES: [&str; 4] = ["sqs", "dynamo", "kinesis", "events"];

#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Post { path: String, body: Value },
    Get { path: String },
}

impl DriverCall {
    pub fn path(&self) -> &str {
        match self {
            Self::Post { path, .. } | Self::Get { path } => path,
        }
    }
}

/// Builds the full call sequence. `error_id` supplies the id injected into
/// each failing request.
pub fn driver_plan(mut error_id: impl FnMut() -> String) -> Vec<DriverCall> {
    let mut calls = Vec::with_capacity(DRIVEN_ROUTES.len() * 2 + 1);
    for route in DRIVEN_ROUTES {
        calls.push(DriverCall::Post {
            path: route.to_string(),
            body: json!({"something": "value"}),
        });
        calls.push(DriverCall::Post {
            path: route.to_string(),
            body: json!({"something": "value", "id": error_id()}),
        });
    }
    calls.push(DriverCall::Get {
        path: "error".to_string(),
    });
    calls
}

pub fn marked_error_id() -> String {
    format!("{}_error", uuid::Uuid::new_v4())
}

pub fn stack_name(samconfig: &str, config_name: &str) -> Result<String> {
    let table: toml::Table =
        toml::from_str(samconfig).context("samconfig.toml is not valid TOML")?;
    table
        .get(config_name)
        .and_then(|config| config.get("deploy"))
        .and_then(|deploy| deploy.get("parameters"))
        .and_then(|parameters| parameters.get("stack_name"))
        .and_then(toml::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no [{config_name}.deploy.parameters] stack_name in samconfig"))
}

pub fn join_url(endpoint: &str, path: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn run(config_name: &str) -> Result<()> {
    let samconfig = std::fs::read_to_string(SAM_CONFIG_FILE)
        .with_context(|| format!("failed to read {SAM_CONFIG_FILE}"))?;
    let stack = stack_name(&samconfig, config_name)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async {
        let endpoint = resolve_endpoint(&stack).await?;
        eprintln!("Driving {endpoint} (stack {stack})");

        let client = reqwest::Client::new();
        for call in driver_plan(marked_error_id) {
            let body = execute(&client, &endpoint, &call).await?;
            println!("{body}");
        }
        Ok::<(), anyhow::Error>(())
    })
}

async fn resolve_endpoint(stack: &str) -> Result<String> {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_cloudformation::Client::new(&config);
    let response = client
        .describe_stacks()
        .stack_name(stack)
        .send()
        .await
        .with_context(|| format!("failed to describe stack {stack}"))?;

    response
        .stacks()
        .first()
        .and_then(|found| {
            found
                .outputs()
                .iter()
                .find(|output| output.output_key() == Some(ENDPOINT_OUTPUT_KEY))
                .and_then(|output| output.output_value())
        })
        .map(str::to_string)
        .ok_or_else(|| anyhow!("stack {stack} has no {ENDPOINT_OUTPUT_KEY} output"))
}

async fn execute(client: &reqwest::Client, endpoint: &str, call: &DriverCall) -> Result<String> {
    let url = join_url(endpoint, call.path());
    let request = match call {
        DriverCall::Post { body, .. } => client.post(&url).json(body),
        DriverCall::Get { .. } => client.get(&url),
    };
    let response = request
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;
    response
        .text()
        .await
        .with_context(|| format!("failed to read response from {url}"))
}
