use event_sources_core::metrics::{
    MetricsRecorder, DEFAULT_NAMESPACE, ENVIRONMENT_DIMENSION, SERVICE_DIMENSION,
};
use thiserror::Error;

pub const ENVIRONMENT_NAME: &str = "ENVIRONMENT_NAME";
pub const DYNAMO_TABLE: &str = "DYNAMO_TABLE";
pub const SQS_QUEUE_URL: &str = "SQS_QUEUE_URL";
pub const EVENT_BUS_NAME: &str = "EVENT_BUS_NAME";
pub const KINESIS_STREAM_NAME: &str = "KINESIS_STREAM_NAME";
pub const METRICS_NAMESPACE: &str = "POWERTOOLS_METRICS_NAMESPACE";
pub const SERVICE_NAME: &str = "POWERTOOLS_SERVICE_NAME";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

/// Targets of the HTTP façade, read once at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub table_name: String,
    pub queue_url: String,
    pub event_bus_name: String,
    pub stream_name: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            table_name: required(&lookup, DYNAMO_TABLE)?,
            queue_url: required(&lookup, SQS_QUEUE_URL)?,
            event_bus_name: required(&lookup, EVENT_BUS_NAME)?,
            stream_name: required(&lookup, KINESIS_STREAM_NAME)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub metrics_namespace: String,
    pub environment_name: Option<String>,
}

impl TelemetryConfig {
    /// Functions that publish metrics tag them with the deployment
    /// environment, so they pass `require_environment`.
    pub fn from_env(default_service: &str, require_environment: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(default_service, require_environment, env_lookup)
    }

    pub fn from_lookup(
        default_service: &str,
        require_environment: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let environment_name = if require_environment {
            Some(required(&lookup, ENVIRONMENT_NAME)?)
        } else {
            non_empty(&lookup, ENVIRONMENT_NAME)
        };

        Ok(Self {
            service_name: non_empty(&lookup, SERVICE_NAME)
                .unwrap_or_else(|| default_service.to_string()),
            metrics_namespace: non_empty(&lookup, METRICS_NAMESPACE)
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            environment_name,
        })
    }

    pub fn metrics_recorder(&self) -> MetricsRecorder {
        let recorder = MetricsRecorder::new(self.metrics_namespace.clone())
            .with_default_dimension(SERVICE_DIMENSION, self.service_name.clone());
        match &self.environment_name {
            Some(environment) => {
                recorder.with_default_dimension(ENVIRONMENT_DIMENSION, environment.clone())
            }
            None => recorder,
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    non_empty(lookup, key).ok_or(ConfigError::Missing(key))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    #[test]
    fn api_config_reads_all_targets() {
        let config = ApiConfig::from_lookup(lookup(&[
            (DYNAMO_TABLE, "items"),
            (SQS_QUEUE_URL, "https://sqs.eu-west-1.amazonaws.com/123/queue"),
            (EVENT_BUS_NAME, "bus"),
            (KINESIS_STREAM_NAME, "stream"),
        ]))
        .expect("config should load");

        assert_eq!(config.table_name, "items");
        assert_eq!(config.stream_name, "stream");
    }

    #[test]
    fn api_config_names_missing_variable() {
        let error = ApiConfig::from_lookup(lookup(&[
            (DYNAMO_TABLE, "items"),
            (SQS_QUEUE_URL, "  "),
            (EVENT_BUS_NAME, "bus"),
            (KINESIS_STREAM_NAME, "stream"),
        ]))
        .expect_err("blank queue url should be rejected");

        assert_eq!(error, ConfigError::Missing(SQS_QUEUE_URL));
        assert_eq!(error.to_string(), "SQS_QUEUE_URL must be configured");
    }

    #[test]
    fn telemetry_defaults_service_and_namespace() {
        let config = TelemetryConfig::from_lookup("sqs", false, lookup(&[]))
            .expect("optional environment may be absent");

        assert_eq!(config.service_name, "sqs");
        assert_eq!(config.metrics_namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.environment_name, None);
    }

    #[test]
    fn telemetry_requires_environment_for_metric_publishers() {
        let error = TelemetryConfig::from_lookup("api", true, lookup(&[]))
            .expect_err("environment is required");
        assert_eq!(error, ConfigError::Missing(ENVIRONMENT_NAME));
    }

    #[test]
    fn metrics_recorder_carries_default_dimensions() {
        let config = TelemetryConfig::from_lookup(
            "api",
            true,
            lookup(&[(ENVIRONMENT_NAME, "dev"), (METRICS_NAMESPACE, "Demo")]),
        )
        .expect("config should load");

        let mut metrics = config.metrics_recorder();
        metrics.increment("API_Error_SQS");
        let document = metrics.flush(0).expect("document should exist");

        assert_eq!(document["environment"], "dev");
        assert_eq!(document["service"], "api");
        assert_eq!(document["_aws"]["CloudWatchMetrics"][0]["Namespace"], "Demo");
    }
}
