//! CloudWatch Embedded Metric Format documents.
//!
//! A [`MetricsRecorder`] lives for one invocation. Handlers add counts while
//! they run and the runtime wrapper flushes a single EMF document when the
//! invocation ends, whatever its outcome.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

pub const DEFAULT_NAMESPACE: &str = "EventSources";
pub const ENVIRONMENT_DIMENSION: &str = "environment";
pub const SERVICE_DIMENSION: &str = "service";

pub const API_ERROR_SIMULATED: &str = "API_Error_Simulated";
pub const API_ERROR_DYNAMO: &str = "API_Error_Dynamo";
pub const API_ERROR_SQS: &str = "API_Error_SQS";
pub const API_ERROR_EVENTS: &str = "API_Error_Events";
pub const API_ERROR_KINESIS: &str = "API_Error_Kinesis";

pub const STREAM_NEW_ITEM: &str = "NewItem";
pub const STREAM_UPDATE_ITEM: &str = "UpdateItem";
pub const STREAM_DELETE_ITEM: &str = "DeleteItem";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricUnit {
    Count,
}

#[derive(Debug, Clone, PartialEq)]
struct MetricEntry {
    unit: MetricUnit,
    values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRecorder {
    namespace: String,
    default_dimensions: BTreeMap<String, String>,
    metrics: BTreeMap<String, MetricEntry>,
}

impl MetricsRecorder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            default_dimensions: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_default_dimension(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_dimensions.insert(name.into(), value.into());
        self
    }

    pub fn add_metric(&mut self, name: &str, unit: MetricUnit, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_insert_with(|| MetricEntry {
                unit,
                values: Vec::new(),
            })
            .values
            .push(value);
    }

    pub fn increment(&mut self, name: &str) {
        self.add_metric(name, MetricUnit::Count, 1.0);
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Total of every value recorded under `name`.
    pub fn total(&self, name: &str) -> f64 {
        self.metrics
            .get(name)
            .map(|entry| entry.values.iter().sum())
            .unwrap_or(0.0)
    }

    /// Drains recorded metrics into an EMF document. Returns `None` when
    /// nothing was recorded so callers emit no empty documents.
    pub fn flush(&mut self, timestamp_ms: i64) -> Option<Value> {
        if self.metrics.is_empty() {
            return None;
        }
        let metrics = std::mem::take(&mut self.metrics);

        let dimension_names: Vec<&String> = self.default_dimensions.keys().collect();
        let definitions: Vec<Value> = metrics
            .iter()
            .map(|(name, entry)| json!({"Name": name, "Unit": entry.unit}))
            .collect();

        let mut document = Map::new();
        document.insert(
            "_aws".to_string(),
            json!({
                "Timestamp": timestamp_ms,
                "CloudWatchMetrics": [{
                    "Namespace": self.namespace,
                    "Dimensions": [dimension_names],
                    "Metrics": definitions,
                }],
            }),
        );
        for (name, value) in &self.default_dimensions {
            document.insert(name.clone(), Value::String(value.clone()));
        }
        for (name, entry) in metrics {
            let value = match entry.values.as_slice() {
                [single] => json!(single),
                values => json!(values),
            };
            document.insert(name, value);
        }

        Some(Value::Object(document))
    }
}

/// Metric counted for each DynamoDB stream event name.
pub fn stream_metric_name(event_name: &str) -> Option<&'static str> {
    match event_name {
        "INSERT" => Some(STREAM_NEW_ITEM),
        "MODIFY" => Some(STREAM_UPDATE_ITEM),
        "REMOVE" => Some(STREAM_DELETE_ITEM),
        _ => None,
    }
}
