use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong! Please try again.";
pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const EVENTS_SOURCE: &str = "events-api";
pub const EVENTS_DETAIL_TYPE: &str = "NewItem";

/// Opaque JSON object forwarded by the API and carried by every record.
pub type Payload = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

impl ApiGatewayResponse {
    pub fn json(status_code: u16, payload: &impl Serialize) -> Self {
        let body = serde_json::to_string(payload)
            .unwrap_or_else(|_| json!({ "message": GENERIC_ERROR_MESSAGE }).to_string());
        Self {
            status_code,
            headers: json!({"Content-Type": "application/json"}),
            body,
        }
    }

    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Error surfaced to HTTP callers. The message is always user facing and
/// never carries the underlying failure detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    status_code: u16,
    message: String,
}

impl ServiceError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    pub fn bad_gateway() -> Self {
        Self::new(502, GENERIC_ERROR_MESSAGE)
    }

    pub fn not_found() -> Self {
        Self::new(404, NOT_FOUND_MESSAGE)
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_response(self) -> ApiGatewayResponse {
        ApiGatewayResponse::json(
            self.status_code,
            &json!({
                "statusCode": self.status_code,
                "message": self.message,
            }),
        )
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status_code, self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Success body for the forwarding routes. `result` echoes the payload id
/// as it was forwarded, so a caller-supplied non-string id comes back as is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForwardedResponse {
    pub result: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiRequestContext {
    #[serde(rename = "requestId", default)]
    pub request_id: Option<String>,
}

/// REST (v1) proxy integration request. Only the fields routing needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayRequest {
    #[serde(rename = "httpMethod", default)]
    pub http_method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
    #[serde(rename = "requestContext", default)]
    pub request_context: ApiRequestContext,
}
