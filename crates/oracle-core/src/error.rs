use serde_json::{Map, Value};
use thiserror::Error;

/// Message carried by every transport failure. The underlying cause is not kept.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error";

#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request never reached the server, or no response came back.
    #[error("{message}")]
    Transport { message: String },

    /// The server answered with a non-2xx status. `body` holds the error
    /// object the server sent, or is empty when it could not be parsed.
    #[error("Request failed with status {status}")]
    Response { status: u16, body: Map<String, Value> },

    /// 2xx status, but the body was not JSON or did not have the expected shape.
    #[error("Malformed response body: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Invalid mock fixture {name}: {source}")]
    Fixture {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn transport() -> Self {
        GatewayError::Transport {
            message: NETWORK_ERROR_MESSAGE.to_string(),
        }
    }

    /// Build a `Response` error from a raw error body.
    ///
    /// Error detail extraction is best-effort: a body that is not JSON, or is
    /// JSON but not an object, degrades to an empty map rather than failing.
    pub fn from_error_body(status: u16, raw: &[u8]) -> Self {
        let body = match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        GatewayError::Response { status, body }
    }

    /// HTTP status, present only when the server replied with a failure status.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Map<String, Value>> {
        match self {
            GatewayError::Response { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The server's `detail` field, when it sent one as a string.
    pub fn detail(&self) -> Option<&str> {
        self.body()
            .and_then(|body| body.get("detail"))
            .and_then(Value::as_str)
    }

    /// Text to show a user: the server's detail when present, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport { .. })
    }

    /// Flat JSON view of the error: `{status, ...body}` for response errors,
    /// `{message}` for everything else. The HTTP status overrides any
    /// `status` key the server put in its body.
    pub fn to_json(&self) -> Value {
        match self {
            GatewayError::Response { status, body } => {
                let mut merged = body.clone();
                merged.insert("status".to_string(), Value::from(*status));
                Value::Object(merged)
            }
            other => {
                let mut map = Map::new();
                map.insert("message".to_string(), Value::String(other.to_string()));
                Value::Object(map)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transport_has_message_and_no_status() {
        let err = GatewayError::transport();
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Network error");
        assert!(err.is_transport());
    }

    #[test]
    fn test_error_body_is_kept_verbatim() {
        let err = GatewayError::from_error_body(503, br#"{"detail":"service unavailable"}"#);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.detail(), Some("service unavailable"));
        assert_eq!(err.to_json(), json!({"status": 503, "detail": "service unavailable"}));
    }

    #[test]
    fn test_unparseable_error_body_degrades_to_empty() {
        let err = GatewayError::from_error_body(500, b"<html>Bad Gateway</html>");
        assert_eq!(err.body().map(|b| b.len()), Some(0));
        assert_eq!(err.to_json(), json!({"status": 500}));

        let err = GatewayError::from_error_body(400, br#"["not", "an", "object"]"#);
        assert_eq!(err.to_json(), json!({"status": 400}));
    }

    #[test]
    fn test_http_status_wins_over_body_status() {
        let err = GatewayError::from_error_body(422, br#"{"status":"invalid","detail":"bad pair"}"#);
        assert_eq!(err.to_json()["status"], json!(422));
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = GatewayError::from_error_body(401, b"{}");
        assert_eq!(err.user_message("Login failed."), "Login failed.");

        let err = GatewayError::from_error_body(401, br#"{"detail":"Invalid credentials"}"#);
        assert_eq!(err.user_message("Login failed."), "Invalid credentials");
    }

    #[test]
    fn test_malformed_response_has_no_status() {
        let parse = serde_json::from_str::<Value>("not json").unwrap_err();
        let err = GatewayError::MalformedResponse(parse);
        assert_eq!(err.status(), None);
        assert!(err.to_string().starts_with("Malformed response body"));
    }
}
