//! Error taxonomy for API calls.
//!
//! The client only acts on `Auth` itself (cache and token purge). Every other
//! variant reaches the caller with the response body intact so the UI layer
//! can decide what to show.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Response body of a failed request, kept both raw and parsed.
#[derive(Debug, Clone, Default)]
pub struct ErrorBody {
    /// Raw response text.
    pub raw: String,
    /// Parsed JSON, when the body was JSON.
    pub json: Option<Value>,
}

impl ErrorBody {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(bytes).into_owned();
        let json = serde_json::from_slice(bytes).ok();
        Self { raw, json }
    }

    /// First of the `error`, `detail` or `message` fields that is a string.
    pub fn server_message(&self) -> Option<&str> {
        let obj = self.json.as_ref()?.as_object()?;
        ["error", "detail", "message"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
    }

    /// Field-keyed validation messages (`{"email": ["..."]}`).
    ///
    /// Keys holding a plain string are included as a single message. The
    /// `error`/`detail`/`message` keys are not treated as fields.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let mut fields = BTreeMap::new();
        let Some(obj) = self.json.as_ref().and_then(Value::as_object) else {
            return fields;
        };
        for (key, value) in obj {
            if matches!(key.as_str(), "error" | "detail" | "message") {
                continue;
            }
            let messages: Vec<String> = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            if !messages.is_empty() {
                fields.insert(key.clone(), messages);
            }
        }
        fields
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// 401. Cache and tokens have already been cleared when this is returned.
    #[error("Authentication failed")]
    Auth { body: ErrorBody },

    /// 400.
    #[error("Validation failed")]
    Validation { body: ErrorBody },

    /// 403.
    #[error("Permission denied")]
    Permission { body: ErrorBody },

    /// Any other non-success status.
    #[error("Request failed with status {status}")]
    Status { status: u16, body: ErrorBody },

    /// The request was sent but no response arrived (connect error, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// Client-side failures: bad URL, undecodable payload and the like.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: ErrorBody) -> Self {
        match status {
            400 => ApiError::Validation { body },
            401 => ApiError::Auth { body },
            403 => ApiError::Permission { body },
            _ => ApiError::Status { status, body },
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { .. } => Some(401),
            ApiError::Validation { .. } => Some(400),
            ApiError::Permission { .. } => Some(403),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(_) | ApiError::Unexpected(_) => None,
        }
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Auth { body }
            | ApiError::Validation { body }
            | ApiError::Permission { body }
            | ApiError::Status { body, .. } => Some(body),
            ApiError::Network(_) | ApiError::Unexpected(_) => None,
        }
    }

    /// Server-provided detail if any, otherwise the error's own description.
    pub fn detail(&self) -> String {
        self.body()
            .and_then(ErrorBody::server_message)
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Auth { .. } => "Authentication failed - please log in again".to_string(),
            ApiError::Permission { .. } => {
                "Permission denied - you need admin privileges".to_string()
            }
            ApiError::Validation { body } => {
                if let Some(msg) = body.server_message() {
                    return msg.to_string();
                }
                let fields = body.field_errors();
                if fields.is_empty() {
                    "Bad request - please check your input and try again".to_string()
                } else {
                    fields
                        .iter()
                        .map(|(field, msgs)| format!("{} error: {}", field, msgs.join(" ")))
                        .collect::<Vec<_>>()
                        .join("; ")
                }
            }
            ApiError::Status { status, body } => body
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed ({})", status)),
            ApiError::Network(_) => "Network error - please check your connection".to_string(),
            ApiError::Unexpected(_) => "An unexpected error occurred".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ApiError::Network(err.to_string())
        } else {
            ApiError::Unexpected(err.to_string())
        }
    }
}
