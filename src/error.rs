use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ParamLocation;

#[derive(Debug, Error)]
pub enum SqlBridgeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No coercion rule (and no injected strategy) handled the value.
    #[error("Unsupported parameter type `{type_name}` at {location}")]
    UnsupportedType {
        location: ParamLocation,
        type_name: String,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Failed to read blob parameter at {location}: {source}")]
    BlobRead {
        location: ParamLocation,
        #[source]
        source: std::io::Error,
    },

    /// Error reported by the native side, passed through verbatim.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Parameter encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SqlBridgeError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// `true` for failures raised locally, before anything crossed the bridge.
    #[must_use]
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Bridge(_) | Self::Decode(_))
    }

    #[must_use]
    pub fn as_bridge_error(&self) -> Option<&BridgeError> {
        if let Self::Bridge(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

/// Structured error object produced by the native plugin.
///
/// ```rust
/// use sql_bridge::prelude::*;
///
/// let err: BridgeError = serde_json::from_value(serde_json::json!({
///     "code": 1,
///     "name": "SqliteException",
///     "message": "no such column: h",
///     "details": { "query": "SELECT h FROM test" }
/// }))
/// .unwrap();
/// assert_eq!(err.native_code(), Some(NativeErrorCode::BindParameter));
/// assert_eq!(err.query(), Some("SELECT h FROM test"));
/// ```
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{} (code {}): {}", .name, .code, .message.as_deref().unwrap_or("no message"))]
pub struct BridgeError {
    pub code: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[source]
    pub cause: Option<Box<BridgeError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BridgeError {
    pub fn new(code: i64, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            message: None,
            cause: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.details.get_or_insert_with(ErrorDetails::default).query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: BridgeError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The SQL text the native side was running, when it reported one.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.details.as_ref()?.query.as_deref()
    }

    #[must_use]
    pub fn native_code(&self) -> Option<NativeErrorCode> {
        NativeErrorCode::from_code(self.code)
    }
}

/// Error codes shared by the Android and iOS plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeErrorCode {
    BindParameter,
    UnhandledParameterType,
    UnsupportedColumnType,
    /// Android only.
    DatabaseNotFound,
    /// iOS only.
    Io,
}

impl NativeErrorCode {
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::BindParameter),
            2 => Some(Self::UnhandledParameterType),
            3 => Some(Self::UnsupportedColumnType),
            4 => Some(Self::DatabaseNotFound),
            5 => Some(Self::Io),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::BindParameter => 1,
            Self::UnhandledParameterType => 2,
            Self::UnsupportedColumnType => 3,
            Self::DatabaseNotFound => 4,
            Self::Io => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bridge_error_round_trips_unknown_detail_keys() {
        let raw = json!({
            "code": 3,
            "name": "SqliteException",
            "details": { "query": "SELECT 1", "column": 2 }
        });
        let err: BridgeError = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(err.native_code(), Some(NativeErrorCode::UnsupportedColumnType));
        assert_eq!(err.details.as_ref().unwrap().extra["column"], json!(2));
        assert_eq!(serde_json::to_value(&err).unwrap(), raw);
    }

    #[test]
    fn bridge_error_display_without_message() {
        let err = BridgeError::new(42, "Weird");
        assert_eq!(err.to_string(), "Weird (code 42): no message");
        assert_eq!(err.native_code(), None);
    }

    #[test]
    fn bridge_failures_are_not_local() {
        let err = SqlBridgeError::from(BridgeError::new(5, "IOError"));
        assert!(!err.is_local());
        assert!(SqlBridgeError::invalid_argument("x").is_local());
    }

    #[test]
    fn encode_and_decode_failures_are_told_apart() {
        let encode = SqlBridgeError::Encode(serde_json::from_str::<i32>("x").unwrap_err());
        let decode = SqlBridgeError::from(serde_json::from_str::<i32>("x").unwrap_err());
        assert!(encode.to_string().starts_with("Parameter encode error"));
        assert!(decode.to_string().starts_with("Response decode error"));
        assert!(encode.is_local());
        assert!(!decode.is_local());
    }
}
