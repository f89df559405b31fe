//! Bind-name validation.
//!
//! Runs on the adapted payload, never on the raw input: adaptation drops keys.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SqlBridgeError;
use crate::types::ParameterPayload;

// A letter, then at least one letter, digit or underscore.
static BIND_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]+$").expect("bind name pattern compiles"));

#[must_use]
pub fn is_valid_bind_name(name: &str) -> bool {
    BIND_NAME.is_match(name)
}

/// # Errors
///
/// Returns `SqlBridgeError::InvalidArgument` naming the first invalid key.
pub fn validate_bind_name(name: &str) -> Result<(), SqlBridgeError> {
    if is_valid_bind_name(name) {
        Ok(())
    } else {
        Err(SqlBridgeError::InvalidArgument(format!(
            "Invalid parameter name `{name}`: must start with a letter and contain only letters, digits or underscores"
        )))
    }
}

/// Check every key of a named payload. Row and empty payloads carry no names.
///
/// # Errors
///
/// Returns `SqlBridgeError::InvalidArgument` for the first key that is not a valid bind name.
pub fn validate_parameter_names(payload: &ParameterPayload) -> Result<(), SqlBridgeError> {
    match payload {
        ParameterPayload::Named(named) => named.keys().try_for_each(|k| validate_bind_name(k)),
        ParameterPayload::Rows(_) | ParameterPayload::None => Ok(()),
    }
}
