use clap::ValueEnum;
use serde::Deserialize;

use crate::bridge::SERVICE_NAME;
use crate::error::SqlBridgeError;

/// Default busy timeout handed to `open` when the caller does not pick one.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

/// What the adapter does with values it has no rule for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTypePolicy {
    /// Fail with `UnsupportedType`.
    #[default]
    Strict,
    /// Send the value's own primitive form, logging a warning.
    Lenient,
}

/// Settings shared by every database opened through one [`Sqlite`](crate::sqlite::Sqlite).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub service_name: String,
    pub unknown_types: UnknownTypePolicy,
    pub busy_timeout_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            unknown_types: UnknownTypePolicy::Strict,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::new()
    }

    /// Load settings from a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `SqlBridgeError::ConfigError` if the document is malformed or names an
    /// empty service.
    pub fn from_json(raw: &str) -> Result<Self, SqlBridgeError> {
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| SqlBridgeError::ConfigError(format!("invalid bridge config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns `SqlBridgeError::ConfigError` when the service name is blank.
    pub fn validate(&self) -> Result<(), SqlBridgeError> {
        if self.service_name.trim().is_empty() {
            return Err(SqlBridgeError::ConfigError(
                "service name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`BridgeConfig`].
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
    cfg: BridgeConfig,
}

impl BridgeConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.cfg.service_name = name.into();
        self
    }

    #[must_use]
    pub fn unknown_types(mut self, policy: UnknownTypePolicy) -> Self {
        self.cfg.unknown_types = policy;
        self
    }

    #[must_use]
    pub fn busy_timeout_ms(mut self, timeout: u32) -> Self {
        self.cfg.busy_timeout_ms = timeout;
        self
    }

    #[must_use]
    pub fn finish(self) -> BridgeConfig {
        self.cfg
    }

    /// Like [`finish`](Self::finish) but validates first.
    ///
    /// # Errors
    ///
    /// Returns `SqlBridgeError::ConfigError` when the settings are unusable.
    pub fn build(self) -> Result<BridgeConfig, SqlBridgeError> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_config_fills_defaults() {
        let cfg = BridgeConfig::from_json(r#"{"unknown_types": "lenient"}"#).unwrap();
        assert_eq!(cfg.unknown_types, UnknownTypePolicy::Lenient);
        assert_eq!(cfg.service_name, SERVICE_NAME);
        assert_eq!(cfg.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn blank_service_name_is_rejected() {
        let err = BridgeConfig::builder().service_name("  ").build().unwrap_err();
        assert!(matches!(err, SqlBridgeError::ConfigError(_)));
        assert!(BridgeConfig::from_json(r#"{"busy_timeout_ms": "soon"}"#).is_err());
    }

    #[test]
    fn policy_parses_from_command_line_value() {
        let policy = UnknownTypePolicy::from_str("lenient", true).unwrap();
        assert_eq!(policy, UnknownTypePolicy::Lenient);
    }
}
