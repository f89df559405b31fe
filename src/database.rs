use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value as JsonValue, json};

use crate::adapter::ParamAdapter;
use crate::bridge::{Bridge, NativeMethod};
use crate::config::BridgeConfig;
use crate::error::SqlBridgeError;

/// Identifier the native side assigned to an open database.
///
/// Kept as text so 64-bit native pointers survive the trip through JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseHandle(String);

impl DatabaseHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `{"dbHandle": ..}` object the native side expects as a first argument.
    #[must_use]
    pub fn to_arg(&self) -> JsonValue {
        json!({ "dbHandle": self.0 })
    }
}

impl fmt::Display for DatabaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An open database, shared by every query run against it.
///
/// The closed flag is local: once set it never clears, and nothing checks with the
/// native side before a call.
pub struct Database {
    handle: DatabaseHandle,
    closed: AtomicBool,
    bridge: Arc<dyn Bridge>,
    service: String,
    adapter: ParamAdapter,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("handle", &self.handle)
            .field("closed", &self.is_closed())
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl Database {
    #[must_use]
    pub fn new(handle: DatabaseHandle, bridge: Arc<dyn Bridge>, config: &BridgeConfig) -> Self {
        Self {
            handle,
            closed: AtomicBool::new(false),
            bridge,
            service: config.service_name.clone(),
            adapter: ParamAdapter::with_policy(config.unknown_types),
        }
    }

    #[must_use]
    pub fn handle(&self) -> &DatabaseHandle {
        &self.handle
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Adapter used by queries that were not given one of their own.
    #[must_use]
    pub fn adapter(&self) -> &ParamAdapter {
        &self.adapter
    }

    /// # Errors
    ///
    /// Returns `SqlBridgeError::InvalidState` once the database has been closed.
    pub fn ensure_open(&self) -> Result<(), SqlBridgeError> {
        if self.is_closed() {
            return Err(SqlBridgeError::invalid_state(format!(
                "database {} is closed",
                self.handle
            )));
        }
        Ok(())
    }

    /// The one legal closed transition. Returns `false` if it already happened.
    pub(crate) fn mark_closed(&self) -> bool {
        self.closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) async fn invoke(
        &self,
        method: NativeMethod,
        args: Vec<JsonValue>,
    ) -> Result<JsonValue, SqlBridgeError> {
        tracing::trace!(db = %self.handle, %method, "bridge call");
        self.bridge
            .invoke(&self.service, method.as_str(), args)
            .await
            .map_err(SqlBridgeError::Bridge)
    }
}
