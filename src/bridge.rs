use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::BridgeError;

/// Service the native plugin registers under.
pub const SERVICE_NAME: &str = "TPSQLite";

/// Carries a method name and positional arguments to native code.
///
/// Implementations resolve with the native success value or the native error object,
/// untouched. Nothing at this layer retries or cancels a call once issued.
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn invoke(
        &self,
        service: &str,
        method: &str,
        args: Vec<JsonValue>,
    ) -> Result<JsonValue, BridgeError>;
}

/// Bridge entry points used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeMethod {
    Open,
    Query,
    BulkInsert,
    Close,
    Backup,
    RestoreBackup,
}

impl NativeMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NativeMethod::Open => "open",
            NativeMethod::Query => "query",
            NativeMethod::BulkInsert => "bulkInsert",
            NativeMethod::Close => "close",
            NativeMethod::Backup => "backup",
            NativeMethod::RestoreBackup => "restoreBackup",
        }
    }
}

impl std::fmt::Display for NativeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
