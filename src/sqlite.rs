//! Database lifecycle: open, close, backup and restore.
//!
//! These calls go straight to the bridge; no parameter adaptation is involved.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sql_bridge::prelude::*;
//!
//! # async fn demo(bridge: Arc<dyn Bridge>) -> Result<(), SqlBridgeError> {
//! let sqlite = Sqlite::new(bridge, BridgeConfig::default());
//! let db = sqlite.open("file:///data/app.db", true).await?;
//!
//! transaction::begin(TransactionMode::Immediate).execute(&db).await?;
//! Query::new("UPDATE test SET name = :name WHERE id = :id")
//!     .bind(ParamBuilder::new().text("name", "bob").integer("id", 5))
//!     .execute(&db)
//!     .await?;
//! transaction::commit().execute(&db).await?;
//!
//! sqlite.close(&db).await?;
//! # Ok(()) }
//! ```

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::bridge::{Bridge, NativeMethod};
use crate::config::BridgeConfig;
use crate::database::{Database, DatabaseHandle};
use crate::error::SqlBridgeError;

/// SQLite `open` flags understood by the native side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenFlags(u32);

impl OpenFlags {
    pub const READ_ONLY: Self = Self(0x0000_0001);
    pub const READ_WRITE: Self = Self(0x0000_0002);
    pub const CREATE: Self = Self(0x0000_0004);
    pub const URI: Self = Self(0x0000_0040);
    pub const MEMORY: Self = Self(0x0000_0080);
    pub const NO_MUTEX: Self = Self(0x0000_8000);
    pub const FULL_MUTEX: Self = Self(0x0001_0000);
    pub const SHARED_CACHE: Self = Self(0x0002_0000);
    pub const PRIVATE_CACHE: Self = Self(0x0004_0000);
    pub const NO_FOLLOW: Self = Self(0x0100_0000);

    #[must_use]
    pub fn for_access(write_access: bool) -> Self {
        if write_access {
            Self::CREATE | Self::READ_WRITE
        } else {
            Self::READ_ONLY
        }
    }

    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for OpenFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HandleRepr {
    Text(String),
    Number(u64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OpenResponse {
    Wrapped {
        #[serde(rename = "dbHandle")]
        db_handle: HandleRepr,
    },
    Bare(HandleRepr),
}

impl From<HandleRepr> for DatabaseHandle {
    fn from(repr: HandleRepr) -> Self {
        match repr {
            HandleRepr::Text(s) => DatabaseHandle::new(s),
            HandleRepr::Number(n) => DatabaseHandle::new(n.to_string()),
        }
    }
}

/// Entry point for opening databases through a bridge.
#[derive(Clone)]
pub struct Sqlite {
    bridge: Arc<dyn Bridge>,
    config: BridgeConfig,
}

impl std::fmt::Debug for Sqlite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sqlite")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Sqlite {
    #[must_use]
    pub fn new(bridge: Arc<dyn Bridge>, config: BridgeConfig) -> Self {
        Self { bridge, config }
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    async fn call(&self, method: NativeMethod, args: Vec<JsonValue>) -> Result<JsonValue, SqlBridgeError> {
        tracing::debug!(%method, "bridge lifecycle call");
        self.bridge
            .invoke(&self.config.service_name, method.as_str(), args)
            .await
            .map_err(SqlBridgeError::Bridge)
    }

    /// Open with the configured busy timeout.
    ///
    /// # Errors
    ///
    /// Returns the bridge error, or `Decode` if the native side answers without a handle.
    pub async fn open(&self, path: &str, write_access: bool) -> Result<Database, SqlBridgeError> {
        self.open_with_timeout(path, write_access, self.config.busy_timeout_ms)
            .await
    }

    /// # Errors
    ///
    /// Returns the bridge error, or `Decode` if the native side answers without a handle.
    pub async fn open_with_timeout(
        &self,
        path: &str,
        write_access: bool,
        busy_timeout_ms: u32,
    ) -> Result<Database, SqlBridgeError> {
        let flags = OpenFlags::for_access(write_access);
        let response = self
            .call(
                NativeMethod::Open,
                vec![json!(path), json!(flags.bits()), json!(busy_timeout_ms)],
            )
            .await?;
        let handle = match serde_json::from_value::<OpenResponse>(response)? {
            OpenResponse::Wrapped { db_handle } | OpenResponse::Bare(db_handle) => {
                DatabaseHandle::from(db_handle)
            }
        };
        tracing::debug!(%handle, path, write_access, "database opened");
        Ok(Database::new(handle, Arc::clone(&self.bridge), &self.config))
    }

    /// Close the database. The handle is marked closed only after the native side agrees.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if it was already closed
    /// - the bridge error if the native close fails (the handle stays open)
    pub async fn close(&self, db: &Database) -> Result<(), SqlBridgeError> {
        db.ensure_open()?;
        self.call(NativeMethod::Close, vec![db.handle().to_arg()])
            .await?;
        if !db.mark_closed() {
            return Err(SqlBridgeError::invalid_state(format!(
                "database {} was closed concurrently",
                db.handle()
            )));
        }
        tracing::debug!(handle = %db.handle(), "database closed");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the bridge error unmodified.
    pub async fn backup(&self, path: &str, backup_path: &str) -> Result<(), SqlBridgeError> {
        self.call(NativeMethod::Backup, vec![json!(path), json!(backup_path)])
            .await
            .map(|_| ())
    }

    /// # Errors
    ///
    /// Returns the bridge error unmodified.
    pub async fn restore_backup(&self, path: &str, backup_path: &str) -> Result<(), SqlBridgeError> {
        self.call(
            NativeMethod::RestoreBackup,
            vec![json!(path), json!(backup_path)],
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_flags_match_native_values() {
        assert_eq!(OpenFlags::for_access(true).bits(), 0x6);
        assert_eq!(OpenFlags::for_access(false).bits(), 0x1);
        assert!(OpenFlags::for_access(true).contains(OpenFlags::CREATE));
        assert!(!OpenFlags::for_access(false).contains(OpenFlags::READ_WRITE));
    }

    #[test]
    fn open_response_accepts_wrapped_and_bare_handles() {
        let cases = [
            json!({"dbHandle": "140234"}),
            json!({"dbHandle": 140_234}),
            json!("140234"),
        ];
        for raw in cases {
            let handle = match serde_json::from_value::<OpenResponse>(raw).unwrap() {
                OpenResponse::Wrapped { db_handle } | OpenResponse::Bare(db_handle) => {
                    DatabaseHandle::from(db_handle)
                }
            };
            assert_eq!(handle.as_str(), "140234");
        }
    }
}
