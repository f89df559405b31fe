//! The query execution contract.
//!
//! A [`Query`] is SQL text (from any [`SqlTemplate`]), raw parameters, an optional
//! adapter, and the bridge entry point to call. Executing it adapts the parameters,
//! validates bind names, and hands `[handle, sql, payload]` to the bridge.
//!
//! ```rust,no_run
//! use sql_bridge::prelude::*;
//!
//! # async fn demo(db: &Database) -> Result<(), SqlBridgeError> {
//! let rows = Query::new("SELECT * FROM test WHERE id IN (:ids) OR parent IN (:ids)")
//!     .bind(ParamBuilder::new().list("ids", [1_i64, 2, 3]))
//!     .execute(db)
//!     .await?;
//! # let _ = rows;
//! # Ok(()) }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::adapter::ParamAdapter;
use crate::bridge::NativeMethod;
use crate::database::Database;
use crate::error::SqlBridgeError;
use crate::types::{ParameterPayload, RawParams};
use crate::validate::validate_parameter_names;

/// Source of a query's SQL text. Must be deterministic and side-effect free.
pub trait SqlTemplate: fmt::Debug + Send + Sync {
    fn sql(&self) -> Cow<'_, str>;
}

impl SqlTemplate for String {
    fn sql(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl SqlTemplate for &'static str {
    fn sql(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

/// How a query's parameters reach the wire.
#[derive(Debug, Clone)]
pub enum QueryParams {
    /// Run through the adapter on every execution.
    Adapt(RawParams),
    /// Sent as given. The caller guarantees the values are wire-safe.
    Passthrough(ParameterPayload),
}

impl Default for QueryParams {
    fn default() -> Self {
        QueryParams::Adapt(RawParams::None)
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    template: Arc<dyn SqlTemplate>,
    params: QueryParams,
    adapter: Option<ParamAdapter>,
    method: NativeMethod,
}

impl Query {
    /// A query over literal SQL text.
    pub fn new(sql: impl Into<String>) -> Self {
        Self::from_template(sql.into())
    }

    pub fn from_template(template: impl SqlTemplate + 'static) -> Self {
        Self {
            template: Arc::new(template),
            params: QueryParams::default(),
            adapter: None,
            method: NativeMethod::Query,
        }
    }

    /// Parameters to adapt at execution time.
    #[must_use]
    pub fn bind(mut self, params: impl Into<RawParams>) -> Self {
        self.params = QueryParams::Adapt(params.into());
        self
    }

    /// Parameters to send without adaptation.
    #[must_use]
    pub fn bind_wire(mut self, payload: ParameterPayload) -> Self {
        self.params = QueryParams::Passthrough(payload);
        self
    }

    /// Use this adapter instead of the database's default one.
    #[must_use]
    pub fn with_adapter(mut self, adapter: ParamAdapter) -> Self {
        self.adapter = Some(adapter);
        self
    }

    #[must_use]
    pub(crate) fn with_method(mut self, method: NativeMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn get_query(&self) -> String {
        self.template.sql().into_owned()
    }

    #[must_use]
    pub fn native_method(&self) -> NativeMethod {
        self.method
    }

    #[must_use]
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Build the wire payload. Runs again on every call.
    ///
    /// `fallback` is used when the query carries no adapter of its own.
    ///
    /// # Errors
    ///
    /// Propagates adaptation failures. A `bulkInsert` query whose payload is not in
    /// row form fails with `InvalidArgument`.
    pub async fn adapt(&self, fallback: &ParamAdapter) -> Result<ParameterPayload, SqlBridgeError> {
        let payload = match &self.params {
            QueryParams::Adapt(raw) => self.adapter.as_ref().unwrap_or(fallback).adapt(raw).await?,
            QueryParams::Passthrough(payload) => payload.clone(),
        };
        if self.method == NativeMethod::BulkInsert && !matches!(payload, ParameterPayload::Rows(_)) {
            return Err(SqlBridgeError::invalid_argument(
                "bulk insert parameters must be positional rows",
            ));
        }
        Ok(payload)
    }

    /// Adapt, validate and run the query, resolving with the native response.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `db` is closed
    /// - `InvalidArgument` / `UnsupportedType` / `BlobRead` from adaptation and validation;
    ///   these are raised before the bridge is called
    /// - `Encode` if the payload cannot be serialized
    /// - `Bridge` with the native error, unmodified
    pub async fn execute(&self, db: &Database) -> Result<JsonValue, SqlBridgeError> {
        db.ensure_open()?;
        let sql = self.get_query();
        let payload = self.adapt(db.adapter()).await?;
        validate_parameter_names(&payload)?;

        tracing::debug!(db = %db.handle(), method = %self.method, sql = %sql.trim(), "executing query");
        let args = vec![
            db.handle().to_arg(),
            JsonValue::String(sql),
            serde_json::to_value(&payload).map_err(SqlBridgeError::Encode)?,
        ];
        db.invoke(self.method, args).await
    }

    /// Like [`execute`](Self::execute), decoding the response into `T`.
    ///
    /// # Errors
    ///
    /// As `execute`, plus `Decode` when the response does not fit `T`.
    pub async fn execute_as<T: DeserializeOwned>(&self, db: &Database) -> Result<T, SqlBridgeError> {
        let response = self.execute(db).await?;
        Ok(serde_json::from_value(response)?)
    }
}
