//! Parameter adaptation.
//!
//! [`ParamAdapter`] turns application values into [`WireValue`]s. Built-in rules cover
//! null, numbers, text, booleans, dates, blobs and byte buffers; anything else goes to
//! the adapter's [`CoerceUnknown`] strategy, chosen when the adapter is built.
//!
//! ```rust
//! use sql_bridge::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlBridgeError> {
//! let params = ParamBuilder::new()
//!     .integer("id", 7)
//!     .boolean("active", true)
//!     .absent("nickname")
//!     .build();
//!
//! let named = ParamAdapter::default().process_keyed(&params).await?;
//! assert_eq!(named.len(), 2);
//! # Ok(()) }
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::config::UnknownTypePolicy;
use crate::converter::{self, BlobSource};
use crate::error::SqlBridgeError;
use crate::types::{
    ByteBuffer, CustomValue, HostDate, HostParam, HostValue, KeyedParams, NamedParams,
    ParamLocation, RawParams, ParameterPayload, WireParam, WireValue,
};

/// Strategy for values none of the built-in rules cover.
pub trait CoerceUnknown: fmt::Debug + Send + Sync {
    /// # Errors
    ///
    /// Returns `SqlBridgeError::UnsupportedType` (or any other local error) when the
    /// value cannot be represented on the wire.
    fn coerce(
        &self,
        value: &CustomValue,
        location: &ParamLocation,
    ) -> Result<WireValue, SqlBridgeError>;
}

/// Rejects every unknown value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictCoercion;

impl CoerceUnknown for StrictCoercion {
    fn coerce(
        &self,
        value: &CustomValue,
        location: &ParamLocation,
    ) -> Result<WireValue, SqlBridgeError> {
        Err(unsupported(value, location))
    }
}

/// Sends an unknown value's own JSON form when it already is a wire primitive.
///
/// Every pass-through is logged at `warn`. JSON arrays and objects are still rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientCoercion;

impl CoerceUnknown for LenientCoercion {
    fn coerce(
        &self,
        value: &CustomValue,
        location: &ParamLocation,
    ) -> Result<WireValue, SqlBridgeError> {
        let wire = match &value.value {
            JsonValue::Null => WireValue::Null,
            JsonValue::Bool(b) => converter::boolean_to_integer(*b),
            JsonValue::Number(n) => match n.as_f64() {
                Some(f) => converter::number_to_double(f),
                None => return Err(unsupported(value, location)),
            },
            JsonValue::String(s) => converter::string_to_text(s),
            JsonValue::Array(_) | JsonValue::Object(_) => {
                return Err(unsupported(value, location));
            }
        };
        tracing::warn!(
            type_name = %value.type_name,
            %location,
            "passing unrecognized parameter type through unmodified"
        );
        Ok(wire)
    }
}

fn unsupported(value: &CustomValue, location: &ParamLocation) -> SqlBridgeError {
    SqlBridgeError::UnsupportedType {
        location: location.clone(),
        type_name: value.type_name.clone(),
    }
}

/// Coerces host values and whole parameter collections into wire form.
#[derive(Debug, Clone)]
pub struct ParamAdapter {
    unknown: Arc<dyn CoerceUnknown>,
}

impl Default for ParamAdapter {
    fn default() -> Self {
        Self::with_policy(UnknownTypePolicy::default())
    }
}

impl ParamAdapter {
    #[must_use]
    pub fn with_policy(policy: UnknownTypePolicy) -> Self {
        match policy {
            UnknownTypePolicy::Strict => Self::with_strategy(StrictCoercion),
            UnknownTypePolicy::Lenient => Self::with_strategy(LenientCoercion),
        }
    }

    pub fn with_strategy(strategy: impl CoerceUnknown + 'static) -> Self {
        Self {
            unknown: Arc::new(strategy),
        }
    }

    #[must_use]
    pub fn strategy(&self) -> &dyn CoerceUnknown {
        self.unknown.as_ref()
    }

    /// Coerce a single value. First matching rule wins.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument("Invalid Date")` for a date that denotes no instant
    /// - `BlobRead` if a blob cannot be read
    /// - whatever the unknown-value strategy returns for custom values
    pub async fn adapt_value(
        &self,
        value: &HostValue,
        location: &ParamLocation,
    ) -> Result<WireValue, SqlBridgeError> {
        match value {
            HostValue::Null => Ok(WireValue::Null),
            HostValue::Int(i) => Ok(converter::integer_to_number(*i)),
            HostValue::Float(f) => Ok(converter::number_to_double(*f)),
            HostValue::Text(s) => Ok(converter::string_to_text(s)),
            HostValue::Bool(b) => Ok(converter::boolean_to_integer(*b)),
            HostValue::Date(d) => self.adapt_date(d).map(|dt| converter::date_to_text(&dt)),
            HostValue::Blob(blob) => self.adapt_blob(blob.as_ref(), location).await,
            HostValue::Buffer(buffer) => Ok(self.adapt_buffer(buffer)),
            HostValue::Custom(custom) => self.unknown.coerce(custom, location),
        }
    }

    fn adapt_date(&self, value: &HostDate) -> Result<DateTime<Utc>, SqlBridgeError> {
        value
            .value()
            .ok_or_else(|| SqlBridgeError::invalid_argument("Invalid Date"))
    }

    async fn adapt_blob(
        &self,
        blob: &dyn BlobSource,
        location: &ParamLocation,
    ) -> Result<WireValue, SqlBridgeError> {
        converter::blob_to_byte_array(blob)
            .await
            .map_err(|source| SqlBridgeError::BlobRead {
                location: location.clone(),
                source,
            })
    }

    fn adapt_buffer(&self, buffer: &ByteBuffer) -> WireValue {
        converter::buffer_to_byte_array(buffer)
    }

    /// Coerce an array of rows, keeping row and column order.
    ///
    /// Blobs are read one after another, so output order never depends on read timing.
    ///
    /// # Errors
    ///
    /// Fails on the first value that cannot be coerced.
    pub async fn process_rows(
        &self,
        rows: &[Vec<HostValue>],
    ) -> Result<Vec<Vec<WireValue>>, SqlBridgeError> {
        let mut out = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let mut out_row = Vec::with_capacity(row.len());
            for (col_idx, value) in row.iter().enumerate() {
                let location = ParamLocation::Cell {
                    row: row_idx,
                    column: col_idx,
                };
                out_row.push(self.adapt_value(value, &location).await?);
            }
            out.push(out_row);
        }
        Ok(out)
    }

    /// Coerce a keyed collection.
    ///
    /// Absent entries and empty lists are dropped rather than sent as null or as an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Fails on the first value that cannot be coerced.
    pub async fn process_keyed(&self, input: &KeyedParams) -> Result<NamedParams, SqlBridgeError> {
        let mut out = NamedParams::new();
        for (key, param) in input {
            let adapted = match param {
                HostParam::Absent => continue,
                HostParam::List(values) if values.is_empty() => continue,
                HostParam::List(values) => {
                    let mut list = Vec::with_capacity(values.len());
                    for (index, value) in values.iter().enumerate() {
                        let location = ParamLocation::KeyIndex {
                            key: key.clone(),
                            index,
                        };
                        list.push(self.adapt_value(value, &location).await?);
                    }
                    WireParam::List(list)
                }
                HostParam::Value(value) => {
                    let location = ParamLocation::Key(key.clone());
                    WireParam::Single(self.adapt_value(value, &location).await?)
                }
            };
            out.insert(key.clone(), adapted);
        }
        Ok(out)
    }

    /// Adapt raw parameters according to their shape.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`process_rows`](Self::process_rows) and
    /// [`process_keyed`](Self::process_keyed).
    pub async fn adapt(&self, params: &RawParams) -> Result<ParameterPayload, SqlBridgeError> {
        match params {
            RawParams::None => Ok(ParameterPayload::None),
            RawParams::Positional(rows) => Ok(ParameterPayload::Rows(self.process_rows(rows).await?)),
            RawParams::Keyed(keyed) => Ok(ParameterPayload::Named(self.process_keyed(keyed).await?)),
        }
    }
}

/// Fluent builder for keyed parameters.
#[derive(Debug, Clone, Default)]
pub struct ParamBuilder {
    params: KeyedParams,
}

impl ParamBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, key: impl Into<String>, param: impl Into<HostParam>) -> Self {
        self.params.insert(key.into(), param.into());
        self
    }

    #[must_use]
    pub fn number(self, key: impl Into<String>, value: f64) -> Self {
        self.set(key, HostValue::Float(value))
    }

    #[must_use]
    pub fn integer(self, key: impl Into<String>, value: i64) -> Self {
        self.set(key, HostValue::Int(value))
    }

    #[must_use]
    pub fn boolean(self, key: impl Into<String>, value: bool) -> Self {
        self.set(key, HostValue::Bool(value))
    }

    #[must_use]
    pub fn text(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, HostValue::Text(value.into()))
    }

    #[must_use]
    pub fn date(self, key: impl Into<String>, value: impl Into<HostDate>) -> Self {
        self.set(key, HostValue::Date(value.into()))
    }

    #[must_use]
    pub fn bytes(self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.set(key, HostValue::Buffer(ByteBuffer::U8(value.into())))
    }

    #[must_use]
    pub fn buffer(self, key: impl Into<String>, value: ByteBuffer) -> Self {
        self.set(key, HostValue::Buffer(value))
    }

    #[must_use]
    pub fn blob(self, key: impl Into<String>, value: impl BlobSource + 'static) -> Self {
        self.set(key, HostValue::blob(value))
    }

    #[must_use]
    pub fn null(self, key: impl Into<String>) -> Self {
        self.set(key, HostValue::Null)
    }

    #[must_use]
    pub fn list<I, V>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<HostValue>,
    {
        self.set(key, HostParam::list(values))
    }

    /// Record the key as deliberately unset; it will not be sent.
    #[must_use]
    pub fn absent(self, key: impl Into<String>) -> Self {
        self.set(key, HostParam::Absent)
    }

    #[must_use]
    pub fn build(self) -> KeyedParams {
        self.params
    }
}

impl From<ParamBuilder> for RawParams {
    fn from(builder: ParamBuilder) -> Self {
        RawParams::Keyed(builder.build())
    }
}
