use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::converter::BlobSource;

/// Largest integer a double carries exactly; integral numbers up to here go out as JSON integers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A scalar the native bridge accepts.
///
/// These are the only values that ever cross the bridge:
/// ```rust
/// use sql_bridge::prelude::*;
///
/// let row = vec![
///     WireValue::Number(1.0),
///     WireValue::Text("alice".into()),
///     WireValue::Null,
///     WireValue::ByteArray(vec![0xde, 0xad]),
/// ];
/// # let _ = row;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Text(String),
    /// Integer and floating point values share one double-precision representation.
    Number(f64),
    Null,
    ByteArray(Vec<u8>),
}

impl WireValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let WireValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        if let WireValue::Number(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let WireValue::ByteArray(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireValue::Text(s) => serializer.serialize_str(s),
            WireValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    #[allow(clippy::cast_possible_truncation)]
                    let whole = *n as i64;
                    serializer.serialize_i64(whole)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            WireValue::Null => serializer.serialize_unit(),
            WireValue::ByteArray(bytes) => {
                let mut record = serializer.serialize_struct("ByteArray", 2)?;
                record.serialize_field("type", "bytearray")?;
                record.serialize_field("value", bytes)?;
                record.end()
            }
        }
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::Text(value.to_string())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::Text(value)
    }
}

impl From<f64> for WireValue {
    fn from(value: f64) -> Self {
        WireValue::Number(value)
    }
}

impl From<i32> for WireValue {
    fn from(value: i32) -> Self {
        WireValue::Number(f64::from(value))
    }
}

impl From<Vec<u8>> for WireValue {
    fn from(value: Vec<u8>) -> Self {
        WireValue::ByteArray(value)
    }
}

impl<T: Into<WireValue>> From<Option<T>> for WireValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(WireValue::Null, Into::into)
    }
}

/// A named bind value: a single scalar, or a list for `IN (:name)` style binds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireParam {
    Single(WireValue),
    List(Vec<WireValue>),
}

pub type NamedParams = BTreeMap<String, WireParam>;

/// What actually crosses the bridge as the third query argument.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParameterPayload {
    #[default]
    None,
    Named(NamedParams),
    Rows(Vec<Vec<WireValue>>),
}

impl ParameterPayload {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn as_named(&self) -> Option<&NamedParams> {
        if let ParameterPayload::Named(named) = self {
            Some(named)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_rows(&self) -> Option<&[Vec<WireValue>]> {
        if let ParameterPayload::Rows(rows) = self {
            Some(rows)
        } else {
            None
        }
    }
}

impl Serialize for ParameterPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParameterPayload::None => serializer.serialize_unit(),
            ParameterPayload::Named(named) => {
                let mut map = serializer.serialize_map(Some(named.len()))?;
                for (name, value) in named {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            ParameterPayload::Rows(rows) => rows.serialize(serializer),
        }
    }
}

/// A date as the application handed it over; it may not denote a real instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostDate(Option<DateTime<Utc>>);

impl HostDate {
    /// Outer limit on a timestamp's distance from the epoch, in milliseconds.
    ///
    /// The representable range is narrower: chrono stops near year ±262 143
    /// (about ±8.2e15 ms), and timestamps between that and this limit are invalid too.
    pub const MAX_EPOCH_MILLIS: f64 = 8.64e15;

    #[must_use]
    pub fn new(value: DateTime<Utc>) -> Self {
        Self(Some(value))
    }

    #[must_use]
    pub fn invalid() -> Self {
        Self(None)
    }

    /// NaN, infinite, and out-of-range timestamps produce an invalid date, including
    /// those within [`MAX_EPOCH_MILLIS`](Self::MAX_EPOCH_MILLIS) that chrono cannot represent.
    #[must_use]
    pub fn from_timestamp_millis(millis: f64) -> Self {
        if !millis.is_finite() || millis.abs() > Self::MAX_EPOCH_MILLIS {
            return Self::invalid();
        }
        #[allow(clippy::cast_possible_truncation)]
        let whole = millis.trunc() as i64;
        Self(DateTime::from_timestamp_millis(whole))
    }

    /// Parse an RFC 3339 / ISO-8601 string; unparseable input yields an invalid date.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self(
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        )
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    #[must_use]
    pub fn value(&self) -> Option<DateTime<Utc>> {
        self.0
    }
}

impl From<DateTime<Utc>> for HostDate {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value)
    }
}

/// Fixed-size binary buffers; wider integer elements are laid out in native byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteBuffer {
    Raw(Vec<u8>),
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
}

impl ByteBuffer {
    /// Size of the buffer in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        match self {
            ByteBuffer::Raw(v) | ByteBuffer::U8(v) => v.len(),
            ByteBuffer::I8(v) => v.len(),
            ByteBuffer::U16(v) => v.len() * 2,
            ByteBuffer::I16(v) => v.len() * 2,
            ByteBuffer::U32(v) => v.len() * 4,
            ByteBuffer::I32(v) => v.len() * 4,
        }
    }
}

/// A value of an application type this crate has no rule for.
///
/// `type_name` is what error messages report; `value` is the value's own JSON form,
/// handed to the adapter's unknown-value strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomValue {
    pub type_name: String,
    pub value: JsonValue,
}

impl CustomValue {
    pub fn new(type_name: impl Into<String>, value: JsonValue) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }
}

/// A loosely typed application value, before coercion.
///
/// Variants are listed in the order the adapter tries them.
#[derive(Debug, Clone)]
pub enum HostValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(HostDate),
    Blob(Arc<dyn BlobSource>),
    Buffer(ByteBuffer),
    Custom(CustomValue),
}

impl HostValue {
    /// Short name of the value's kind, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            HostValue::Null => "null",
            HostValue::Int(_) => "integer",
            HostValue::Float(_) => "float",
            HostValue::Text(_) => "text",
            HostValue::Bool(_) => "boolean",
            HostValue::Date(_) => "date",
            HostValue::Blob(_) => "blob",
            HostValue::Buffer(_) => "buffer",
            HostValue::Custom(custom) => &custom.type_name,
        }
    }

    pub fn blob(source: impl BlobSource + 'static) -> Self {
        HostValue::Blob(Arc::new(source))
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(i64::from(value))
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Float(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Text(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Text(value)
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for HostValue {
    fn from(value: DateTime<Utc>) -> Self {
        HostValue::Date(HostDate::new(value))
    }
}

/// Naive timestamps are taken to be UTC.
impl From<NaiveDateTime> for HostValue {
    fn from(value: NaiveDateTime) -> Self {
        HostValue::Date(HostDate::new(value.and_utc()))
    }
}

impl From<HostDate> for HostValue {
    fn from(value: HostDate) -> Self {
        HostValue::Date(value)
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(value: Vec<u8>) -> Self {
        HostValue::Buffer(ByteBuffer::U8(value))
    }
}

impl From<&[u8]> for HostValue {
    fn from(value: &[u8]) -> Self {
        HostValue::Buffer(ByteBuffer::U8(value.to_vec()))
    }
}

impl From<ByteBuffer> for HostValue {
    fn from(value: ByteBuffer) -> Self {
        HostValue::Buffer(value)
    }
}

impl From<CustomValue> for HostValue {
    fn from(value: CustomValue) -> Self {
        HostValue::Custom(value)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Null, Into::into)
    }
}

/// One entry of a keyed parameter collection.
#[derive(Debug, Clone)]
pub enum HostParam {
    /// Left out of the adapted payload entirely.
    Absent,
    Value(HostValue),
    List(Vec<HostValue>),
}

impl HostParam {
    pub fn value(value: impl Into<HostValue>) -> Self {
        HostParam::Value(value.into())
    }

    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<HostValue>,
    {
        HostParam::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<HostValue> for HostParam {
    fn from(value: HostValue) -> Self {
        HostParam::Value(value)
    }
}

impl From<Vec<HostValue>> for HostParam {
    fn from(values: Vec<HostValue>) -> Self {
        HostParam::List(values)
    }
}

pub type KeyedParams = BTreeMap<String, HostParam>;

/// Raw parameters a query was built with, in one of the two legal shapes.
#[derive(Debug, Clone, Default)]
pub enum RawParams {
    #[default]
    None,
    Positional(Vec<Vec<HostValue>>),
    Keyed(KeyedParams),
}

impl From<KeyedParams> for RawParams {
    fn from(value: KeyedParams) -> Self {
        RawParams::Keyed(value)
    }
}

impl From<Vec<Vec<HostValue>>> for RawParams {
    fn from(value: Vec<Vec<HostValue>>) -> Self {
        RawParams::Positional(value)
    }
}

/// Where inside a parameter collection a value sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamLocation {
    Value,
    Key(String),
    KeyIndex { key: String, index: usize },
    Cell { row: usize, column: usize },
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamLocation::Value => write!(f, "value"),
            ParamLocation::Key(key) => write!(f, "key `{key}`"),
            ParamLocation::KeyIndex { key, index } => write!(f, "key `{key}` index {index}"),
            ParamLocation::Cell { row, column } => write!(f, "row {row} column {column}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_values_serialize_to_plugin_format() {
        let row = vec![
            WireValue::Number(1.0),
            WireValue::Number(1.5),
            WireValue::Text("a".into()),
            WireValue::Null,
            WireValue::ByteArray(vec![0, 255]),
        ];
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!([1, 1.5, "a", null, {"type": "bytearray", "value": [0, 255]}])
        );
    }

    #[test]
    fn large_integral_numbers_stay_floats() {
        let v = serde_json::to_value(WireValue::Number(1e300)).unwrap();
        assert_eq!(v, json!(1e300));
    }

    #[test]
    fn named_payload_serializes_lists_inline() {
        let mut named = NamedParams::new();
        named.insert(
            "ids".into(),
            WireParam::List(vec![WireValue::Number(1.0), WireValue::Number(2.0)]),
        );
        named.insert("name".into(), WireParam::Single("bob".into()));
        let payload = ParameterPayload::Named(named);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"ids": [1, 2], "name": "bob"})
        );
        assert_eq!(serde_json::to_value(ParameterPayload::None).unwrap(), json!(null));
    }

    #[test]
    fn host_date_rejects_nan_and_out_of_range() {
        assert!(!HostDate::from_timestamp_millis(f64::NAN).is_valid());
        assert!(!HostDate::from_timestamp_millis(f64::INFINITY).is_valid());
        assert!(!HostDate::from_timestamp_millis(8.64e15 + 1.0).is_valid());
        assert!(HostDate::from_timestamp_millis(0.0).is_valid());
        assert!(HostDate::from_timestamp_millis(8.2e15).is_valid());
        assert!(HostDate::from_timestamp_millis(-8.2e15).is_valid());
        assert!(!HostDate::from_timestamp_millis(8.3e15).is_valid());
        assert!(!HostDate::parse("yesterday").is_valid());
    }

    #[test]
    fn buffer_byte_len_counts_bytes() {
        assert_eq!(ByteBuffer::U16(vec![1, 2, 3]).byte_len(), 6);
        assert_eq!(ByteBuffer::I32(vec![-1]).byte_len(), 4);
        assert_eq!(ByteBuffer::I8(vec![-1, 1]).byte_len(), 2);
    }

    #[test]
    fn location_display_names_the_offender() {
        let loc = ParamLocation::KeyIndex {
            key: "ids".into(),
            index: 2,
        };
        assert_eq!(loc.to_string(), "key `ids` index 2");
        assert_eq!(
            ParamLocation::Cell { row: 0, column: 3 }.to_string(),
            "row 0 column 3"
        );
    }
}
