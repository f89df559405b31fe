//! Primitive value conversion.
//!
//! Each function is total on its own input domain. Picking the right converter,
//! and checking dates for validity, is the adapter's job.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};

use crate::types::{ByteBuffer, WireValue};

/// Binary content that has to be read (possibly asynchronously) before it can be sent.
#[async_trait]
pub trait BlobSource: fmt::Debug + Send + Sync {
    /// Read the whole object into memory.
    async fn read_all(&self) -> std::io::Result<Vec<u8>>;

    /// Size in bytes, when known up front.
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

/// A blob already held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlob(Arc<[u8]>);

impl MemoryBlob {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }
}

#[async_trait]
impl BlobSource for MemoryBlob {
    async fn read_all(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.0.to_vec())
    }

    fn size_hint(&self) -> Option<u64> {
        u64::try_from(self.0.len()).ok()
    }
}

/// A blob backed by a file, read with `tokio::fs` when the parameter is adapted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    path: PathBuf,
}

impl FileBlob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BlobSource for FileBlob {
    async fn read_all(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

#[must_use]
pub fn number_to_double(value: f64) -> WireValue {
    WireValue::Number(value)
}

/// Integers beyond 2^53 lose precision; the wire only carries doubles.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn integer_to_number(value: i64) -> WireValue {
    WireValue::Number(value as f64)
}

#[must_use]
pub fn boolean_to_integer(value: bool) -> WireValue {
    WireValue::Number(if value { 1.0 } else { 0.0 })
}

#[must_use]
pub fn string_to_text(value: &str) -> WireValue {
    WireValue::Text(value.to_string())
}

/// `YYYY-MM-DDTHH:MM:SS.sssZ`, always in UTC with millisecond precision.
///
/// Years outside `0..=9999` use the signed six-digit form, e.g. `+012345-01-01T...`.
#[must_use]
pub fn date_to_text(value: &DateTime<Utc>) -> WireValue {
    let year = value.year();
    if (0..=9999).contains(&year) {
        return WireValue::Text(value.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    let sign = if year < 0 { '-' } else { '+' };
    WireValue::Text(format!(
        "{sign}{:06}-{}",
        year.unsigned_abs(),
        value.format("%m-%dT%H:%M:%S%.3fZ")
    ))
}

#[must_use]
pub fn bytes_to_byte_array(value: &[u8]) -> WireValue {
    WireValue::ByteArray(value.to_vec())
}

/// Flatten a typed buffer to its bytes, in memory order.
#[must_use]
pub fn buffer_to_byte_array(value: &ByteBuffer) -> WireValue {
    WireValue::ByteArray(normalize_buffer(value))
}

/// Read a blob fully and convert it to a byte array.
///
/// # Errors
///
/// Returns the I/O error raised by the blob source.
pub async fn blob_to_byte_array(value: &dyn BlobSource) -> std::io::Result<WireValue> {
    let bytes = value.read_all().await?;
    Ok(WireValue::ByteArray(bytes))
}

fn normalize_buffer(value: &ByteBuffer) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.byte_len());
    match value {
        ByteBuffer::Raw(v) | ByteBuffer::U8(v) => out.extend_from_slice(v),
        ByteBuffer::I8(v) => out.extend(v.iter().map(|b| b.to_ne_bytes()[0])),
        ByteBuffer::U16(v) => v.iter().for_each(|x| out.extend(x.to_ne_bytes())),
        ByteBuffer::I16(v) => v.iter().for_each(|x| out.extend(x.to_ne_bytes())),
        ByteBuffer::U32(v) => v.iter().for_each(|x| out.extend(x.to_ne_bytes())),
        ByteBuffer::I32(v) => v.iter().for_each(|x| out.extend(x.to_ne_bytes())),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn booleans_become_zero_or_one() {
        assert_eq!(boolean_to_integer(true), WireValue::Number(1.0));
        assert_eq!(boolean_to_integer(false), WireValue::Number(0.0));
    }

    #[test]
    fn dates_render_as_iso_8601_utc_millis() {
        let dt = Utc.with_ymd_and_hms(2022, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            date_to_text(&dt),
            WireValue::Text("2022-03-04T05:06:07.000Z".into())
        );
    }

    #[test]
    fn extended_years_use_signed_six_digits() {
        let far = Utc.with_ymd_and_hms(12345, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            date_to_text(&far),
            WireValue::Text("+012345-01-01T00:00:00.000Z".into())
        );
        let bc = Utc.with_ymd_and_hms(-1, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            date_to_text(&bc),
            WireValue::Text("-000001-01-01T00:00:00.000Z".into())
        );
        let zero = Utc.with_ymd_and_hms(0, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            date_to_text(&zero),
            WireValue::Text("0000-06-01T12:00:00.000Z".into())
        );
    }

    #[test]
    fn signed_bytes_map_into_unsigned_range() {
        let out = buffer_to_byte_array(&ByteBuffer::I8(vec![-1, 0, 127, -128]));
        assert_eq!(out, WireValue::ByteArray(vec![255, 0, 127, 128]));
    }

    #[test]
    fn wide_buffers_keep_native_byte_order() {
        let words = vec![0x0102_u16, 0xfffe];
        let out = buffer_to_byte_array(&ByteBuffer::U16(words.clone()));
        let bytes = out.as_bytes().unwrap();
        assert_eq!(bytes.len(), 4);
        let rebuilt: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(rebuilt, words);

        let out = buffer_to_byte_array(&ByteBuffer::I32(vec![-2]));
        assert_eq!(out.as_bytes().unwrap(), (-2_i32).to_ne_bytes());
    }

    #[tokio::test]
    async fn memory_blob_reads_back_whole() {
        let blob = MemoryBlob::new(vec![1_u8, 2, 3]);
        assert_eq!(blob.size_hint(), Some(3));
        let out = blob_to_byte_array(&blob).await.unwrap();
        assert_eq!(out, WireValue::ByteArray(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn missing_file_blob_surfaces_io_error() {
        let blob = FileBlob::new("/definitely/not/here.bin");
        let err = blob_to_byte_array(&blob).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
