//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::adapter::{CoerceUnknown, LenientCoercion, ParamAdapter, ParamBuilder, StrictCoercion};
pub use crate::bridge::{Bridge, NativeMethod, SERVICE_NAME};
pub use crate::bulk_insert::{BulkInsert, escape_column};
pub use crate::config::{BridgeConfig, BridgeConfigBuilder, UnknownTypePolicy};
pub use crate::converter::{BlobSource, FileBlob, MemoryBlob};
pub use crate::database::{Database, DatabaseHandle};
pub use crate::error::{BridgeError, ErrorDetails, NativeErrorCode, SqlBridgeError};
pub use crate::query::{Query, QueryParams, SqlTemplate};
pub use crate::schema::CreateIndex;
pub use crate::sqlite::{OpenFlags, Sqlite};
pub use crate::transaction::{self, TransactionMode};
pub use crate::types::{
    ByteBuffer, CustomValue, HostDate, HostParam, HostValue, KeyedParams, NamedParams,
    ParamLocation, ParameterPayload, RawParams, WireParam, WireValue,
};
pub use crate::validate::validate_parameter_names;
