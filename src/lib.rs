//! Query construction and parameter marshalling in front of a native SQLite engine.
//!
//! Application values go in; SQL text plus a payload of wire primitives (text, number,
//! null, byte array) come out and cross an opaque [`Bridge`](bridge::Bridge) to native
//! code. Everything the native side cannot be trusted to re-check (bind names, value
//! types, bulk-insert column identifiers) is checked here, before the call.

pub mod adapter;
pub mod bridge;
pub mod bulk_insert;
pub mod config;
pub mod converter;
pub mod database;
pub mod error;
pub mod prelude;
pub mod query;
pub mod schema;
pub mod sqlite;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transaction;
pub mod types;
pub mod validate;

pub use error::{BridgeError, SqlBridgeError};
pub use query::Query;
pub use types::{ParameterPayload, WireValue};
