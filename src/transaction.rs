//! Transaction control statements.
//!
//! Statement text comes from a match over [`TransactionMode`]; nothing caller-supplied
//! is ever interpolated. The caller sequences begin / statements / commit: each
//! `execute` must finish before the next is issued.

use std::borrow::Cow;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::SqlBridgeError;
use crate::query::{Query, SqlTemplate};

/// See <https://www.sqlite.org/lang_transaction.html>.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    #[default]
    Deferred,
    Immediate,
    Exclusive,
}

impl TransactionMode {
    #[must_use]
    pub fn begin_sql(self) -> &'static str {
        match self {
            TransactionMode::Deferred => "BEGIN DEFERRED TRANSACTION",
            TransactionMode::Immediate => "BEGIN IMMEDIATE TRANSACTION",
            TransactionMode::Exclusive => "BEGIN EXCLUSIVE TRANSACTION",
        }
    }
}

impl FromStr for TransactionMode {
    type Err = SqlBridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deferred" => Ok(TransactionMode::Deferred),
            "immediate" => Ok(TransactionMode::Immediate),
            "exclusive" => Ok(TransactionMode::Exclusive),
            _ => Err(SqlBridgeError::invalid_argument(format!(
                "Invalid TransactionMode `{s}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatement {
    Begin(TransactionMode),
    Commit,
    Rollback,
}

impl SqlTemplate for TransactionStatement {
    fn sql(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self {
            TransactionStatement::Begin(mode) => mode.begin_sql(),
            TransactionStatement::Commit => "COMMIT",
            TransactionStatement::Rollback => "ROLLBACK",
        })
    }
}

#[must_use]
pub fn begin(mode: TransactionMode) -> Query {
    Query::from_template(TransactionStatement::Begin(mode))
}

#[must_use]
pub fn commit() -> Query {
    Query::from_template(TransactionStatement::Commit)
}

#[must_use]
pub fn rollback() -> Query {
    Query::from_template(TransactionStatement::Rollback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_mode_has_fixed_text() {
        assert_eq!(begin(TransactionMode::Deferred).get_query(), "BEGIN DEFERRED TRANSACTION");
        assert_eq!(begin(TransactionMode::Immediate).get_query(), "BEGIN IMMEDIATE TRANSACTION");
        assert_eq!(begin(TransactionMode::Exclusive).get_query(), "BEGIN EXCLUSIVE TRANSACTION");
        assert_eq!(commit().get_query(), "COMMIT");
        assert_eq!(rollback().get_query(), "ROLLBACK");
    }

    #[test]
    fn default_mode_is_deferred() {
        assert_eq!(TransactionMode::default(), TransactionMode::Deferred);
    }

    #[test]
    fn parses_known_modes_case_insensitively() {
        assert_eq!("IMMEDIATE".parse::<TransactionMode>().unwrap(), TransactionMode::Immediate);
        assert_eq!("exclusive".parse::<TransactionMode>().unwrap(), TransactionMode::Exclusive);
    }

    #[test]
    fn rejects_unknown_modes() {
        for bad in ["", "deferred; DROP TABLE test", "EXCLUSIVE TRANSACTION", "shared"] {
            let err = bad.parse::<TransactionMode>().unwrap_err();
            assert!(matches!(err, SqlBridgeError::InvalidArgument(_)), "{bad}");
        }
    }
}
