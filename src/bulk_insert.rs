//! Multi-row INSERT generation.
//!
//! The statement ends in the `:BulkInsertValue` sentinel, which the native side expands
//! into `VALUES (...), (...)` and binds row by row. Rows are sent as given: callers
//! must supply wire values only. Table name and conflict clause are not sanitized;
//! column names are only backtick-wrapped.

use std::borrow::Cow;

use crate::bridge::NativeMethod;
use crate::query::{Query, SqlTemplate};
use crate::types::{ParameterPayload, WireValue};

/// Placeholder the native layer replaces with the row values.
pub const BULK_INSERT_VALUE: &str = ":BulkInsertValue";

/// Backtick-wrap a column reference.
///
/// The name is split on its first `.`; each piece not already starting with a backtick
/// is wrapped.
///
/// ```rust
/// use sql_bridge::bulk_insert::escape_column;
///
/// assert_eq!(escape_column("test.height"), "`test`.`height`");
/// assert_eq!(escape_column("`name`"), "`name`");
/// ```
#[must_use]
pub fn escape_column(column: &str) -> String {
    match column.split_once('.') {
        Some((table, field)) => format!("{}.{}", quote_piece(table), quote_piece(field)),
        None => quote_piece(column).into_owned(),
    }
}

fn quote_piece(piece: &str) -> Cow<'_, str> {
    if piece.starts_with('`') {
        Cow::Borrowed(piece)
    } else {
        Cow::Owned(format!("`{piece}`"))
    }
}

/// Template for `INSERT INTO <table> (<columns>) :BulkInsertValue <on conflict>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkInsert {
    table: String,
    columns: Vec<String>,
    on_conflict: Option<String>,
}

impl BulkInsert {
    pub fn new<I, S>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            on_conflict: None,
        }
    }

    /// Conflict clause appended verbatim, e.g.
    /// `ON CONFLICT (id) DO UPDATE SET name = excluded.name`.
    #[must_use]
    pub fn on_conflict(mut self, clause: impl Into<String>) -> Self {
        self.on_conflict = Some(clause.into());
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Bind pre-typed rows and produce an executable query on the `bulkInsert` entry point.
    #[must_use]
    pub fn into_query(self, rows: Vec<Vec<WireValue>>) -> Query {
        Query::from_template(self)
            .bind_wire(ParameterPayload::Rows(rows))
            .with_method(NativeMethod::BulkInsert)
    }
}

impl SqlTemplate for BulkInsert {
    fn sql(&self) -> Cow<'_, str> {
        let columns = self
            .columns
            .iter()
            .map(|c| escape_column(c))
            .collect::<Vec<_>>()
            .join(",");
        let mut sql = format!(
            "INSERT INTO {} ({columns}) {BULK_INSERT_VALUE}",
            self.table
        );
        if let Some(clause) = self.on_conflict.as_deref().filter(|c| !c.trim().is_empty()) {
            sql.push(' ');
            sql.push_str(clause.trim());
        }
        Cow::Owned(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_plain_dotted_and_quoted_columns() {
        assert_eq!(escape_column("id"), "`id`");
        assert_eq!(escape_column("test.height"), "`test`.`height`");
        assert_eq!(escape_column("`name`"), "`name`");
        assert_eq!(escape_column("`test`.`data`"), "`test`.`data`");
        assert_eq!(escape_column("test.`data`"), "`test`.`data`");
    }

    #[test]
    fn splits_only_on_the_first_dot() {
        assert_eq!(escape_column("main.test.id"), "`main`.`test.id`");
    }

    #[test]
    fn statement_lists_escaped_columns() {
        let insert = BulkInsert::new("test", ["id", "name", "test.height", "`test`.`data`"]);
        let sql = insert.sql();
        assert!(sql.contains("`id`,`name`,`test`.`height`,`test`.`data`"));
        assert_eq!(
            sql,
            "INSERT INTO test (`id`,`name`,`test`.`height`,`test`.`data`) :BulkInsertValue"
        );
    }

    #[test]
    fn conflict_clause_is_appended() {
        let sql = BulkInsert::new("test", ["id", "name"])
            .on_conflict("ON CONFLICT (id) DO UPDATE SET name = excluded.name")
            .sql()
            .into_owned();
        assert!(sql.ends_with(":BulkInsertValue ON CONFLICT (id) DO UPDATE SET name = excluded.name"));
    }

    #[test]
    fn query_uses_bulk_entry_point_and_passthrough_rows() {
        let rows = vec![vec![WireValue::Number(1.0), WireValue::Text("a".into())]];
        let query = BulkInsert::new("test", ["id", "name"]).into_query(rows.clone());
        assert_eq!(query.native_method(), NativeMethod::BulkInsert);
        match query.params() {
            crate::query::QueryParams::Passthrough(ParameterPayload::Rows(r)) => assert_eq!(r, &rows),
            other => panic!("unexpected params: {other:?}"),
        }
    }
}
