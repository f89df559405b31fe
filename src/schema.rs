use std::borrow::Cow;

use crate::query::{Query, SqlTemplate};

/// `CREATE INDEX IF NOT EXISTS` over a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndex {
    pub index_name: String,
    pub table_name: String,
    pub column_name: String,
}

impl CreateIndex {
    pub fn new(
        index_name: impl Into<String>,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
    ) -> Self {
        Self {
            index_name: index_name.into(),
            table_name: table_name.into(),
            column_name: column_name.into(),
        }
    }

    #[must_use]
    pub fn into_query(self) -> Query {
        Query::from_template(self)
    }
}

/// Wrap a whole name in backticks, doubling any it contains.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

impl SqlTemplate for CreateIndex {
    fn sql(&self) -> Cow<'_, str> {
        Cow::Owned(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_identifier(&self.index_name),
            quote_identifier(&self.table_name),
            quote_identifier(&self.column_name)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_index_quotes_every_name() {
        let q = CreateIndex::new("idx_test_name", "test", "name").into_query();
        assert_eq!(
            q.get_query(),
            "CREATE INDEX IF NOT EXISTS `idx_test_name` ON `test` (`name`)"
        );
    }

    #[test]
    fn embedded_backticks_cannot_close_the_identifier() {
        assert_eq!(quote_identifier("a`b"), "`a``b`");
    }
}
