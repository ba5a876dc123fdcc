use std::future::Future;

use super::error::StorageError;
use super::row::Record;

/// Executes finished statement text.
///
/// Implementations apply no policy of their own beyond running the
/// statement: no retries, no timeouts, no transactions.
pub trait Storage: Send + Sync {
    /// Run a row-returning statement and fetch every row.
    fn query(&self, sql: &str) -> impl Future<Output = Result<Vec<Record>, StorageError>> + Send;

    /// Run a statement and return the affected-row count.
    fn execute(&self, sql: &str) -> impl Future<Output = Result<u64, StorageError>> + Send;
}

/// Column metadata used to validate insert field maps.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub is_identity: bool,
}

impl TableColumn {
    /// Sequence-backed or identity column.
    pub fn is_autoincrement(&self) -> bool {
        self.is_identity
            || self
                .default_value
                .as_deref()
                .is_some_and(|d| d.starts_with("nextval("))
    }
}

/// Storage that can describe its tables.
pub trait RowStore: Storage {
    /// Columns of a physical table in ordinal order; empty when the table
    /// does not exist.
    fn table_columns(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<TableColumn>, StorageError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(default_value: Option<&str>, is_identity: bool) -> TableColumn {
        TableColumn {
            name: "bannerid".to_string(),
            data_type: "integer".to_string(),
            is_nullable: false,
            default_value: default_value.map(str::to_string),
            is_identity,
        }
    }

    #[test]
    fn test_autoincrement_detection() {
        assert!(column(Some("nextval('banners_bannerid_seq'::regclass)"), false).is_autoincrement());
        assert!(column(None, true).is_autoincrement());
        assert!(!column(Some("0"), false).is_autoincrement());
        assert!(!column(None, false).is_autoincrement());
    }
}
