use std::error::Error as StdError;
use std::fmt;

use deadpool_postgres::PoolError;
use thiserror::Error;

/// Broad class of a storage failure, derived from the SQLSTATE class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Class 42 syntax errors.
    Syntax,
    /// Missing table or column, ambiguous reference.
    Semantic,
    /// Data exceptions and constraint violations.
    Execution,
    Transaction,
    /// Lost or refused connections, pool exhaustion.
    Connection,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Syntax => write!(f, "Syntax Error"),
            ErrorCategory::Semantic => write!(f, "Semantic Error"),
            ErrorCategory::Execution => write!(f, "Execution Error"),
            ErrorCategory::Transaction => write!(f, "Transaction Error"),
            ErrorCategory::Connection => write!(f, "Connection Error"),
            ErrorCategory::Unknown => write!(f, "Error"),
        }
    }
}

/// A failure reported by the storage backend, passed to callers unmodified
/// apart from this structured form.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{category}: {message}")]
pub struct StorageError {
    pub category: ErrorCategory,
    /// ERROR, FATAL, ...
    pub severity: String,
    /// SQLSTATE, empty for non-database failures.
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    /// 1-based character offset into the statement.
    pub position: Option<u32>,
    pub table: Option<String>,
    pub column: Option<String>,
    pub constraint: Option<String>,
    /// Line and column computed from `position`.
    pub line: Option<usize>,
    pub col: Option<usize>,
}

impl StorageError {
    /// Build from a driver error, using the statement text to locate the
    /// reported position.
    pub fn from_pg_error(err: &tokio_postgres::Error, statement: &str) -> Self {
        Self::from_driver(err, Some(statement))
    }

    /// `line`/`col` stay unset when the statement text is unknown.
    fn from_driver(err: &tokio_postgres::Error, statement: Option<&str>) -> Self {
        let Some(db_err) = err.as_db_error() else {
            let category = if err.source().is_some() || err.is_closed() {
                ErrorCategory::Connection
            } else {
                ErrorCategory::Unknown
            };
            return StorageError {
                category,
                detail: err.source().map(|e| e.to_string()),
                ..Self::from_string(err.to_string())
            };
        };

        let code = db_err.code().code().to_string();
        let position = db_err.position().and_then(|p| match p {
            tokio_postgres::error::ErrorPosition::Original(pos) => Some(*pos),
            tokio_postgres::error::ErrorPosition::Internal { .. } => None,
        });
        let location = statement
            .zip(position)
            .and_then(|(sql, pos)| locate(sql, pos));
        let (line, col) = location.map_or((None, None), |(l, c)| (Some(l), Some(c)));

        StorageError {
            category: categorize_sqlstate(&code),
            severity: db_err.severity().to_string(),
            code,
            message: db_err.message().to_string(),
            detail: db_err.detail().map(str::to_string),
            hint: db_err.hint().map(str::to_string),
            position,
            table: db_err.table().map(str::to_string),
            column: db_err.column().map(str::to_string),
            constraint: db_err.constraint().map(str::to_string),
            line,
            col,
        }
    }

    pub fn from_string(message: String) -> Self {
        StorageError {
            category: ErrorCategory::Unknown,
            severity: "ERROR".to_string(),
            code: String::new(),
            message,
            detail: None,
            hint: None,
            position: None,
            table: None,
            column: None,
            constraint: None,
            line: None,
            col: None,
        }
    }

    pub fn connection(message: String) -> Self {
        StorageError {
            category: ErrorCategory::Connection,
            ..Self::from_string(message)
        }
    }

    /// Multi-line rendering for terminal output.
    pub fn display_full(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.category, self.message)];

        if let (Some(line), Some(col)) = (self.line, self.col) {
            lines.push(format!("  at line {}, column {}", line, col));
        }
        if !self.code.is_empty() {
            lines.push(format!("  SQLSTATE: {}", self.code));
        }
        if let Some(detail) = &self.detail {
            lines.push(format!("  Detail: {}", detail));
        }
        if let Some(hint) = &self.hint {
            lines.push(format!("  Hint: {}", hint));
        }
        match (&self.table, &self.column) {
            (Some(table), Some(column)) => lines.push(format!("  Object: {}.{}", table, column)),
            (Some(table), None) => lines.push(format!("  Table: {}", table)),
            _ => {}
        }
        if let Some(constraint) = &self.constraint {
            lines.push(format!("  Constraint: {}", constraint));
        }

        lines.join("\n")
    }
}

impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        StorageError::from_driver(&err, None)
    }
}

impl From<PoolError> for StorageError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Backend(e) => e.into(),
            other => StorageError::connection(other.to_string()),
        }
    }
}

/// Line and column (both 1-based) of a 1-based character position.
fn locate(statement: &str, position: u32) -> Option<(usize, usize)> {
    if statement.is_empty() {
        return None;
    }
    let preceding = (position as usize).saturating_sub(1);
    let before: String = statement.chars().take(preceding).collect();
    let line = before.matches('\n').count() + 1;
    let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    Some((line, col))
}

fn categorize_sqlstate(code: &str) -> ErrorCategory {
    if code.len() < 2 {
        return ErrorCategory::Unknown;
    }
    match &code[..2] {
        "42" if code == "42601" || code == "42000" => ErrorCategory::Syntax,
        "42" => ErrorCategory::Semantic,
        "22" | "23" | "53" | "54" | "55" | "57" => ErrorCategory::Execution,
        "25" | "40" => ErrorCategory::Transaction,
        "08" => ErrorCategory::Connection,
        _ => ErrorCategory::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_sqlstate() {
        assert_eq!(categorize_sqlstate("42601"), ErrorCategory::Syntax);
        assert_eq!(categorize_sqlstate("42P01"), ErrorCategory::Semantic);
        assert_eq!(categorize_sqlstate("42703"), ErrorCategory::Semantic);
        assert_eq!(categorize_sqlstate("23505"), ErrorCategory::Execution);
        assert_eq!(categorize_sqlstate("40001"), ErrorCategory::Transaction);
        assert_eq!(categorize_sqlstate("08006"), ErrorCategory::Connection);
        assert_eq!(categorize_sqlstate("XX000"), ErrorCategory::Unknown);
        assert_eq!(categorize_sqlstate("4"), ErrorCategory::Unknown);
    }

    #[test]
    fn test_locate_position() {
        let statement = "SELECT z.zoneid\nFROM zones AS z\nWHERE z.zoneid=1";
        assert_eq!(locate(statement, 1), Some((1, 1)));
        assert_eq!(locate(statement, 8), Some((1, 8)));
        assert_eq!(locate(statement, 17), Some((2, 1)));
        assert_eq!(locate(statement, 33), Some((3, 1)));
        assert_eq!(locate(statement, 0), Some((1, 1)));
        assert_eq!(locate(statement, 500), Some((3, 17)));
    }

    #[test]
    fn test_locate_counts_characters() {
        let statement = "SELECT 'é'\nFROM zones";
        assert_eq!(locate(statement, 12), Some((2, 1)));
        assert_eq!(locate(statement, 10), Some((1, 10)));
    }

    #[test]
    fn test_unknown_statement_has_no_location() {
        assert_eq!(locate("", 5), None);
    }

    #[test]
    fn test_display_and_full_rendering() {
        let err = StorageError {
            category: ErrorCategory::Semantic,
            code: "42P01".to_string(),
            hint: Some("Check the table prefix.".to_string()),
            table: Some("ox_zones".to_string()),
            line: Some(2),
            col: Some(6),
            ..StorageError::from_string("relation \"ox_zones\" does not exist".to_string())
        };
        assert_eq!(
            err.to_string(),
            "Semantic Error: relation \"ox_zones\" does not exist"
        );
        let full = err.display_full();
        assert!(full.contains("at line 2, column 6"));
        assert!(full.contains("SQLSTATE: 42P01"));
        assert!(full.contains("Hint: Check the table prefix."));
        assert!(full.contains("Table: ox_zones"));
    }

    #[test]
    fn test_connection_constructor() {
        let err = StorageError::connection("pool closed".to_string());
        assert_eq!(err.category, ErrorCategory::Connection);
        assert_eq!(err.to_string(), "Connection Error: pool closed");
    }
}
