use thiserror::Error;

use crate::db::StorageError;

/// Failures raised while turning an entity request into statement text.
///
/// Every variant except the two delete/update guards points at a defect in
/// the static catalogs or at a caller passing a name that does not exist.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ComposeError {
    #[error("Unknown entity kind: {0}")]
    UnknownEntity(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("No tables to select from")]
    EmptyTableSet,

    #[error("Tables cannot be linked by any join predicate: {}", .0.join(", "))]
    UnlinkableTables(Vec<String>),

    #[error("No tables to delete from")]
    NoDeleteTargets,

    #[error("Invalid WHERE clause: refusing to run a DELETE without limitations")]
    EmptyWhereClause,

    #[error("Nothing to update")]
    EmptyAssignments,
}

/// Errors surfaced by the data access layer.
#[derive(Debug, Error)]
pub enum DalError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// Field map rejected by the row abstraction (unknown table or column).
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlinkable_lists_aliases() {
        let err = ComposeError::UnlinkableTables(vec!["a".into(), "t".into()]);
        assert_eq!(
            err.to_string(),
            "Tables cannot be linked by any join predicate: a, t"
        );
    }

    #[test]
    fn test_compose_error_converts_into_dal_error() {
        let err: DalError = ComposeError::EmptyWhereClause.into();
        assert!(matches!(err, DalError::Compose(ComposeError::EmptyWhereClause)));
        assert!(err.to_string().contains("DELETE"));
    }
}
