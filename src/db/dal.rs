use tracing::debug;

use super::row::{KeyedRows, Record};
use super::storage::{RowStore, Storage};
use crate::composer::{self, EntityQuery};
use crate::config::BuilderConfig;
use crate::error::DalError;
use crate::schema::{Table, Tables};
use crate::sql::{
    compile_delete, compile_insert, compile_select, compile_update, Fields, InsertStatement,
    Predicate,
};

/// Composes statements and hands them to a storage backend.
pub struct Dal<S> {
    storage: S,
    config: BuilderConfig,
}

impl<S: Storage> Dal<S> {
    pub fn new(storage: S, config: BuilderConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Fetch the rows of an entity request keyed by `primary_key`.
    pub async fn get_entities(
        &self,
        query: &EntityQuery,
        primary_key: &str,
    ) -> Result<KeyedRows, DalError> {
        let select = composer::compose_select(query, &self.config)?;
        self.query(&compile_select(&select), primary_key).await
    }

    /// Run a SELECT and key its rows by the value of `primary_key`.
    pub async fn query(&self, sql: &str, primary_key: &str) -> Result<KeyedRows, DalError> {
        let records = self.storage.query(sql).await?;
        debug!(sql, rows = records.len(), "fetched");

        let mut keyed = KeyedRows::new();
        for record in records {
            let key = key_of(&record, primary_key)?;
            keyed.insert(key, record);
        }
        Ok(keyed)
    }

    /// Returns the number of affected rows.
    pub async fn update(
        &self,
        table: Table,
        fields: &Fields,
        filter: Vec<Predicate>,
    ) -> Result<u64, DalError> {
        let update = composer::update(table, fields, filter, &self.config)?;
        let sql = compile_update(&update);
        let affected = self.storage.execute(&sql).await?;
        debug!(sql = %sql, affected, "updated");
        Ok(affected)
    }

    /// Returns the number of deleted rows. A delete without predicates is
    /// refused before anything reaches storage.
    pub async fn delete(
        &self,
        tables: &Tables,
        filter: &[Predicate],
        other: Option<&Tables>,
    ) -> Result<u64, DalError> {
        let delete = composer::delete(tables, filter, other, &self.config)?;
        let sql = compile_delete(&delete);
        let affected = self.storage.execute(&sql).await?;
        debug!(sql = %sql, affected, "deleted");
        Ok(affected)
    }
}

impl<S: RowStore> Dal<S> {
    /// Name of the auto-increment column of `table`, if it has one.
    pub async fn id_column(&self, table: Table) -> Result<Option<String>, DalError> {
        let name = self.config.table_name(table);
        let columns = self.storage.table_columns(&name).await?;
        Ok(columns
            .into_iter()
            .find(|c| c.is_autoincrement())
            .map(|c| c.name))
    }

    /// Insert one row and return its generated identifier.
    ///
    /// The field map is checked against the table's columns first; unknown
    /// tables and columns are validation failures.
    pub async fn insert(&self, table: Table, fields: &Fields) -> Result<Option<i64>, DalError> {
        let name = self.config.table_name(table);
        let columns = self.storage.table_columns(&name).await?;
        if columns.is_empty() {
            return Err(DalError::Validation(format!("unknown table {}", name)));
        }
        if fields.is_empty() {
            return Err(DalError::Validation(format!("no fields to insert into {}", name)));
        }
        if let Some(unknown) = fields
            .columns()
            .find(|f| !columns.iter().any(|c| c.name == *f))
        {
            return Err(DalError::Validation(format!(
                "unknown column {} in {}",
                unknown, name
            )));
        }

        let returning = columns
            .iter()
            .find(|c| c.is_autoincrement())
            .map(|c| c.name.clone());
        let insert = InsertStatement {
            table: name,
            fields: fields.clone(),
            returning: returning.clone(),
        };
        let sql = compile_insert(&insert);
        let records = self.storage.query(&sql).await?;
        debug!(sql = %sql, "inserted");

        let Some(id_column) = returning else {
            return Ok(None);
        };
        Ok(records
            .first()
            .and_then(|r| r.get(&id_column))
            .and_then(|v| v.as_i64()))
    }
}

fn key_of(record: &Record, primary_key: &str) -> Result<String, DalError> {
    match record.get(primary_key) {
        Some(value) if !value.is_null() => Ok(value.display()),
        _ => Err(DalError::Validation(format!(
            "result row has no value for key column {}",
            primary_key
        ))),
    }
}
