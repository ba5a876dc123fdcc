use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use deadpool_postgres::Pool;
use rust_decimal::Decimal;
use tokio_postgres::types::Type;
use tokio_postgres::Row;

use super::error::StorageError;
use super::row::{CellValue, Record};
use super::storage::{RowStore, Storage, TableColumn};

/// Pooled PostgreSQL backend.
#[derive(Clone)]
pub struct PgStorage {
    pool: Pool,
    schema: String,
}

impl PgStorage {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            schema: String::from("public"),
        }
    }

    /// Schema searched by `table_columns`.
    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }
}

impl Storage for PgStorage {
    async fn query(&self, sql: &str) -> Result<Vec<Record>, StorageError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(sql, &[])
            .await
            .map_err(|e| StorageError::from_pg_error(&e, sql))?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn execute(&self, sql: &str) -> Result<u64, StorageError> {
        let client = self.pool.get().await?;
        client
            .execute(sql, &[])
            .await
            .map_err(|e| StorageError::from_pg_error(&e, sql))
    }
}

const COLUMNS_SQL: &str = r#"
    SELECT
        c.column_name AS name,
        c.data_type,
        c.is_nullable = 'YES' AS is_nullable,
        c.column_default AS default_value,
        c.is_identity = 'YES' AS is_identity
    FROM information_schema.columns c
    WHERE c.table_schema = $1 AND c.table_name = $2
    ORDER BY c.ordinal_position
"#;

impl RowStore for PgStorage {
    async fn table_columns(&self, table: &str) -> Result<Vec<TableColumn>, StorageError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(COLUMNS_SQL, &[&self.schema, &table])
            .await
            .map_err(|e| StorageError::from_pg_error(&e, COLUMNS_SQL))?;

        rows.iter()
            .map(|row| -> Result<TableColumn, StorageError> {
                Ok(TableColumn {
                    name: row.try_get("name")?,
                    data_type: row.try_get("data_type")?,
                    is_nullable: row.try_get("is_nullable")?,
                    default_value: row.try_get("default_value")?,
                    is_identity: row.try_get("is_identity")?,
                })
            })
            .collect()
    }
}

fn record_from_row(row: &Row) -> Record {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| (col.name().to_string(), extract_value(row, i, col.type_())))
        .collect()
}

fn get<'a, T>(row: &'a Row, idx: usize, wrap: fn(T) -> CellValue) -> CellValue
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .ok()
        .flatten()
        .map(wrap)
        .unwrap_or(CellValue::Null)
}

fn extract_value(row: &Row, idx: usize, pg_type: &Type) -> CellValue {
    match *pg_type {
        Type::BOOL => get::<bool>(row, idx, CellValue::Bool),
        Type::INT2 => get::<i16>(row, idx, CellValue::Int16),
        Type::INT4 => get::<i32>(row, idx, CellValue::Int32),
        Type::INT8 => get::<i64>(row, idx, CellValue::Int64),
        Type::FLOAT4 => get::<f32>(row, idx, CellValue::Float32),
        Type::FLOAT8 => get::<f64>(row, idx, CellValue::Float64),
        Type::BYTEA => get::<Vec<u8>>(row, idx, CellValue::Bytes),
        Type::DATE => get::<NaiveDate>(row, idx, CellValue::Date),
        Type::TIME => get::<NaiveTime>(row, idx, CellValue::Time),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx, CellValue::DateTime),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx, CellValue::TimestampTz),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx, CellValue::Json),
        Type::NUMERIC => get::<Decimal>(row, idx, CellValue::Decimal),
        _ => get::<String>(row, idx, CellValue::Text),
    }
}
