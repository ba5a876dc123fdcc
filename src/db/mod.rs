mod connection;
mod dal;
mod error;
mod postgres;
mod row;
mod storage;

pub use connection::{build_pool, ConnectionConfig, SslMode};
pub use dal::Dal;
pub use error::{ErrorCategory, StorageError};
pub use postgres::PgStorage;
pub use row::{CellValue, KeyedRows, Record};
pub use storage::{RowStore, Storage, TableColumn};
