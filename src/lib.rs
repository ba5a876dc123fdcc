pub mod composer;
pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod sql;

pub use composer::{compose_select, EntityQuery};
pub use config::BuilderConfig;
pub use error::{ComposeError, DalError};
