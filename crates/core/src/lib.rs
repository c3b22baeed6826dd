// Polystore Core
//
// Shared data model for the unified data-access layer:
// values, columns, row results, errors and backend configuration.

pub mod column;
pub mod config;
pub mod error;
pub mod rows;
pub mod value;

pub use column::{Column, ColumnType};
pub use config::{CassandraConfig, DatabaseConfig, MySqlConfig, RedisConfig};
pub use error::{Result, StorageError};
pub use rows::{Row, Rows};
pub use value::Value;
