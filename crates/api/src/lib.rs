// Polystore
//
// Unified data-access layer over a wide-column store, a relational store
// and a key-value / pub-sub store, behind shared capability contracts.
//
// Typical use:
//
// ```no_run
// use polystore::DatabaseContext;
//
// # async fn run() -> polystore::Result<()> {
// let context = DatabaseContext::from_config_dir("config").await?;
// context.connect_all().await;
//
// if let Some(redis) = context.redis() {
//     use polystore::KeyValueStorage;
//     redis.set("player.status", "online").await;
// }
//
// context.disconnect_all().await;
// # Ok(())
// # }
// ```

pub mod context;

pub use context::DatabaseContext;

pub use polystore_core::{
    CassandraConfig, Column, ColumnType, DatabaseConfig, MySqlConfig, RedisConfig, Result, Row,
    Rows, StorageError, Value,
};
pub use polystore_storage::{
    Connection, Detached, Dialect, Filter, KeyValueStorage, MemoryStore, Message, PubSub,
    SharedKeyValueStorage, SharedPubSub, SharedTableStorage, Statement, TableStorage,
    DEFAULT_TTL_SECS, KEY_DELIMITER,
};

pub use polystore_cassandra::CassandraStore;
pub use polystore_mysql::MySqlStore;
pub use polystore_redis::RedisStore;
