//! Connection lifecycle for all configured backends.
//!
//! A `DatabaseContext` is built once from a `DatabaseConfig` and handed
//! around explicitly; there is no process-wide instance. Disabled backends
//! are never constructed, so their accessors return `None` and no driver
//! code for them ever runs.

use polystore_cassandra::CassandraStore;
use polystore_core::DatabaseConfig;
use polystore_mysql::MySqlStore;
use polystore_redis::RedisStore;
use polystore_storage::Connection;
use std::sync::Arc;
use tracing::{info, warn};

/// Handles to every enabled backend.
pub struct DatabaseContext {
    cassandra: Option<Arc<CassandraStore>>,
    mysql: Option<Arc<MySqlStore>>,
    redis: Option<Arc<RedisStore>>,
}

impl DatabaseContext {
    /// Construct stores for each enabled backend. No connections are
    /// opened until [`connect_all`](Self::connect_all).
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            cassandra: config
                .cassandra
                .enabled
                .then(|| Arc::new(CassandraStore::new(config.cassandra.clone()))),
            mysql: config
                .mysql
                .enabled
                .then(|| Arc::new(MySqlStore::new(config.mysql.clone()))),
            redis: config
                .redis
                .enabled
                .then(|| Arc::new(RedisStore::new(config.redis.clone()))),
        }
    }

    /// Load configuration from `dir` and build the context from it.
    pub async fn from_config_dir(dir: impl AsRef<std::path::Path>) -> polystore_core::Result<Self> {
        Ok(Self::new(DatabaseConfig::load_dir(dir).await?))
    }

    /// Connect every enabled backend. A backend that cannot be reached is
    /// logged and left disconnected; the others proceed.
    pub async fn connect_all(&self) {
        for store in self.connections() {
            info!("Connecting to {}...", store.backend_name());
            match store.connect().await {
                Ok(()) => info!("{} is ready", store.backend_name()),
                Err(e) => warn!("Could not connect to {}: {e}", store.backend_name()),
            }
        }
    }

    /// Disconnect every enabled backend.
    pub async fn disconnect_all(&self) {
        for store in self.connections() {
            store.disconnect().await;
        }
    }

    fn connections(&self) -> Vec<Arc<dyn Connection>> {
        let mut stores: Vec<Arc<dyn Connection>> = Vec::new();
        if let Some(store) = &self.cassandra {
            stores.push(Arc::clone(store) as Arc<dyn Connection>);
        }
        if let Some(store) = &self.mysql {
            stores.push(Arc::clone(store) as Arc<dyn Connection>);
        }
        if let Some(store) = &self.redis {
            stores.push(Arc::clone(store) as Arc<dyn Connection>);
        }
        stores
    }

    /// Wide-column table storage, when enabled.
    pub fn cassandra(&self) -> Option<Arc<CassandraStore>> {
        self.cassandra.clone()
    }

    /// Relational table storage, when enabled.
    pub fn mysql(&self) -> Option<Arc<MySqlStore>> {
        self.mysql.clone()
    }

    /// Key-value storage and pub/sub, when enabled.
    pub fn redis(&self) -> Option<Arc<RedisStore>> {
        self.redis.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polystore_core::{CassandraConfig, MySqlConfig, RedisConfig};

    #[test]
    fn disabled_backends_are_not_constructed() {
        let context = DatabaseContext::new(DatabaseConfig::default());
        assert!(context.cassandra().is_none());
        assert!(context.mysql().is_none());
        assert!(context.redis().is_none());
    }

    #[test]
    fn enabled_backends_get_handles() {
        let context = DatabaseContext::new(DatabaseConfig {
            cassandra: CassandraConfig {
                enabled: true,
                ..CassandraConfig::default()
            },
            mysql: MySqlConfig {
                enabled: true,
                ..MySqlConfig::default()
            },
            redis: RedisConfig {
                enabled: true,
                ..RedisConfig::default()
            },
        });
        assert!(context.cassandra().is_some());
        assert!(context.mysql().is_some());
        assert!(context.redis().is_some());
    }

    #[tokio::test]
    async fn from_config_dir_builds_disabled_context_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let context = DatabaseContext::from_config_dir(dir.path()).await.unwrap();
        assert!(context.cassandra().is_none());
        assert!(context.mysql().is_none());
        assert!(context.redis().is_none());

        // connect_all on an all-disabled context is a no-op
        context.connect_all().await;
        context.disconnect_all().await;
    }
}
