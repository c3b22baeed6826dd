//! Backend configuration
//!
//! One JSON file per backend (`cassandra.json`, `mysql.json`,
//! `redis.json`) inside a config directory. Missing files are written back
//! with defaults so a fresh deployment gets editable templates. Every
//! backend carries an `enabled` flag; disabled backends are never
//! constructed.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Wide-column store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CassandraConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_cassandra_hosts")]
    pub hosts: Vec<String>,

    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_cassandra_user")]
    pub username: String,

    #[serde(default = "default_cassandra_user")]
    pub password: String,
}

fn default_cassandra_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

fn default_keyspace() -> String {
    "network".to_string()
}

fn default_cassandra_user() -> String {
    "cassandra".to_string()
}

impl Default for CassandraConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hosts: default_cassandra_hosts(),
            keyspace: default_keyspace(),
            username: default_cassandra_user(),
            password: default_cassandra_user(),
        }
    }
}

/// Relational store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MySqlConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_mysql_port")]
    pub port: u16,

    #[serde(default = "default_mysql_user")]
    pub username: String,

    #[serde(default = "default_mysql_password")]
    pub password: String,

    #[serde(default = "default_keyspace")]
    pub database: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_mysql_user() -> String {
    "root".to_string()
}

fn default_mysql_password() -> String {
    "123456".to_string()
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_mysql_port(),
            username: default_mysql_user(),
            password: default_mysql_password(),
            database: default_keyspace(),
        }
    }
}

/// Key-value / pub-sub store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_redis_port")]
    pub port: u16,

    #[serde(default)]
    pub password: String,
}

fn default_redis_port() -> u16 {
    6379
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_redis_port(),
            password: String::new(),
        }
    }
}

/// All backend settings together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub cassandra: CassandraConfig,

    #[serde(default)]
    pub mysql: MySqlConfig,

    #[serde(default)]
    pub redis: RedisConfig,
}

impl DatabaseConfig {
    /// Load per-backend JSON files from `dir`, creating the directory and
    /// writing default files for any that are missing.
    pub async fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        Ok(Self {
            cassandra: load_or_init(&dir.join("cassandra.json")).await?,
            mysql: load_or_init(&dir.join("mysql.json")).await?,
            redis: load_or_init(&dir.join("redis.json")).await?,
        })
    }
}

async fn load_or_init<T>(path: &Path) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Default,
{
    if path.exists() {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    } else {
        let config = T::default();
        let content = serde_json::to_string_pretty(&config)?;
        tokio::fs::write(path, content).await?;
        info!("Wrote default config to {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn load_dir_writes_defaults_for_missing_files() {
        let dir = tempdir().unwrap();

        let config = DatabaseConfig::load_dir(dir.path()).await.unwrap();
        assert!(!config.cassandra.enabled);
        assert_eq!(config.mysql.port, 3306);
        assert_eq!(config.redis.port, 6379);

        assert!(dir.path().join("cassandra.json").exists());
        assert!(dir.path().join("mysql.json").exists());
        assert!(dir.path().join("redis.json").exists());
    }

    #[tokio::test]
    async fn load_dir_reads_existing_files() {
        let dir = tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("redis.json"),
            r#"{"enabled": true, "host": "10.0.0.1"}"#,
        )
        .await
        .unwrap();

        let config = DatabaseConfig::load_dir(dir.path()).await.unwrap();
        assert!(config.redis.enabled);
        assert_eq!(config.redis.host, "10.0.0.1");
        // Unspecified fields fall back to defaults
        assert_eq!(config.redis.port, 6379);
    }

    #[test]
    fn defaults_match_template() {
        let c = CassandraConfig::default();
        assert_eq!(c.hosts, vec!["localhost", "127.0.0.1"]);
        assert_eq!(c.keyspace, "network");
        assert_eq!(c.username, "cassandra");

        let m = MySqlConfig::default();
        assert_eq!(m.database, "network");
        assert_eq!(m.username, "root");
    }
}
