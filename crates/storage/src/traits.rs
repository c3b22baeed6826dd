//! Capability contracts
//!
//! Each backend implements the subset of these traits it can honor: the
//! wide-column and relational backends are `Connection + TableStorage`,
//! the key-value backend is `Connection + KeyValueStorage + PubSub`.
//! The traits are deliberately independent; a connection struct composes
//! them rather than inheriting one from another.
//!
//! Data-path methods never raise on connectivity or driver failure: they
//! log a diagnostic and return an empty result (reads) or do nothing
//! (writes). Callers must treat an empty result as ambiguous between
//! "no data" and "operation failed".

use crate::statement::Statement;
use async_trait::async_trait;
use polystore_core::{Column, Result, Rows, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default key expiry applied when none is given: 7 days.
pub const DEFAULT_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Separator between segments of a hierarchical key.
pub const KEY_DELIMITER: char = '.';

/// Single-column equality predicate for filtered reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// One published message delivered to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub channel: String,
    pub payload: String,
}

/// Connection lifecycle shared by every backend.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Backend name used in logs and errors.
    fn backend_name(&self) -> &'static str;

    /// Establish the session. Safe to call again after `disconnect`.
    async fn connect(&self) -> Result<()>;

    /// Tear the session down. No-op when not connected.
    async fn disconnect(&self);

    /// Whether a live session is currently held. Never fails.
    async fn is_connected(&self) -> bool;
}

/// Tabular (SQL/CQL-like) storage.
#[async_trait]
pub trait TableStorage: Send + Sync {
    /// Execute a raw statement and materialize the result.
    async fn fetch(&self, statement: Statement) -> Rows;

    /// SELECT the given columns, optionally filtered. Empty `keys`
    /// selects every column.
    async fn select(&self, table: &str, keys: &[String], filter: Option<&Filter>) -> Rows;

    /// SELECT * with an optional filter.
    async fn select_all(&self, table: &str, filter: Option<&Filter>) -> Rows;

    /// UPDATE the given columns on rows matching `filter`. Mismatched
    /// `keys`/`values` lengths perform no backend call.
    async fn update(&self, table: &str, keys: &[String], values: &[Value], filter: &Filter);

    /// INSERT one row.
    async fn insert_into(&self, table: &str, keys: &[String], values: &[Value]);

    /// DELETE rows matching `filter`.
    async fn delete_from(&self, table: &str, filter: &Filter);

    /// Create the table when absent. Fails when the backend cannot
    /// represent one of the column types at all.
    async fn create_table_if_not_exists(&self, table: &str, columns: &[Column]) -> Result<()>;
}

/// Key-value storage over hierarchical string keys.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Store `value` under `key` with the default expiry
    /// ([`DEFAULT_TTL_SECS`]).
    async fn set(&self, key: &str, value: &str);

    /// Store `value` under `key`, expiring after `ttl_seconds`.
    ///
    /// The value write and the expiry are two separate commands, not one
    /// atomic operation; a crash in between leaves the value without an
    /// expiry.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: i64);

    /// Value stored under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Option<String>;

    /// Remove `key`. No-op when absent.
    async fn remove(&self, key: &str);

    /// Child keys below `prefix`. An empty prefix matches every key.
    /// Non-recursive calls return only the first segment below the
    /// prefix; recursive calls return full keys.
    async fn keys(&self, prefix: &str, recursive: bool) -> HashSet<String>;

    /// Every live key with its value.
    async fn get_all(&self) -> HashMap<String, String>;

    /// Whether any key starts with `key`. This is a wildcard scan, not an
    /// exact-existence check.
    async fn contains(&self, key: &str) -> bool;

    /// Seconds until `key` expires, or -1 when the key is absent, has no
    /// expiry, or the backend is not connected.
    async fn remaining_ttl(&self, key: &str) -> i64;
}

/// Publish/subscribe over named channels.
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Register a subscriber for the given channels. Every message
    /// published on one of them is delivered once through the returned
    /// receiver, in transport order.
    async fn subscribe(&self, channels: &[String]) -> Result<mpsc::UnboundedReceiver<Message>>;

    /// Publish `message` on `channel`. Publishing to a channel nobody
    /// subscribed is a silent no-op.
    async fn publish(&self, channel: &str, message: &str);

    /// Whether any live subscriber holds `channel` open.
    async fn channel_exists(&self, channel: &str) -> bool;
}

/// Shared handles.
pub type SharedTableStorage = Arc<dyn TableStorage>;
pub type SharedKeyValueStorage = Arc<dyn KeyValueStorage>;
pub type SharedPubSub = Arc<dyn PubSub>;
