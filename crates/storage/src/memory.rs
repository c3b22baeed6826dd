//! In-memory backend implementing every capability contract
//!
//! Useful for tests and for embedding without a server. Tables are
//! ordered row vectors, key-value entries expire against a monotonic
//! clock, and pub/sub fans out through unbounded channels. Raw statement
//! execution is not supported; there is no query language to run it
//! against.

use crate::statement::Statement;
use crate::traits::{
    Connection, Filter, KeyValueStorage, Message, PubSub, TableStorage, DEFAULT_TTL_SECS,
    KEY_DELIMITER,
};
use async_trait::async_trait;
use polystore_core::{Column, Result, Row, Rows, StorageError, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
}

#[derive(Debug, Clone)]
struct KvEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl KvEntry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Debug)]
struct Subscriber {
    channels: HashSet<String>,
    tx: mpsc::UnboundedSender<Message>,
}

/// Process-local backend holding tables, keys and channels in maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    connected: AtomicBool,
    tables: Mutex<HashMap<String, Table>>,
    entries: Mutex<HashMap<String, KvEntry>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that is already connected.
    pub fn connected() -> Self {
        let store = Self::new();
        store.connected.store(true, Ordering::SeqCst);
        store
    }

    fn check_connected(&self, operation: &str) -> bool {
        let connected = self.connected.load(Ordering::SeqCst);
        if !connected {
            warn!("memory store is not connected, skipping {operation}");
        }
        connected
    }

    fn matches(row: &Row, filter: &Filter) -> bool {
        row.get(&filter.column) == Some(&filter.value)
    }

    fn project(row: &Row, keys: &[String]) -> Row {
        if keys.is_empty() {
            return row.clone();
        }
        keys.iter()
            .filter_map(|k| row.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }
}

#[async_trait]
impl Connection for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableStorage for MemoryStore {
    async fn fetch(&self, statement: Statement) -> Rows {
        let err = StorageError::Unsupported {
            backend: "memory",
            operation: "raw statement execution",
        };
        warn!("{err}, returning empty result for {:?}", statement.text);
        Rows::new()
    }

    async fn select(&self, table: &str, keys: &[String], filter: Option<&Filter>) -> Rows {
        if !self.check_connected("select") {
            return Rows::new();
        }

        let tables = self.tables.lock().expect("tables lock");
        let Some(table) = tables.get(table) else {
            return Rows::new();
        };

        table
            .rows
            .iter()
            .filter(|row| filter.is_none_or(|f| Self::matches(row, f)))
            .map(|row| Self::project(row, keys))
            .collect()
    }

    async fn select_all(&self, table: &str, filter: Option<&Filter>) -> Rows {
        self.select(table, &[], filter).await
    }

    async fn update(&self, table: &str, keys: &[String], values: &[Value], filter: &Filter) {
        if keys.len() != values.len() {
            warn!(
                "update on {table} skipped: {} keys but {} values",
                keys.len(),
                values.len()
            );
            return;
        }
        if !self.check_connected("update") {
            return;
        }

        let mut tables = self.tables.lock().expect("tables lock");
        let Some(table) = tables.get_mut(table) else {
            return;
        };

        for row in table.rows.iter_mut().filter(|r| Self::matches(r, filter)) {
            for (key, value) in keys.iter().zip(values) {
                row.insert(key.clone(), value.clone());
            }
        }
    }

    async fn insert_into(&self, table: &str, keys: &[String], values: &[Value]) {
        if keys.len() != values.len() {
            warn!(
                "insert into {table} skipped: {} keys but {} values",
                keys.len(),
                values.len()
            );
            return;
        }
        if !self.check_connected("insert") {
            return;
        }

        let row: Row = keys
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect();

        let mut tables = self.tables.lock().expect("tables lock");
        match tables.get_mut(table) {
            Some(table) => table.rows.push(row),
            None => warn!("insert into unknown table {table} skipped"),
        }
    }

    async fn delete_from(&self, table: &str, filter: &Filter) {
        if !self.check_connected("delete") {
            return;
        }

        let mut tables = self.tables.lock().expect("tables lock");
        if let Some(table) = tables.get_mut(table) {
            table.rows.retain(|row| !Self::matches(row, filter));
        }
    }

    async fn create_table_if_not_exists(&self, table: &str, _columns: &[Column]) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(StorageError::NotConnected { backend: "memory" });
        }

        let mut tables = self.tables.lock().expect("tables lock");
        tables.entry(table.to_string()).or_default();
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStore {
    async fn set(&self, key: &str, value: &str) {
        self.set_with_ttl(key, value, DEFAULT_TTL_SECS).await;
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: i64) {
        if !self.check_connected("set") {
            return;
        }

        let expires_at = u64::try_from(ttl_seconds)
            .ok()
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        let mut entries = self.entries.lock().expect("entries lock");
        entries.insert(
            key.to_string(),
            KvEntry {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<String> {
        if !self.check_connected("get") {
            return None;
        }

        let mut entries = self.entries.lock().expect("entries lock");
        match entries.get(key) {
            Some(entry) if entry.expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    async fn remove(&self, key: &str) {
        if !self.check_connected("remove") {
            return;
        }
        self.entries.lock().expect("entries lock").remove(key);
    }

    async fn keys(&self, prefix: &str, recursive: bool) -> HashSet<String> {
        if !self.check_connected("keys") {
            return HashSet::new();
        }

        let entries = self.entries.lock().expect("entries lock");
        let full_prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}{KEY_DELIMITER}")
        };

        entries
            .iter()
            .filter(|(key, entry)| !entry.expired() && key.starts_with(&full_prefix))
            .map(|(key, _)| {
                if recursive {
                    key.clone()
                } else {
                    let child = &key[full_prefix.len()..];
                    child
                        .split(KEY_DELIMITER)
                        .next()
                        .unwrap_or(child)
                        .to_string()
                }
            })
            .collect()
    }

    async fn get_all(&self) -> HashMap<String, String> {
        if !self.check_connected("get_all") {
            return HashMap::new();
        }

        let entries = self.entries.lock().expect("entries lock");
        entries
            .iter()
            .filter(|(_, entry)| !entry.expired())
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    async fn contains(&self, key: &str) -> bool {
        if !self.check_connected("contains") {
            return false;
        }

        let entries = self.entries.lock().expect("entries lock");
        entries
            .iter()
            .any(|(k, entry)| !entry.expired() && k.starts_with(key))
    }

    async fn remaining_ttl(&self, key: &str) -> i64 {
        if !self.check_connected("remaining_ttl") {
            return -1;
        }

        let entries = self.entries.lock().expect("entries lock");
        match entries.get(key) {
            Some(entry) if !entry.expired() => match entry.expires_at {
                Some(at) => at
                    .saturating_duration_since(Instant::now())
                    .as_secs_f64()
                    .ceil() as i64,
                None => -1,
            },
            _ => -1,
        }
    }
}

#[async_trait]
impl PubSub for MemoryStore {
    async fn subscribe(&self, channels: &[String]) -> Result<mpsc::UnboundedReceiver<Message>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock().expect("subscribers lock");
        subscribers.push(Subscriber {
            channels: channels.iter().cloned().collect(),
            tx,
        });
        Ok(rx)
    }

    async fn publish(&self, channel: &str, message: &str) {
        if !self.check_connected("publish") {
            return;
        }

        let mut subscribers = self.subscribers.lock().expect("subscribers lock");
        subscribers.retain(|s| !s.tx.is_closed());
        for subscriber in subscribers.iter() {
            if subscriber.channels.contains(channel) {
                let _ = subscriber.tx.send(Message {
                    channel: channel.to_string(),
                    payload: message.to_string(),
                });
            }
        }
    }

    async fn channel_exists(&self, channel: &str) -> bool {
        let subscribers = self.subscribers.lock().expect("subscribers lock");
        subscribers
            .iter()
            .any(|s| !s.tx.is_closed() && s.channels.contains(channel))
    }
}
