//! Key-value / pub-sub backend connection
//!
//! Three independent connections to the same server: one multiplexed
//! connection for key-value traffic, one pub-sub connection whose
//! receiving half is drained by a spawned listener task, and one more
//! multiplexed connection reserved for publishing. The separation keeps
//! the blocking subscribe stream from ever contending with publish or
//! key-value commands.

use async_trait::async_trait;
use futures::StreamExt;
use polystore_core::{RedisConfig, Result, StorageError};
use polystore_storage::{
    Connection, KeyValueStorage, Message, PubSub, DEFAULT_TTL_SECS, KEY_DELIMITER,
};
use redis::aio::{MultiplexedConnection, PubSubSink};
use redis::{AsyncCommands, Client};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Mutex as AsyncMutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const BACKEND: &str = "redis";

fn driver(e: impl std::fmt::Display) -> StorageError {
    StorageError::Driver {
        backend: BACKEND,
        message: e.to_string(),
    }
}

#[derive(Debug)]
struct Subscriber {
    channels: HashSet<String>,
    tx: mpsc::UnboundedSender<Message>,
}

/// Key-value and pub/sub storage over a Redis server.
pub struct RedisStore {
    config: RedisConfig,
    kv: RwLock<Option<MultiplexedConnection>>,
    publisher: RwLock<Option<MultiplexedConnection>>,
    sink: AsyncMutex<Option<PubSubSink>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl RedisStore {
    pub fn new(config: RedisConfig) -> Self {
        Self {
            config,
            kv: RwLock::new(None),
            publisher: RwLock::new(None),
            sink: AsyncMutex::new(None),
            listener: Mutex::new(None),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn connection_info(&self) -> redis::ConnectionInfo {
        redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(self.config.host.clone(), self.config.port),
            redis: redis::RedisConnectionInfo {
                password: (!self.config.password.is_empty())
                    .then(|| self.config.password.clone()),
                ..Default::default()
            },
        }
    }

    async fn kv(&self) -> Result<MultiplexedConnection> {
        self.kv
            .read()
            .await
            .clone()
            .ok_or(StorageError::NotConnected { backend: BACKEND })
    }

    async fn publisher(&self) -> Result<MultiplexedConnection> {
        self.publisher
            .read()
            .await
            .clone()
            .ok_or(StorageError::NotConnected { backend: BACKEND })
    }

    async fn scan(&self, pattern: String) -> Result<Vec<String>> {
        let mut conn = self.kv().await?;
        conn.keys(pattern).await.map_err(driver)
    }

    /// Dispatch every inbound message to each registered subscriber whose
    /// channel set contains it, in transport order.
    fn spawn_listener(
        subscribers: Arc<Mutex<Vec<Subscriber>>>,
        mut stream: redis::aio::PubSubStream,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                let channel = msg.get_channel_name().to_string();
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("Dropping non-text message on {channel}: {e}");
                        continue;
                    }
                };

                let mut subscribers = subscribers.lock().expect("subscribers lock");
                subscribers.retain(|s| !s.tx.is_closed());
                for subscriber in subscribers.iter() {
                    if subscriber.channels.contains(&channel) {
                        let _ = subscriber.tx.send(Message {
                            channel: channel.clone(),
                            payload: payload.clone(),
                        });
                    }
                }
            }
        })
    }
}

#[async_trait]
impl Connection for RedisStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn connect(&self) -> Result<()> {
        let client = Client::open(self.connection_info()).map_err(driver)?;

        let kv = client
            .get_multiplexed_async_connection()
            .await
            .map_err(driver)?;
        let publisher = client
            .get_multiplexed_async_connection()
            .await
            .map_err(driver)?;
        let pubsub = client.get_async_pubsub().await.map_err(driver)?;
        let (sink, stream) = pubsub.split();

        *self.kv.write().await = Some(kv);
        *self.publisher.write().await = Some(publisher);
        *self.sink.lock().await = Some(sink);

        let handle = Self::spawn_listener(Arc::clone(&self.subscribers), stream);
        if let Some(old) = self.listener.lock().expect("listener lock").replace(handle) {
            old.abort();
        }

        info!(
            "Connected to redis at {}:{}",
            self.config.host, self.config.port
        );
        Ok(())
    }

    async fn disconnect(&self) {
        let had_connection = self.kv.write().await.take().is_some();
        *self.publisher.write().await = None;
        *self.sink.lock().await = None;
        if let Some(handle) = self.listener.lock().expect("listener lock").take() {
            handle.abort();
        }

        if had_connection {
            info!("Disconnected from redis");
        }
    }

    async fn is_connected(&self) -> bool {
        self.kv.read().await.is_some()
    }
}

#[async_trait]
impl KeyValueStorage for RedisStore {
    async fn set(&self, key: &str, value: &str) {
        self.set_with_ttl(key, value, DEFAULT_TTL_SECS).await;
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: i64) {
        let mut conn = match self.kv().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("redis set skipped: {e}");
                return;
            }
        };

        // Value write and expiry are two separate commands, not atomic
        if let Err(e) = conn.set::<_, _, ()>(key, value).await {
            error!("redis SET {key} failed: {e}");
            return;
        }
        if let Err(e) = conn.expire::<_, ()>(key, ttl_seconds).await {
            error!("redis EXPIRE {key} failed: {e}");
        }
    }

    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = match self.kv().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("redis get skipped: {e}");
                return None;
            }
        };

        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(e) => {
                error!("redis GET {key} failed: {e}");
                None
            }
        }
    }

    async fn remove(&self, key: &str) {
        let mut conn = match self.kv().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("redis remove skipped: {e}");
                return;
            }
        };

        if let Err(e) = conn.del::<_, ()>(key).await {
            error!("redis DEL {key} failed: {e}");
        }
    }

    async fn keys(&self, prefix: &str, recursive: bool) -> HashSet<String> {
        let pattern = if prefix.is_empty() {
            "*".to_string()
        } else {
            format!("{prefix}{KEY_DELIMITER}*")
        };

        let matched = match self.scan(pattern).await {
            Ok(matched) => matched,
            Err(e) => {
                warn!("redis keys scan skipped: {e}");
                return HashSet::new();
            }
        };

        let skip = if prefix.is_empty() {
            0
        } else {
            prefix.len() + 1
        };

        matched
            .into_iter()
            .map(|key| {
                if recursive {
                    key
                } else {
                    let child = &key[skip..];
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
        let matched = match self.scan("*".to_string()).await {
            Ok(matched) => matched,
            Err(e) => {
                warn!("redis get_all skipped: {e}");
                return HashMap::new();
            }
        };

        let mut data = HashMap::with_capacity(matched.len());
        for key in matched {
            if let Some(value) = self.get(&key).await {
                data.insert(key, value);
            }
        }
        data
    }

    async fn contains(&self, key: &str) -> bool {
        match self.scan(format!("{key}*")).await {
            Ok(matched) => !matched.is_empty(),
            Err(e) => {
                warn!("redis contains skipped: {e}");
                false
            }
        }
    }

    async fn remaining_ttl(&self, key: &str) -> i64 {
        if !self.contains(key).await {
            return -1;
        }

        let mut conn = match self.kv().await {
            Ok(conn) => conn,
            Err(_) => return -1,
        };

        match conn.ttl::<_, i64>(key).await {
            Ok(ttl) => ttl,
            Err(e) => {
                error!("redis TTL {key} failed: {e}");
                -1
            }
        }
    }
}

#[async_trait]
impl PubSub for RedisStore {
    async fn subscribe(&self, channels: &[String]) -> Result<mpsc::UnboundedReceiver<Message>> {
        let mut sink_guard = self.sink.lock().await;
        let sink = sink_guard
            .as_mut()
            .ok_or(StorageError::NotConnected { backend: BACKEND })?;

        for channel in channels {
            sink.subscribe(channel).await.map_err(driver)?;
        }
        drop(sink_guard);

        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("subscribers lock")
            .push(Subscriber {
                channels: channels.iter().cloned().collect(),
                tx,
            });

        Ok(rx)
    }

    async fn publish(&self, channel: &str, message: &str) {
        if !self.channel_exists(channel).await {
            // Nobody is listening; not an error
            return;
        }

        let mut conn = match self.publisher().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("redis publish skipped: {e}");
                return;
            }
        };

        if let Err(e) = conn.publish::<_, _, ()>(channel, message).await {
            error!("redis PUBLISH on {channel} failed: {e}");
        }
    }

    async fn channel_exists(&self, channel: &str) -> bool {
        let mut conn = match self.publisher().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("redis channel check skipped: {e}");
                return false;
            }
        };

        let channels: Vec<String> = match redis::cmd("PUBSUB")
            .arg("CHANNELS")
            .arg(channel)
            .query_async(&mut conn)
            .await
        {
            Ok(channels) => channels,
            Err(e) => {
                error!("redis PUBSUB CHANNELS failed: {e}");
                return false;
            }
        };

        channels.iter().any(|c| c == channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disconnected_operations_degrade_cleanly() {
        let store = RedisStore::new(RedisConfig::default());
        assert!(!store.is_connected().await);

        store.set("k", "v").await;
        assert_eq!(store.get("k").await, None);
        assert_eq!(store.remaining_ttl("k").await, -1);
        assert!(store.keys("", false).await.is_empty());
        assert!(store.get_all().await.is_empty());
        assert!(!store.contains("k").await);
        store.publish("ch", "msg").await;

        let err = store.subscribe(&["ch".to_string()]).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::NotConnected { backend: "redis" }
        ));
    }

    #[test]
    fn password_only_set_when_present() {
        let store = RedisStore::new(RedisConfig::default());
        assert_eq!(store.connection_info().redis.password, None);

        let store = RedisStore::new(RedisConfig {
            password: "secret".to_string(),
            ..RedisConfig::default()
        });
        assert_eq!(
            store.connection_info().redis.password,
            Some("secret".to_string())
        );
    }
}
