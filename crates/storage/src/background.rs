//! Detached execution
//!
//! Re-dispatches any tabular operation onto the runtime's worker pool.
//! The returned receiver resolves with the complete, already-materialized
//! result; partial results are never delivered. No ordering is guaranteed
//! between concurrently submitted operations. Failures inside a submitted
//! task follow the same log-and-degrade policy as the direct path and
//! never escape the pool.

use crate::statement::Statement;
use crate::traits::{Filter, TableStorage};
use polystore_core::{Rows, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Submit a future to the worker pool, delivering its output through a
/// oneshot channel. The result is dropped when the receiver is gone.
pub fn submit<F, T>(future: F) -> oneshot::Receiver<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = tx.send(future.await);
    });
    rx
}

/// Detached handle over a shared table-storage backend.
#[derive(Debug)]
pub struct Detached<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for Detached<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ?Sized> Detached<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: TableStorage + ?Sized + 'static> Detached<S> {
    pub fn fetch(&self, statement: Statement) -> oneshot::Receiver<Rows> {
        let store = Arc::clone(&self.store);
        submit(async move { store.fetch(statement).await })
    }

    pub fn select(
        &self,
        table: impl Into<String>,
        keys: Vec<String>,
        filter: Option<Filter>,
    ) -> oneshot::Receiver<Rows> {
        let store = Arc::clone(&self.store);
        let table = table.into();
        submit(async move { store.select(&table, &keys, filter.as_ref()).await })
    }

    pub fn select_all(
        &self,
        table: impl Into<String>,
        filter: Option<Filter>,
    ) -> oneshot::Receiver<Rows> {
        let store = Arc::clone(&self.store);
        let table = table.into();
        submit(async move { store.select_all(&table, filter.as_ref()).await })
    }

    pub fn update(
        &self,
        table: impl Into<String>,
        keys: Vec<String>,
        values: Vec<Value>,
        filter: Filter,
    ) -> oneshot::Receiver<()> {
        let store = Arc::clone(&self.store);
        let table = table.into();
        submit(async move { store.update(&table, &keys, &values, &filter).await })
    }

    pub fn insert_into(
        &self,
        table: impl Into<String>,
        keys: Vec<String>,
        values: Vec<Value>,
    ) -> oneshot::Receiver<()> {
        let store = Arc::clone(&self.store);
        let table = table.into();
        submit(async move { store.insert_into(&table, &keys, &values).await })
    }

    pub fn delete_from(&self, table: impl Into<String>, filter: Filter) -> oneshot::Receiver<()> {
        let store = Arc::clone(&self.store);
        let table = table.into();
        submit(async move { store.delete_from(&table, &filter).await })
    }
}
