//! Wide-column backend connection
//!
//! One cluster session bound to a keyspace. `connect` creates the
//! keyspace when it is missing (SimpleStrategy, replication factor 3)
//! and selects it as current. Statements are prepared so parameters are
//! bound against the driver's column metadata, never interpolated.

use crate::value::{from_cql, to_cql};
use async_trait::async_trait;
use polystore_core::{CassandraConfig, Column, Result, Row, Rows, StorageError, Value};
use polystore_storage::statement::ident;
use polystore_storage::{Connection, Dialect, Filter, Statement, TableStorage};
use scylla::frame::response::result::{CqlValue, Row as CqlRow};
use scylla::{QueryResult, Session, SessionBuilder};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

const BACKEND: &str = "cassandra";

fn driver(e: impl std::fmt::Display) -> StorageError {
    StorageError::Driver {
        backend: BACKEND,
        message: e.to_string(),
    }
}

/// Table storage over a Cassandra/Scylla cluster.
pub struct CassandraStore {
    config: CassandraConfig,
    dialect: Dialect,
    session: RwLock<Option<Arc<Session>>>,
}

impl CassandraStore {
    pub fn new(config: CassandraConfig) -> Self {
        let dialect = Dialect::Cql {
            keyspace: config.keyspace.clone(),
        };
        Self {
            config,
            dialect,
            session: RwLock::new(None),
        }
    }

    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }

    async fn session(&self) -> Result<Arc<Session>> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(StorageError::NotConnected { backend: BACKEND })
    }

    /// Execute a statement, preparing it when parameters are bound.
    async fn run(&self, statement: &Statement) -> Result<QueryResult> {
        let session = self.session().await?;

        if statement.params.is_empty() {
            return session
                .query_unpaged(statement.text.clone(), ())
                .await
                .map_err(driver);
        }

        let prepared = session
            .prepare(statement.text.clone())
            .await
            .map_err(driver)?;

        let specs = prepared.get_variable_col_specs();
        if specs.len() != statement.params.len() {
            return Err(driver(format!(
                "statement expects {} parameters, {} bound",
                specs.len(),
                statement.params.len()
            )));
        }

        let params: Vec<Option<CqlValue>> = statement
            .params
            .iter()
            .zip(specs.iter())
            .map(|(value, spec)| to_cql(value, spec.typ()))
            .collect();

        session
            .execute_unpaged(&prepared, params)
            .await
            .map_err(driver)
    }

    /// Copy every column name/value pair of every returned row into the
    /// uniform row representation. Statements without a row set (writes,
    /// DDL) materialize as an empty result.
    fn materialize(result: QueryResult) -> Result<Rows> {
        let Ok(rows_result) = result.into_rows_result() else {
            return Ok(Rows::new());
        };

        let names: Vec<String> = rows_result
            .column_specs()
            .iter()
            .map(|spec| spec.name().to_string())
            .collect();

        let mut rows = Rows::new();
        for row in rows_result.rows::<CqlRow>().map_err(driver)? {
            let row = row.map_err(driver)?;
            let mut out = Row::new();
            for (name, cell) in names.iter().zip(row.columns) {
                out.insert(name.clone(), from_cql(cell));
            }
            rows.push(out);
        }

        Ok(rows)
    }

    async fn read(&self, statement: Statement) -> Rows {
        match self.run(&statement).await.and_then(Self::materialize) {
            Ok(rows) => rows,
            Err(e) => {
                error!("CQL read failed ({e}): {}", statement.text);
                Rows::new()
            }
        }
    }

    async fn write(&self, statement: Statement) {
        if let Err(e) = self.run(&statement).await {
            error!("CQL write failed ({e}): {}", statement.text);
        }
    }
}

#[async_trait]
impl Connection for CassandraStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn connect(&self) -> Result<()> {
        let session = SessionBuilder::new()
            .known_nodes(&self.config.hosts)
            .user(&self.config.username, &self.config.password)
            .build()
            .await
            .map_err(driver)?;

        // Replication settings only apply when the keyspace is created
        // here; an existing keyspace keeps its own.
        let ddl = format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
             {{'class': 'SimpleStrategy', 'replication_factor': 3}}",
            ident(&self.config.keyspace)?
        );
        session.query_unpaged(ddl, ()).await.map_err(driver)?;
        session
            .use_keyspace(self.config.keyspace.clone(), false)
            .await
            .map_err(driver)?;

        *self.session.write().await = Some(Arc::new(session));
        info!("Connected to cassandra keyspace {}", self.config.keyspace);
        Ok(())
    }

    async fn disconnect(&self) {
        if self.session.write().await.take().is_some() {
            info!("Disconnected from cassandra");
        }
    }

    async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }
}

#[async_trait]
impl TableStorage for CassandraStore {
    async fn fetch(&self, statement: Statement) -> Rows {
        self.read(statement).await
    }

    async fn select(&self, table: &str, keys: &[String], filter: Option<&Filter>) -> Rows {
        match self.dialect.select(table, keys, filter) {
            Ok(statement) => self.read(statement).await,
            Err(e) => {
                warn!("select on {table} skipped: {e}");
                Rows::new()
            }
        }
    }

    async fn select_all(&self, table: &str, filter: Option<&Filter>) -> Rows {
        self.select(table, &[], filter).await
    }

    async fn update(&self, table: &str, keys: &[String], values: &[Value], filter: &Filter) {
        match self.dialect.update(table, keys, values, filter) {
            Ok(statement) => self.write(statement).await,
            Err(e) => warn!("update on {table} skipped: {e}"),
        }
    }

    async fn insert_into(&self, table: &str, keys: &[String], values: &[Value]) {
        match self.dialect.insert(table, keys, values) {
            Ok(statement) => self.write(statement).await,
            Err(e) => warn!("insert into {table} skipped: {e}"),
        }
    }

    async fn delete_from(&self, table: &str, filter: &Filter) {
        match self.dialect.delete(table, filter) {
            Ok(statement) => self.write(statement).await,
            Err(e) => warn!("delete from {table} skipped: {e}"),
        }
    }

    async fn create_table_if_not_exists(&self, table: &str, columns: &[Column]) -> Result<()> {
        let statement = self.dialect.create_table(table, columns)?;
        self.run(&statement).await?;
        Ok(())
    }
}
