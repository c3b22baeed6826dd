//! Relational backend connection
//!
//! One long-lived connection to a MySQL database, transport encryption
//! disabled by configuration default. The pool is capped at a single
//! connection so operations on the direct path stay strictly sequential,
//! matching the one-session model of the other backends; reconnection is
//! the pool's concern. UUID columns are rejected at table-creation time
//! because MySQL has no native UUID column type.

use async_trait::async_trait;
use polystore_core::{Column, MySqlConfig, Result, Row, Rows, StorageError, Value};
use polystore_storage::{Connection, Dialect, Filter, Statement, TableStorage};
use sqlx::mysql::{
    MySql, MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow,
    MySqlSslMode,
};
use sqlx::query::Query;
use sqlx::{Column as _, Row as _, TypeInfo};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

const BACKEND: &str = "mysql";

fn driver(e: impl std::fmt::Display) -> StorageError {
    StorageError::Driver {
        backend: BACKEND,
        message: e.to_string(),
    }
}

/// Table storage over a MySQL server.
pub struct MySqlStore {
    config: MySqlConfig,
    dialect: Dialect,
    pool: RwLock<Option<MySqlPool>>,
}

impl MySqlStore {
    pub fn new(config: MySqlConfig) -> Self {
        Self {
            config,
            dialect: Dialect::Sql,
            pool: RwLock::new(None),
        }
    }

    pub fn database(&self) -> &str {
        &self.config.database
    }

    async fn pool(&self) -> Result<MySqlPool> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or(StorageError::NotConnected { backend: BACKEND })
    }

    fn bind<'q>(
        mut query: Query<'q, MySql, MySqlArguments>,
        params: &[Value],
    ) -> Query<'q, MySql, MySqlArguments> {
        for param in params {
            query = match param {
                Value::Null => query.bind(Option::<String>::None),
                Value::Bool(b) => query.bind(*b),
                Value::Int(i) => query.bind(*i),
                // No native UUID type; transported as text
                Value::Uuid(u) => query.bind(u.to_string()),
                Value::Text(s) => query.bind(s.clone()),
            };
        }
        query
    }

    async fn run_query(&self, statement: &Statement) -> Result<Vec<MySqlRow>> {
        let pool = self.pool().await?;
        Self::bind(sqlx::query(&statement.text), &statement.params)
            .fetch_all(&pool)
            .await
            .map_err(driver)
    }

    async fn run_exec(&self, statement: &Statement) -> Result<()> {
        let pool = self.pool().await?;
        Self::bind(sqlx::query(&statement.text), &statement.params)
            .execute(&pool)
            .await
            .map_err(driver)?;
        Ok(())
    }

    /// Decode one cell by the driver's reported column type.
    fn decode_cell(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        match type_name {
            "BOOLEAN" | "BOOL" => row
                .try_get::<Option<bool>, _>(index)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::Bool),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
                .try_get::<Option<i64>, _>(index)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::Int),
            name if name.contains("TEXT") || name.contains("CHAR") => row
                .try_get::<Option<String>, _>(index)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::Text),
            _ => row
                .try_get::<Option<String>, _>(index)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::Text),
        }
    }

    /// Walk the driver's column metadata and copy every field of every
    /// row into the uniform row representation.
    fn materialize(driver_rows: Vec<MySqlRow>) -> Rows {
        let mut rows = Rows::new();
        for driver_row in driver_rows {
            let mut out = Row::new();
            for (index, column) in driver_row.columns().iter().enumerate() {
                let type_name = column.type_info().name().to_ascii_uppercase();
                out.insert(
                    column.name().to_string(),
                    Self::decode_cell(&driver_row, index, &type_name),
                );
            }
            rows.push(out);
        }
        rows
    }

    async fn read(&self, statement: Statement) -> Rows {
        match self.run_query(&statement).await {
            Ok(driver_rows) => Self::materialize(driver_rows),
            Err(e) => {
                error!("SQL read failed ({e}): {}", statement.text);
                Rows::new()
            }
        }
    }

    async fn write(&self, statement: Statement) {
        if let Err(e) = self.run_exec(&statement).await {
            error!("SQL write failed ({e}): {}", statement.text);
        }
    }
}

#[async_trait]
impl Connection for MySqlStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn connect(&self) -> Result<()> {
        let options = MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.username)
            .password(&self.config.password)
            .database(&self.config.database)
            .ssl_mode(MySqlSslMode::Disabled);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(driver)?;

        *self.pool.write().await = Some(pool);
        info!("Connected to mysql database {}", self.config.database);
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
            info!("Disconnected from mysql");
        }
    }

    async fn is_connected(&self) -> bool {
        match self.pool.read().await.as_ref() {
            Some(pool) => !pool.is_closed(),
            None => false,
        }
    }
}

#[async_trait]
impl TableStorage for MySqlStore {
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
        self.run_exec(&statement).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polystore_core::ColumnType;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn uuid_columns_are_rejected_before_any_backend_call() {
        let store = MySqlStore::new(MySqlConfig::default());
        let err = store
            .create_table_if_not_exists("t", &[Column::primary(ColumnType::Uuid, "id")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::UnsupportedColumnType {
                backend: "mysql",
                column_type: ColumnType::Uuid,
            }
        ));
    }

    #[tokio::test]
    async fn disconnected_reads_degrade_to_empty() {
        let store = MySqlStore::new(MySqlConfig::default());
        assert!(!store.is_connected().await);
        assert!(store.select_all("t", None).await.is_empty());
    }

    #[tokio::test]
    async fn mismatched_update_performs_no_call() {
        let store = MySqlStore::new(MySqlConfig::default());
        // Returns without error even though nothing is connected
        store
            .update(
                "t",
                &keys(&["a", "b"]),
                &[Value::Int(1)],
                &Filter::new("id", 5),
            )
            .await;
    }
}
