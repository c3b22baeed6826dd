//! Parameterized statement building
//!
//! All query text is assembled here, per dialect. Values are never
//! interpolated into the text; they travel as bound parameters next to
//! `?` placeholders. Identifiers (table and column names) cannot be
//! bound, so they are validated against a strict character set instead.

use crate::traits::Filter;
use polystore_core::{Column, ColumnType, Result, StorageError, Value};

/// Statement text plus the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(text: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }
}

/// Query dialect of a tabular backend.
#[derive(Debug, Clone)]
pub enum Dialect {
    /// CQL: table names are keyspace-qualified and filtered selects
    /// append `ALLOW FILTERING` to tolerate non-indexed predicates.
    Cql { keyspace: String },
    /// Plain SQL, no qualification, no filtering flag.
    Sql,
}

impl Dialect {
    fn backend(&self) -> &'static str {
        match self {
            Dialect::Cql { .. } => "cassandra",
            Dialect::Sql => "mysql",
        }
    }

    fn table_ref(&self, table: &str) -> Result<String> {
        let table = ident(table)?;
        match self {
            Dialect::Cql { keyspace } => Ok(format!("{}.{table}", ident(keyspace)?)),
            Dialect::Sql => Ok(table.to_string()),
        }
    }

    fn type_name(&self, column_type: ColumnType) -> Result<&'static str> {
        match (self, column_type) {
            (Dialect::Cql { .. }, ColumnType::Uuid) => Ok("uuid"),
            (Dialect::Sql, ColumnType::Uuid) => Err(StorageError::UnsupportedColumnType {
                backend: self.backend(),
                column_type,
            }),
            (_, ColumnType::Boolean) => Ok("boolean"),
            (_, ColumnType::Integer) => Ok("int"),
            (_, ColumnType::BigInt) => Ok("bigint"),
            (_, ColumnType::Text) => Ok("text"),
        }
    }

    fn where_clause(&self, filter: &Filter, params: &mut Vec<Value>) -> Result<String> {
        let column = ident(&filter.column)?;
        params.push(filter.value.clone());
        let suffix = match self {
            Dialect::Cql { .. } => " ALLOW FILTERING",
            Dialect::Sql => "",
        };
        Ok(format!(" WHERE {column} = ?{suffix}"))
    }

    /// `SELECT a, b FROM t [WHERE c = ?]`. Empty `keys` selects `*`.
    pub fn select(
        &self,
        table: &str,
        keys: &[String],
        filter: Option<&Filter>,
    ) -> Result<Statement> {
        let columns = if keys.is_empty() {
            "*".to_string()
        } else {
            ident_list(keys)?
        };

        let mut params = Vec::new();
        let mut text = format!("SELECT {columns} FROM {}", self.table_ref(table)?);
        if let Some(filter) = filter {
            text.push_str(&self.where_clause(filter, &mut params)?);
        }

        Ok(Statement::with_params(text, params))
    }

    /// `SELECT * FROM t [WHERE c = ?]`.
    pub fn select_all(&self, table: &str, filter: Option<&Filter>) -> Result<Statement> {
        self.select(table, &[], filter)
    }

    /// `UPDATE t SET a = ?, b = ? WHERE c = ?`.
    pub fn update(
        &self,
        table: &str,
        keys: &[String],
        values: &[Value],
        filter: &Filter,
    ) -> Result<Statement> {
        if keys.len() != values.len() {
            return Err(StorageError::MismatchedKeysValues {
                keys: keys.len(),
                values: values.len(),
            });
        }

        let mut params = Vec::with_capacity(values.len() + 1);
        let mut assignments = Vec::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            assignments.push(format!("{} = ?", ident(key)?));
            params.push(value.clone());
        }

        let mut text = format!(
            "UPDATE {} SET {}",
            self.table_ref(table)?,
            assignments.join(", ")
        );

        let column = ident(&filter.column)?;
        params.push(filter.value.clone());
        text.push_str(&format!(" WHERE {column} = ?"));

        Ok(Statement::with_params(text, params))
    }

    /// `INSERT INTO t (a, b) VALUES (?, ?)`.
    pub fn insert(&self, table: &str, keys: &[String], values: &[Value]) -> Result<Statement> {
        if keys.len() != values.len() {
            return Err(StorageError::MismatchedKeysValues {
                keys: keys.len(),
                values: values.len(),
            });
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        let text = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.table_ref(table)?,
            ident_list(keys)?,
        );

        Ok(Statement::with_params(text, values.to_vec()))
    }

    /// `DELETE FROM t WHERE c = ?`.
    pub fn delete(&self, table: &str, filter: &Filter) -> Result<Statement> {
        let mut params = Vec::with_capacity(1);
        let column = ident(&filter.column)?;
        params.push(filter.value.clone());

        Ok(Statement::with_params(
            format!(
                "DELETE FROM {} WHERE {column} = ?",
                self.table_ref(table)?
            ),
            params,
        ))
    }

    /// `CREATE TABLE IF NOT EXISTS t (a int, b text, PRIMARY KEY (a, b))`.
    ///
    /// The primary-key clause lists every primary-key column in
    /// declaration order. DDL carries no bound values.
    pub fn create_table(&self, table: &str, columns: &[Column]) -> Result<Statement> {
        let mut definitions = Vec::with_capacity(columns.len() + 1);
        for column in columns {
            definitions.push(format!(
                "{} {}",
                ident(&column.name)?,
                self.type_name(column.column_type)?
            ));
        }

        if columns.iter().any(|c| c.primary_key) {
            let pk: Vec<&str> = columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| c.name.as_str())
                .collect();
            definitions.push(format!("PRIMARY KEY ({})", pk.join(", ")));
        }

        Ok(Statement::new(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table_ref(table)?,
            definitions.join(", ")
        )))
    }
}

/// Validate an identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn ident(s: &str) -> Result<&str> {
    let mut chars = s.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(s)
    } else {
        Err(StorageError::InvalidIdentifier(s.to_string()))
    }
}

fn ident_list(keys: &[String]) -> Result<String> {
    let mut parts = Vec::with_capacity(keys.len());
    for key in keys {
        parts.push(ident(key)?);
    }
    Ok(parts.join(", "))
}
