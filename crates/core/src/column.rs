//! Table column description used by table creation

use serde::{Deserialize, Serialize};

/// Column data types supported across backends.
///
/// Not every backend can represent every type; the relational backend
/// rejects `Uuid` at table-creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Uuid,
    Boolean,
    Integer,
    BigInt,
    Text,
}

/// Immutable description of one table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub column_type: ColumnType,
    pub name: String,
    pub primary_key: bool,
}

impl Column {
    pub fn new(column_type: ColumnType, name: impl Into<String>) -> Self {
        Self {
            column_type,
            name: name.into(),
            primary_key: false,
        }
    }

    /// A column that takes part in the primary key.
    pub fn primary(column_type: ColumnType, name: impl Into<String>) -> Self {
        Self {
            column_type,
            name: name.into(),
            primary_key: true,
        }
    }
}
