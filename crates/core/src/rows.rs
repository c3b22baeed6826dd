//! Uniform row result returned by all read operations
//!
//! Rows keep insertion order and are indexed densely from 0. A `Rows` is
//! rebuilt fresh for every query and never mutated afterwards.

use crate::value::Value;
use std::collections::HashMap;

/// One materialized row: column name to cell value.
pub type Row = HashMap<String, Value>;

/// Ordered collection of materialized rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    rows: Vec<Row>,
}

impl Rows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Row at the given 0-based index, if present.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Cell at `(index, column)`, if present.
    pub fn cell(&self, index: usize, column: &str) -> Option<&Value> {
        self.rows.get(index).and_then(|r| r.get(column))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl FromIterator<Row> for Rows {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn indices_are_dense_and_ordered() {
        let mut rows = Rows::new();
        rows.push(row(&[("id", Value::Int(1))]));
        rows.push(row(&[("id", Value::Int(2))]));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows.cell(0, "id"), Some(&Value::Int(1)));
        assert_eq!(rows.cell(1, "id"), Some(&Value::Int(2)));
        assert_eq!(rows.get(2), None);
    }

    #[test]
    fn empty_result_is_empty() {
        let rows = Rows::new();
        assert!(rows.is_empty());
        assert_eq!(rows.cell(0, "id"), None);
    }
}
