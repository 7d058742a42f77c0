//! Sparse records and curated tables

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::schema::ID_COLUMN;

/// One row keyed by curated column name
///
/// Empty cells are never stored: a blank source value and a missing column
/// are both represented by the key being absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, ignoring empty values
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(column.into(), value);
        }
    }

    /// Builder-style [`Record::insert`]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Primary key value, if the record has one
    pub fn id(&self) -> Option<&str> {
        self.get(ID_COLUMN)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

/// Ordered records sharing one schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Curated table name
    pub name: String,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Set of primary key values present in the table
    pub fn ids(&self) -> HashSet<String> {
        self.records.iter().filter_map(|r| r.id()).map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
