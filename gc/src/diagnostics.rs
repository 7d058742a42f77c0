//! Data-quality diagnostics
//!
//! Every record the pipeline drops produces exactly one [`Diagnostic`]. They
//! are meant for an operator reading stderr, one line each.

use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Why a record was dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A required foreign key column is absent
    MissingReference { column: String, record: String },

    /// A foreign key value matches no `ID` in the referenced table
    InvalidReference {
        column: String,
        record: String,
        value: String,
    },

    /// A required display field is absent
    MissingField { column: String, record: String },

    /// A value does not parse as the column's declared datatype
    InvalidValue {
        column: String,
        record: String,
        value: String,
        datatype: String,
    },

    /// A later record repeats an earlier record's `ID`
    DuplicateId { id: String },

    /// A hierarchy edge whose child is not a known concept
    UnknownChild { child: String, parent: String },

    /// A hierarchy edge whose parent is not a known concept
    UnknownParent { child: String, parent: String },
}

/// One dropped record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Curated table the record belonged to
    pub table: String,

    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(table: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            table: table.into(),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.table)?;
        match &self.kind {
            DiagnosticKind::MissingReference { column, record } => {
                write!(f, "missing {} for {}", column, record)
            }
            DiagnosticKind::InvalidReference { column, record, value } => {
                write!(f, "invalid {} for {}: {}", column, record, value)
            }
            DiagnosticKind::MissingField { column, record } => {
                write!(f, "missing required field {} for {}", column, record)
            }
            DiagnosticKind::InvalidValue {
                column,
                record,
                value,
                datatype,
            } => {
                write!(f, "{} for {} is not a valid {}: {}", column, record, datatype, value)
            }
            DiagnosticKind::DuplicateId { id } => write!(f, "duplicate ID '{}', keeping first occurrence", id),
            DiagnosticKind::UnknownChild { child, parent } => {
                write!(f, "unknown child id '{}' for parent {}", child, parent)
            }
            DiagnosticKind::UnknownParent { child, parent } => {
                write!(f, "unknown parent id '{}' for child {}", parent, child)
            }
        }
    }
}

/// Ordered sink of diagnostics for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it
    pub fn push(&mut self, diagnostic: Diagnostic) {
        debug!(table = %diagnostic.table, "{}", diagnostic);
        self.0.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Number of diagnostics raised against one table
    pub fn count_for(&self, table: &str) -> usize {
        self.0.iter().filter(|d| d.table == table).count()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
