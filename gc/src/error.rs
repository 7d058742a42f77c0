//! Structural errors that abort a curation run

use thiserror::Error;

/// Result alias for curation operations
pub type Result<T> = std::result::Result<T, CurationError>;

/// Fatal errors: the raw export broke a structural contract and needs an operator.
///
/// Data-quality problems are not errors; they become [`crate::Diagnostic`]s.
#[derive(Debug, Error)]
pub enum CurationError {
    #[error("{table}: header does not match schema (missing: [{}], unexpected: [{}])", .missing.join(", "), .extra.join(", "))]
    HeaderMismatch {
        table: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("{table}: row {row} has {found} cells, header has {expected}")]
    RaggedRow {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{table}: row {row} must have exactly one of child or parent id")]
    HierarchyShape { table: String, row: usize },

    #[error(
        "{table}: child and parent links are not reflexive ({} child links without parent link, {} parent links without child link; e.g. {})",
        .child_only.len(),
        .parent_only.len(),
        sample_pairs(.child_only, .parent_only)
    )]
    NotReflexive {
        table: String,
        child_only: Vec<(String, String)>,
        parent_only: Vec<(String, String)>,
    },

    #[error("{table}: duplicate ID '{id}'")]
    DuplicateId { table: String, id: String },

    #[error("Raw table not found: {0}")]
    MissingTable(String),

    #[error("Invalid schema for {table}: {reason}")]
    InvalidSchema { table: String, reason: String },

    #[error("Foreign keys form a cycle: {}", .0.join(" -> "))]
    ReferenceCycle(Vec<String>),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn sample_pairs(child_only: &[(String, String)], parent_only: &[(String, String)]) -> String {
    child_only
        .iter()
        .chain(parent_only)
        .take(3)
        .map(|(child, parent)| format!("({child}, {parent})"))
        .collect::<Vec<_>>()
        .join(", ")
}
