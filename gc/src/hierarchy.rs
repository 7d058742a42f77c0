//! Concept hierarchy normalization
//!
//! The raw export stores the concept tree as a bidirectional adjacency list:
//! a row `(concept, child)` for every child link and a matching row
//! `(concept, parent)` for the same link seen from the other end. This module
//! checks that the two halves agree and collapses them into one sorted list
//! of `(Child_ID, Parent_ID)` edges.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{CurationError, Result};
use crate::mapper::check_header;
use crate::schema::HierarchySchema;
use crate::table::{Record, Table};

/// One normalized hierarchy edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    #[serde(rename = "Child_ID")]
    pub child_id: String,

    #[serde(rename = "Parent_ID")]
    pub parent_id: String,
}

impl Edge {
    pub fn new(child_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            child_id: child_id.into(),
            parent_id: parent_id.into(),
        }
    }

    pub fn to_record(&self) -> Record {
        Record::new()
            .with(HierarchySchema::CHILD_ID, self.child_id.as_str())
            .with(HierarchySchema::PARENT_ID, self.parent_id.as_str())
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_ids(&self.child_id, &other.child_id).then_with(|| compare_ids(&self.parent_id, &other.parent_id))
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Order ids as integers, so "9" sorts before "10"
///
/// Ids that are not integers sort after all integer ids, by string.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// One raw hierarchy row after the shape check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEdge {
    /// `subject` has child `child`
    Child { subject: String, child: String },
    /// `subject` has parent `parent`
    Parent { subject: String, parent: String },
}

/// Read raw hierarchy rows into sparse records keyed by raw column name
pub fn load_raw_edges(schema: &HierarchySchema, header: &[String], rows: &[Vec<String>]) -> Result<Vec<Record>> {
    check_header(schema.raw_name, schema.source_columns(), header)?;
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            if row.len() != header.len() {
                return Err(CurationError::RaggedRow {
                    table: schema.raw_name.to_string(),
                    row: idx + 1,
                    expected: header.len(),
                    found: row.len(),
                });
            }
            Ok(header.iter().map(String::as_str).zip(row.iter().map(String::as_str)).collect())
        })
        .collect()
}

/// Check that every row names a subject and exactly one of child or parent
pub fn check_shape(schema: &HierarchySchema, raw_edges: &[Record]) -> Result<Vec<RawEdge>> {
    debug!(rows = raw_edges.len(), "check_shape: called");
    raw_edges
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let shape_error = || CurationError::HierarchyShape {
                table: schema.raw_name.to_string(),
                row: idx + 1,
            };
            let subject = row.get(schema.subject_column).ok_or_else(shape_error)?.to_string();
            match (row.get(schema.child_column), row.get(schema.parent_column)) {
                (Some(child), None) => Ok(RawEdge::Child {
                    subject,
                    child: child.to_string(),
                }),
                (None, Some(parent)) => Ok(RawEdge::Parent {
                    subject,
                    parent: parent.to_string(),
                }),
                _ => Err(shape_error()),
            }
        })
        .collect()
}

/// Check that child links and parent links describe the same edges
///
/// Child rows give `(child, subject)` pairs and parent rows give
/// `(subject, parent)` pairs. Only pairs whose endpoints are both known
/// concepts are compared; edges touching unknown ids are dropped later anyway.
pub fn check_reflexivity(
    schema: &HierarchySchema,
    edges: &[RawEdge],
    valid_concept_ids: &HashSet<String>,
) -> Result<()> {
    let known = |child: &str, parent: &str| valid_concept_ids.contains(child) && valid_concept_ids.contains(parent);

    let mut from_children = BTreeSet::new();
    let mut from_parents = BTreeSet::new();
    for edge in edges {
        match edge {
            RawEdge::Child { subject, child } if known(child, subject) => {
                from_children.insert(Edge::new(child.as_str(), subject.as_str()));
            }
            RawEdge::Parent { subject, parent } if known(subject, parent) => {
                from_parents.insert(Edge::new(subject.as_str(), parent.as_str()));
            }
            _ => {}
        }
    }

    if from_children == from_parents {
        debug!(edges = from_parents.len(), "check_reflexivity: links agree");
        return Ok(());
    }

    let as_pairs = |edges: Vec<&Edge>| -> Vec<(String, String)> {
        edges
            .into_iter()
            .map(|e| (e.child_id.clone(), e.parent_id.clone()))
            .collect()
    };
    Err(CurationError::NotReflexive {
        table: schema.raw_name.to_string(),
        child_only: as_pairs(from_children.difference(&from_parents).collect()),
        parent_only: as_pairs(from_parents.difference(&from_children).collect()),
    })
}

/// Collapse raw hierarchy rows into validated, sorted edges
///
/// Parent links are the canonical edge set. Edges with an unknown child or
/// parent are dropped with a diagnostic; the rest are deduplicated and
/// sorted by `(child, parent)` compared as integers.
pub fn normalize_hierarchy(
    schema: &HierarchySchema,
    raw_edges: &[Record],
    valid_concept_ids: &HashSet<String>,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Edge>> {
    debug!(rows = raw_edges.len(), concepts = valid_concept_ids.len(), "normalize_hierarchy: called");
    let edges = check_shape(schema, raw_edges)?;
    check_reflexivity(schema, &edges, valid_concept_ids)?;

    let canonical: BTreeSet<Edge> = edges
        .into_iter()
        .filter_map(|edge| match edge {
            RawEdge::Parent { subject, parent } => Some(Edge::new(subject, parent)),
            RawEdge::Child { .. } => None,
        })
        .collect();

    let mut result = Vec::with_capacity(canonical.len());
    for edge in canonical {
        let kind = if !valid_concept_ids.contains(&edge.child_id) {
            Some(DiagnosticKind::UnknownChild {
                child: edge.child_id.clone(),
                parent: edge.parent_id.clone(),
            })
        } else if !valid_concept_ids.contains(&edge.parent_id) {
            Some(DiagnosticKind::UnknownParent {
                child: edge.child_id.clone(),
                parent: edge.parent_id.clone(),
            })
        } else {
            None
        };

        match kind {
            Some(kind) => diagnostics.push(Diagnostic::new(schema.name, kind)),
            None => result.push(edge),
        }
    }

    info!(edges = result.len(), "Normalized concept hierarchy");
    Ok(result)
}

/// Normalized edges as a curated table
pub fn edges_to_table(schema: &HierarchySchema, edges: &[Edge]) -> Table {
    Table::new(schema.name, edges.iter().map(Edge::to_record).collect())
}
