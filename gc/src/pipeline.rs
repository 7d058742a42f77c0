//! Curation pipeline driver
//!
//! Maps every raw table, validates referenced tables before the tables that
//! reference them, and normalizes the concept hierarchy against the
//! surviving concepts.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::error::{CurationError, Result};
use crate::hierarchy::{Edge, load_raw_edges, normalize_hierarchy};
use crate::mapper::map_table;
use crate::raw::RawDataset;
use crate::schema::{Registry, TableSchema};
use crate::table::Table;
use crate::validate::{IdSets, check_datatypes, check_required_fields, check_unique_ids, validate_references};

/// Pipeline behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Treat a repeated `ID` as fatal instead of dropping later duplicates
    pub strict_ids: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { strict_ids: true }
    }
}

/// Validated output of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Curated {
    /// Entity tables in registry order
    pub tables: Vec<Table>,

    /// Normalized concept hierarchy
    pub hierarchy: Vec<Edge>,

    /// One entry per dropped record, in the order they were found
    pub diagnostics: Diagnostics,
}

impl Curated {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Total number of records kept across all tables, hierarchy included
    pub fn record_count(&self) -> usize {
        self.tables.iter().map(Table::len).sum::<usize>() + self.hierarchy.len()
    }
}

/// Order tables so every table comes after the tables it references
///
/// Returns indices into `tables`. Ties keep registry order. A cycle of
/// foreign keys is an error naming the cycle.
pub fn reference_order(tables: &[TableSchema]) -> Result<Vec<usize>> {
    debug!(table_count = tables.len(), "reference_order: called");
    let index_map: HashMap<&str, usize> = tables.iter().enumerate().map(|(i, t)| (t.name, i)).collect();

    let mut visited = HashSet::new();
    let mut in_progress = Vec::new();
    let mut result = Vec::with_capacity(tables.len());

    for idx in 0..tables.len() {
        visit(idx, tables, &index_map, &mut visited, &mut in_progress, &mut result)?;
    }

    debug!(?result, "reference_order: complete");
    Ok(result)
}

/// DFS helper for [`reference_order`]
fn visit(
    idx: usize,
    tables: &[TableSchema],
    index_map: &HashMap<&str, usize>,
    visited: &mut HashSet<usize>,
    in_progress: &mut Vec<usize>,
    result: &mut Vec<usize>,
) -> Result<()> {
    if visited.contains(&idx) {
        return Ok(());
    }
    if let Some(pos) = in_progress.iter().position(|&i| i == idx) {
        let mut cycle: Vec<String> = in_progress[pos..].iter().map(|&i| tables[i].name.to_string()).collect();
        cycle.push(tables[idx].name.to_string());
        return Err(CurationError::ReferenceCycle(cycle));
    }

    in_progress.push(idx);
    for referenced in tables[idx].referenced_tables() {
        // self-references are resolved against the table's own ids
        if referenced == tables[idx].name {
            continue;
        }
        if let Some(&dep_idx) = index_map.get(referenced) {
            visit(dep_idx, tables, index_map, visited, in_progress, result)?;
        }
    }
    in_progress.pop();

    visited.insert(idx);
    result.push(idx);
    Ok(())
}

/// One-shot curation over a fixed registry
pub struct Pipeline {
    registry: Registry,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run the whole pipeline over a raw export
    ///
    /// Structural problems abort with an error; data-quality problems drop
    /// records and are reported in [`Curated::diagnostics`].
    pub fn run(&self, raw: &RawDataset) -> Result<Curated> {
        info!(tables = self.registry.tables.len(), strict_ids = self.options.strict_ids, "Curation started");
        self.registry.validate()?;

        let mut diagnostics = Diagnostics::new();

        // Map everything first so header problems surface before any filtering
        let mut mapped = Vec::with_capacity(self.registry.tables.len());
        for schema in &self.registry.tables {
            let raw_table = raw.get(schema.raw_name)?;
            mapped.push(Some(map_table(schema, &raw_table.header, &raw_table.rows)?));
        }
        let raw_hierarchy = raw.get(self.registry.hierarchy.raw_name)?;
        let raw_edges = load_raw_edges(&self.registry.hierarchy, &raw_hierarchy.header, &raw_hierarchy.rows)?;

        let order = reference_order(&self.registry.tables)?;
        let mut id_sets = IdSets::new();
        let mut validated: Vec<Option<Table>> = vec![None; self.registry.tables.len()];

        for idx in order {
            let schema = &self.registry.tables[idx];
            let Some(table) = mapped[idx].take() else {
                continue;
            };
            let before = table.len();

            // duplicates are judged on the mapped rows, before any record is filtered out
            let table = check_unique_ids(table, self.options.strict_ids, &mut diagnostics)?;
            let table = check_required_fields(schema, table, &mut diagnostics);
            let table = check_datatypes(schema, table, &mut diagnostics);

            // a table referencing itself sees its own ids before filtering
            if schema.referenced_tables().any(|r| r == schema.name) {
                id_sets.insert(schema.name.to_string(), table.ids());
            }
            let table = validate_references(table, &schema.foreign_keys, &id_sets, &mut diagnostics);

            if schema.has_primary_key() {
                id_sets.insert(schema.name.to_string(), table.ids());
            }
            info!(table = schema.name, before, after = table.len(), "Validated table");
            validated[idx] = Some(table);
        }

        let concept_ids = id_sets.get(self.registry.hierarchy.concepts).cloned().unwrap_or_default();
        let hierarchy = normalize_hierarchy(&self.registry.hierarchy, &raw_edges, &concept_ids, &mut diagnostics)?;

        let curated = Curated {
            tables: validated.into_iter().flatten().collect(),
            hierarchy,
            diagnostics,
        };
        info!(
            records = curated.record_count(),
            diagnostics = curated.diagnostics.len(),
            "Curation complete"
        );
        Ok(curated)
    }
}
