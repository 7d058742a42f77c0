//! Raw tables as exported from the spreadsheets

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CurationError, Result};
use crate::schema::Registry;

/// Header row plus data rows of one exported sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// File name of the export, e.g. `Features.csv`
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            header,
            rows,
        }
    }

    /// Build from string slices, mostly for tests and fixtures
    pub fn from_strs(name: &str, header: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            name,
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|row| row.iter().map(|s| s.to_string()).collect()).collect(),
        )
    }

    /// Parse CSV content with a header row
    ///
    /// Cells are trimmed. Every row must be as wide as the header.
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            if record.len() != header.len() {
                return Err(CurationError::RaggedRow {
                    table: name.to_string(),
                    row: idx + 1,
                    expected: header.len(),
                    found: record.len(),
                });
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(table = name, rows = rows.len(), "RawTable::parse: complete");
        Ok(Self::new(name, header, rows))
    }

    /// Read a CSV file; the table is named after the file
    pub fn read(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&name, &content)
    }
}

/// All raw tables of one export, keyed by file name
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    tables: BTreeMap<String, RawTable>,
}

impl RawDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: RawTable) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Builder-style [`RawDataset::insert`]
    pub fn with(mut self, table: RawTable) -> Self {
        self.insert(table);
        self
    }

    pub fn get(&self, name: &str) -> Result<&RawTable> {
        self.tables
            .get(name)
            .ok_or_else(|| CurationError::MissingTable(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Read every table the registry expects from `dir`
    pub fn read_dir(dir: &Path, registry: &Registry) -> Result<Self> {
        debug!(?dir, "RawDataset::read_dir: called");
        let mut dataset = Self::new();
        for raw_name in registry.raw_names() {
            let path = dir.join(raw_name);
            if !path.is_file() {
                return Err(CurationError::MissingTable(path.display().to_string()));
            }
            dataset.insert(RawTable::read(&path)?);
        }
        info!(?dir, tables = dataset.len(), "Read raw export");
        Ok(dataset)
    }
}
