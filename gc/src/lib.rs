//! Grammaticon - dataset curation for the Grammaticon spreadsheet export
//!
//! Turns the raw CSV export of the Grammaticon spreadsheets into validated,
//! cross-referenced tables with a CSVW description.
//!
//! # Pipeline
//!
//! ```text
//! raw/*.csv ──► mapper ──► validate ──────────────► export ──► csvw/
//!   (header      (rename,   (required fields,        (CSV + csvw-metadata.json)
//!    contract)    sparse)    datatypes, unique IDs,
//!                            foreign keys)
//! Concepthierarchy.csv ──► hierarchy (shape, reflexivity, ordering) ──┘
//! ```
//!
//! Structural problems in the export abort the run with a [`CurationError`].
//! Data-quality problems drop the offending record and leave a
//! [`Diagnostic`] behind.
//!
//! # Example
//!
//! ```ignore
//! use grammaticon::{Pipeline, RawDataset, Registry};
//!
//! let registry = Registry::grammaticon();
//! let raw = RawDataset::read_dir("raw".as_ref(), &registry)?;
//! let curated = Pipeline::new(registry).run(&raw)?;
//! for diagnostic in &curated.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod mapper;
pub mod pipeline;
pub mod raw;
pub mod schema;
pub mod table;
pub mod validate;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{CurationError, Result};
pub use export::{METADATA_FILE, write_csvw};
pub use hierarchy::{Edge, check_reflexivity, check_shape, normalize_hierarchy};
pub use mapper::map_table;
pub use pipeline::{Curated, Pipeline, PipelineOptions};
pub use raw::{RawDataset, RawTable};
pub use schema::{ColumnSpec, Datatype, ForeignKey, HierarchySchema, KeyPolicy, Registry, TableSchema};
pub use table::{Record, Table};
pub use validate::{IdSets, validate_references};
