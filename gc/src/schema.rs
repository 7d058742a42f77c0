//! Schema registry
//!
//! Static description of every raw table in the Grammaticon export: how its
//! columns are renamed, which datatype each column carries, and which
//! columns reference the `ID` of another table.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{CurationError, Result};

/// Primary key column shared by every entity table
pub const ID_COLUMN: &str = "ID";

const CLDF_TERMS: &str = "http://cldf.clld.org/v1.0/terms.rdf";

/// Declared datatype of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Datatype {
    String,
    Integer,
}

impl std::fmt::Display for Datatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
        }
    }
}

/// One column: raw spreadsheet name and its curated counterpart
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSpec {
    /// Column name in the raw export
    pub source: &'static str,

    /// Column name in the curated table
    pub name: &'static str,

    pub datatype: Datatype,

    /// CLDF property the column maps to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_url: Option<String>,
}

impl ColumnSpec {
    fn string(source: &'static str, name: &'static str) -> Self {
        Self {
            source,
            name,
            datatype: Datatype::String,
            property_url: None,
        }
    }

    fn integer(source: &'static str, name: &'static str) -> Self {
        Self {
            datatype: Datatype::Integer,
            ..Self::string(source, name)
        }
    }

    fn term(mut self, term: &str) -> Self {
        self.property_url = Some(format!("{}#{}", CLDF_TERMS, term));
        self
    }
}

/// How a missing foreign key value is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Absent value drops the record
    Required,
    /// Absent value is allowed; a present value must still resolve
    Optional,
}

/// A column whose value must match the `ID` of a record in another table
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKey {
    pub column: &'static str,

    /// Curated name of the referenced table
    pub references: &'static str,

    pub policy: KeyPolicy,
}

impl ForeignKey {
    pub fn required(column: &'static str, references: &'static str) -> Self {
        Self {
            column,
            references,
            policy: KeyPolicy::Required,
        }
    }

    pub fn optional(column: &'static str, references: &'static str) -> Self {
        Self {
            column,
            references,
            policy: KeyPolicy::Optional,
        }
    }
}

/// Schema of one entity table
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    /// File name of the raw export
    pub raw_name: &'static str,

    /// File name of the curated table
    pub name: &'static str,

    /// Columns in output order
    pub columns: Vec<ColumnSpec>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,

    /// Columns whose absence drops the record
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<&'static str>,
}

impl TableSchema {
    /// Source column names as declared
    pub fn source_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.source)
    }

    /// Curated column names in output order
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Target name for a raw column
    pub fn rename(&self, source: &str) -> Option<&'static str> {
        self.columns.iter().find(|c| c.source == source).map(|c| c.name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether the table has an `ID` primary key column
    pub fn has_primary_key(&self) -> bool {
        self.column(ID_COLUMN).is_some()
    }

    /// Names of the tables this one references
    pub fn referenced_tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.foreign_keys.iter().map(|fk| fk.references)
    }
}

/// Raw hierarchy table columns and the curated edge table they collapse into
#[derive(Debug, Clone, Serialize)]
pub struct HierarchySchema {
    pub raw_name: &'static str,
    pub name: &'static str,

    /// Subject concept column in the raw table
    pub subject_column: &'static str,
    pub child_column: &'static str,
    pub parent_column: &'static str,

    /// Curated table whose `ID`s both edge endpoints reference
    pub concepts: &'static str,
}

impl HierarchySchema {
    pub const CHILD_ID: &'static str = "Child_ID";
    pub const PARENT_ID: &'static str = "Parent_ID";

    pub fn source_columns(&self) -> [&'static str; 3] {
        [self.subject_column, self.child_column, self.parent_column]
    }

    /// Output columns of the normalized edge table
    ///
    /// Edges are read off parent-link rows, so the child endpoint comes from
    /// the subject column.
    pub fn columns(&self) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::string(self.subject_column, Self::CHILD_ID),
            ColumnSpec::string(self.parent_column, Self::PARENT_ID),
        ]
    }

    pub fn foreign_keys(&self) -> Vec<ForeignKey> {
        vec![
            ForeignKey::required(Self::CHILD_ID, self.concepts),
            ForeignKey::required(Self::PARENT_ID, self.concepts),
        ]
    }
}

/// Immutable lookup from raw or curated table name to its schema
#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    pub tables: Vec<TableSchema>,
    pub hierarchy: HierarchySchema,
}

impl Registry {
    /// The Grammaticon dataset
    pub fn grammaticon() -> Self {
        let concepts = TableSchema {
            raw_name: "Concepts.csv",
            name: "concepts.csv",
            columns: vec![
                ColumnSpec::string("id", ID_COLUMN).term("id"),
                ColumnSpec::string("label", "Name").term("name"),
                ColumnSpec::string("definition", "Description").term("definition"),
                ColumnSpec::string("quotation", "Quotation"),
                ColumnSpec::string("comments", "Comment").term("comment"),
                ColumnSpec::string("GOLD counterpart", "GOLD_Counterpart"),
                ColumnSpec::string("GOLD URL", "GOLD_URL"),
                ColumnSpec::string("GOLD comment", "GOLD_Comment"),
                ColumnSpec::string("ISOCAT counterpart", "ISOCAT_Counterpart"),
                ColumnSpec::string("ISOCAT URL", "ISOCAT_URL"),
                ColumnSpec::string("ISOCAT comments", "ISOCAT_Comments"),
            ],
            foreign_keys: vec![],
            required_fields: vec![ID_COLUMN, "Name"],
        };

        let metafeatures = TableSchema {
            raw_name: "Metafeatures.csv",
            name: "metafeatures.csv",
            columns: vec![
                ColumnSpec::string("id", ID_COLUMN).term("id"),
                ColumnSpec::string("name", "Name").term("name"),
                ColumnSpec::string("feature_area", "Feature_Area"),
            ],
            foreign_keys: vec![],
            required_fields: vec![ID_COLUMN],
        };

        let feature_lists = TableSchema {
            raw_name: "Feature_lists.csv",
            name: "feature-lists.csv",
            columns: vec![
                ColumnSpec::string("id", ID_COLUMN).term("id"),
                ColumnSpec::string("name", "Name").term("name"),
                ColumnSpec::string("URL", "URL"),
                ColumnSpec::string("authors", "Authors"),
                ColumnSpec::integer("number of features", "Number_of_Features"),
                ColumnSpec::string("year", "Year"),
            ],
            foreign_keys: vec![],
            required_fields: vec![ID_COLUMN],
        };

        let features = TableSchema {
            raw_name: "Features.csv",
            name: "features.csv",
            columns: vec![
                ColumnSpec::string("feature_ID", ID_COLUMN).term("id"),
                ColumnSpec::string("feature name", "Name").term("name"),
                ColumnSpec::string("feature description", "Description").term("definition"),
                ColumnSpec::string("meta_feature_id", "Metafeature_ID"),
                ColumnSpec::string("collection_id", "Feature_List_ID"),
                ColumnSpec::string("collection URL", "Feature_List_URL"),
                ColumnSpec::string("collection numbers", "Feature_List_Numbers"),
            ],
            foreign_keys: vec![
                ForeignKey::required("Metafeature_ID", "metafeatures.csv"),
                ForeignKey::required("Feature_List_ID", "feature-lists.csv"),
            ],
            required_fields: vec![ID_COLUMN],
        };

        let concepts_metafeatures = TableSchema {
            raw_name: "Concepts_metafeatures.csv",
            name: "concepts-metafeatures.csv",
            columns: vec![
                ColumnSpec::string("concept_id", "Concept_ID"),
                ColumnSpec::string("meta_feature__id", "Metafeature_ID"),
            ],
            foreign_keys: vec![
                ForeignKey::required("Concept_ID", "concepts.csv"),
                ForeignKey::required("Metafeature_ID", "metafeatures.csv"),
            ],
            required_fields: vec![],
        };

        Self {
            tables: vec![concepts, metafeatures, feature_lists, features, concepts_metafeatures],
            hierarchy: HierarchySchema {
                raw_name: "Concepthierarchy.csv",
                name: "concept-hierarchy.csv",
                subject_column: "concept_id",
                child_column: "concept_child_id",
                parent_column: "concept_parent_id",
                concepts: "concepts.csv",
            },
        }
    }

    /// Look up a schema by curated table name
    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Look up a schema by raw file name
    pub fn by_raw_name(&self, raw_name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.raw_name == raw_name)
    }

    /// Raw file names the pipeline expects, hierarchy last
    pub fn raw_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables
            .iter()
            .map(|t| t.raw_name)
            .chain(std::iter::once(self.hierarchy.raw_name))
    }

    /// Check the registry's own invariants
    ///
    /// Every foreign key and required field must name a column of its table,
    /// every referenced table must be registered and have an `ID` column, and
    /// no two columns may share a source or target name.
    pub fn validate(&self) -> Result<()> {
        debug!(table_count = self.tables.len(), "Registry::validate: called");
        let invalid = |table: &str, reason: String| CurationError::InvalidSchema {
            table: table.to_string(),
            reason,
        };

        let mut names = HashSet::new();
        for table in &self.tables {
            if !names.insert(table.name) {
                return Err(invalid(table.name, "table registered twice".to_string()));
            }

            let mut sources = HashSet::new();
            let mut targets = HashSet::new();
            for column in &table.columns {
                if !sources.insert(column.source) {
                    return Err(invalid(table.name, format!("duplicate source column '{}'", column.source)));
                }
                if !targets.insert(column.name) {
                    return Err(invalid(table.name, format!("duplicate column '{}'", column.name)));
                }
            }

            for fk in &table.foreign_keys {
                if !targets.contains(fk.column) {
                    return Err(invalid(table.name, format!("foreign key column '{}' is not a column", fk.column)));
                }
                match self.get(fk.references) {
                    Some(target) if target.has_primary_key() => {}
                    Some(_) => {
                        return Err(invalid(
                            table.name,
                            format!("referenced table '{}' has no {} column", fk.references, ID_COLUMN),
                        ));
                    }
                    None => {
                        return Err(invalid(table.name, format!("unknown referenced table '{}'", fk.references)));
                    }
                }
            }

            for field in &table.required_fields {
                if !targets.contains(field) {
                    return Err(invalid(table.name, format!("required field '{}' is not a column", field)));
                }
            }
        }

        match self.get(self.hierarchy.concepts) {
            Some(concepts) if concepts.has_primary_key() => Ok(()),
            _ => Err(invalid(
                self.hierarchy.name,
                format!("unknown concept table '{}'", self.hierarchy.concepts),
            )),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::grammaticon()
    }
}
