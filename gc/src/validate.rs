//! Record-level validation
//!
//! Each check takes a mapped [`Table`], drops the records that fail and emits
//! one [`Diagnostic`] per dropped record. Surviving records keep their order.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{CurationError, Result};
use crate::schema::{Datatype, ForeignKey, ID_COLUMN, KeyPolicy, TableSchema};
use crate::table::{Record, Table};

/// Primary key sets of already validated tables, keyed by curated table name
pub type IdSets = HashMap<String, HashSet<String>>;

/// How a record is named in diagnostics
///
/// Uses the record's `ID`; link tables without one fall back to the first
/// other key column present, then to the row number.
fn record_label(record: &Record, keys: &[ForeignKey], failing: &str, row: usize) -> String {
    if let Some(id) = record.id() {
        return format!("{} {}", ID_COLUMN, id);
    }
    keys.iter()
        .filter(|fk| fk.column != failing)
        .find_map(|fk| record.get(fk.column).map(|v| format!("{} {}", fk.column, v)))
        .unwrap_or_else(|| format!("row {}", row))
}

/// Drop records whose foreign keys do not resolve
///
/// A `Required` key must be present and resolve; an `Optional` key may be
/// absent but must resolve when present. A referenced table missing from
/// `id_sets` resolves nothing.
pub fn validate_references(
    table: Table,
    foreign_keys: &[ForeignKey],
    id_sets: &IdSets,
    diagnostics: &mut Diagnostics,
) -> Table {
    debug!(table = %table.name, records = table.len(), keys = foreign_keys.len(), "validate_references: called");
    let empty = HashSet::new();
    let Table { name, records } = table;

    let mut kept = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        let failure = foreign_keys.iter().find_map(|fk| {
            let ids = id_sets.get(fk.references).unwrap_or(&empty);
            match record.get(fk.column) {
                None if fk.policy == KeyPolicy::Required => Some(DiagnosticKind::MissingReference {
                    column: fk.column.to_string(),
                    record: record_label(&record, foreign_keys, fk.column, idx + 1),
                }),
                None => None,
                Some(value) if ids.contains(value) => None,
                Some(value) => Some(DiagnosticKind::InvalidReference {
                    column: fk.column.to_string(),
                    record: record_label(&record, foreign_keys, fk.column, idx + 1),
                    value: value.to_string(),
                }),
            }
        });

        match failure {
            Some(kind) => diagnostics.push(Diagnostic::new(name.clone(), kind)),
            None => kept.push(record),
        }
    }

    debug!(table = %name, kept = kept.len(), "validate_references: complete");
    Table::new(name, kept)
}

/// Drop records missing any of the schema's required fields
pub fn check_required_fields(schema: &TableSchema, table: Table, diagnostics: &mut Diagnostics) -> Table {
    let Table { name, records } = table;
    let kept = records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            match schema.required_fields.iter().find(|field| !record.contains(field)) {
                Some(field) => {
                    diagnostics.push(Diagnostic::new(
                        name.clone(),
                        DiagnosticKind::MissingField {
                            column: field.to_string(),
                            record: record_label(&record, &schema.foreign_keys, field, idx + 1),
                        },
                    ));
                    None
                }
                None => Some(record),
            }
        })
        .collect();
    Table::new(name, kept)
}

/// Drop records whose `integer` columns do not hold integers
pub fn check_datatypes(schema: &TableSchema, table: Table, diagnostics: &mut Diagnostics) -> Table {
    let integer_columns: Vec<&str> = schema
        .columns
        .iter()
        .filter(|c| c.datatype == Datatype::Integer)
        .map(|c| c.name)
        .collect();
    if integer_columns.is_empty() {
        return table;
    }

    let Table { name, records } = table;
    let kept = records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            let invalid = integer_columns
                .iter()
                .find_map(|column| record.get(column).filter(|v| v.parse::<i64>().is_err()).map(|v| (*column, v)));
            match invalid {
                Some((column, value)) => {
                    diagnostics.push(Diagnostic::new(
                        name.clone(),
                        DiagnosticKind::InvalidValue {
                            column: column.to_string(),
                            record: record_label(&record, &schema.foreign_keys, column, idx + 1),
                            value: value.to_string(),
                            datatype: Datatype::Integer.to_string(),
                        },
                    ));
                    None
                }
                None => Some(record),
            }
        })
        .collect();
    Table::new(name, kept)
}

/// Enforce primary key uniqueness
///
/// In strict mode a repeated `ID` is fatal. Otherwise the first occurrence
/// wins and later ones are dropped with a diagnostic.
pub fn check_unique_ids(table: Table, strict: bool, diagnostics: &mut Diagnostics) -> Result<Table> {
    let Table { name, records } = table;
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        if let Some(id) = record.id()
            && !seen.insert(id.to_string())
        {
            if strict {
                return Err(CurationError::DuplicateId {
                    table: name,
                    id: id.to_string(),
                });
            }
            diagnostics.push(Diagnostic::new(name.clone(), DiagnosticKind::DuplicateId { id: id.to_string() }));
            continue;
        }
        kept.push(record);
    }

    Ok(Table::new(name, kept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Registry;

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn feature(id: &str, metafeature: &str, list: &str) -> Record {
        Record::new()
            .with("ID", id)
            .with("Name", format!("feature {id}"))
            .with("Metafeature_ID", metafeature)
            .with("Feature_List_ID", list)
    }

    fn feature_id_sets() -> IdSets {
        let mut sets = IdSets::new();
        sets.insert("metafeatures.csv".to_string(), ids(&["1", "2"]));
        sets.insert("feature-lists.csv".to_string(), ids(&["10"]));
        sets
    }

    #[test]
    fn test_dangling_reference_is_dropped_with_one_diagnostic() {
        let registry = Registry::grammaticon();
        let schema = registry.get("features.csv").unwrap();
        let table = Table::new(
            "features.csv",
            vec![feature("a", "1", "10"), feature("b", "99", "10"), feature("c", "2", "10")],
        );

        let mut diagnostics = Diagnostics::new();
        let result = validate_references(table, &schema.foreign_keys, &feature_id_sets(), &mut diagnostics);

        let kept: Vec<_> = result.records.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(kept, vec!["a", "c"]);
        assert_eq!(diagnostics.len(), 1);

        let line = diagnostics.iter().next().unwrap().to_string();
        assert_eq!(line, "features.csv: invalid Metafeature_ID for ID b: 99");
    }

    #[test]
    fn test_missing_required_reference_is_dropped() {
        let registry = Registry::grammaticon();
        let schema = registry.get("features.csv").unwrap();
        let table = Table::new("features.csv", vec![feature("a", "1", ""), feature("b", "2", "10")]);

        let mut diagnostics = Diagnostics::new();
        let result = validate_references(table, &schema.foreign_keys, &feature_id_sets(), &mut diagnostics);

        assert_eq!(result.len(), 1);
        assert_eq!(
            diagnostics.iter().next().unwrap().kind,
            DiagnosticKind::MissingReference {
                column: "Feature_List_ID".to_string(),
                record: "ID a".to_string(),
            }
        );
    }

    #[test]
    fn test_record_failing_two_keys_gets_one_diagnostic() {
        let registry = Registry::grammaticon();
        let schema = registry.get("features.csv").unwrap();
        let table = Table::new("features.csv", vec![feature("a", "98", "99")]);

        let mut diagnostics = Diagnostics::new();
        let result = validate_references(table, &schema.foreign_keys, &feature_id_sets(), &mut diagnostics);

        assert!(result.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_optional_reference_may_be_absent_but_not_dangling() {
        let keys = vec![ForeignKey::optional("Metafeature_ID", "metafeatures.csv")];
        let table = Table::new(
            "features.csv",
            vec![
                Record::new().with("ID", "a"),
                Record::new().with("ID", "b").with("Metafeature_ID", "7"),
                Record::new().with("ID", "c").with("Metafeature_ID", "2"),
            ],
        );

        let mut diagnostics = Diagnostics::new();
        let result = validate_references(table, &keys, &feature_id_sets(), &mut diagnostics);

        let kept: Vec<_> = result.records.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(kept, vec!["a", "c"]);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_link_table_label_uses_other_key() {
        let registry = Registry::grammaticon();
        let schema = registry.get("concepts-metafeatures.csv").unwrap();
        let mut sets = IdSets::new();
        sets.insert("concepts.csv".to_string(), ids(&["5"]));
        sets.insert("metafeatures.csv".to_string(), ids(&["1"]));

        let table = Table::new(
            "concepts-metafeatures.csv",
            vec![
                Record::new().with("Concept_ID", "5"),
                Record::new().with("Concept_ID", "5").with("Metafeature_ID", "3"),
            ],
        );

        let mut diagnostics = Diagnostics::new();
        let result = validate_references(table, &schema.foreign_keys, &sets, &mut diagnostics);

        assert!(result.is_empty());
        let lines: Vec<_> = diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "concepts-metafeatures.csv: missing Metafeature_ID for Concept_ID 5",
                "concepts-metafeatures.csv: invalid Metafeature_ID for Concept_ID 5: 3",
            ]
        );
    }

    #[test]
    fn test_unknown_referenced_table_resolves_nothing() {
        let keys = vec![ForeignKey::required("Metafeature_ID", "metafeatures.csv")];
        let table = Table::new("features.csv", vec![Record::new().with("ID", "a").with("Metafeature_ID", "1")]);

        let mut diagnostics = Diagnostics::new();
        let result = validate_references(table, &keys, &IdSets::new(), &mut diagnostics);
        assert!(result.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_required_fields() {
        let registry = Registry::grammaticon();
        let schema = registry.get("concepts.csv").unwrap();
        let table = Table::new(
            "concepts.csv",
            vec![
                Record::new().with("ID", "1").with("Name", "noun"),
                Record::new().with("ID", "2"),
                Record::new().with("Name", "orphan"),
            ],
        );

        let mut diagnostics = Diagnostics::new();
        let result = check_required_fields(schema, table, &mut diagnostics);

        assert_eq!(result.len(), 1);
        let lines: Vec<_> = diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "concepts.csv: missing required field Name for ID 2",
                "concepts.csv: missing required field ID for row 3",
            ]
        );
    }

    #[test]
    fn test_integer_columns() {
        let registry = Registry::grammaticon();
        let schema = registry.get("feature-lists.csv").unwrap();
        let table = Table::new(
            "feature-lists.csv",
            vec![
                Record::new().with("ID", "1").with("Number_of_Features", "144"),
                Record::new().with("ID", "2").with("Number_of_Features", "ca. 90"),
                Record::new().with("ID", "3"),
            ],
        );

        let mut diagnostics = Diagnostics::new();
        let result = check_datatypes(schema, table, &mut diagnostics);

        let kept: Vec<_> = result.records.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(kept, vec!["1", "3"]);
        assert_eq!(
            diagnostics.iter().next().unwrap().to_string(),
            "feature-lists.csv: Number_of_Features for ID 2 is not a valid integer: ca. 90"
        );
    }

    #[test]
    fn test_duplicate_ids_strict() {
        let table = Table::new(
            "metafeatures.csv",
            vec![Record::new().with("ID", "1"), Record::new().with("ID", "1")],
        );

        let err = check_unique_ids(table, true, &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, CurationError::DuplicateId { ref id, .. } if id == "1"));
    }

    #[test]
    fn test_duplicate_ids_lenient_keeps_first() {
        let table = Table::new(
            "metafeatures.csv",
            vec![
                Record::new().with("ID", "1").with("Name", "first"),
                Record::new().with("ID", "2"),
                Record::new().with("ID", "1").with("Name", "second"),
            ],
        );

        let mut diagnostics = Diagnostics::new();
        let result = check_unique_ids(table, false, &mut diagnostics).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.records[0].get("Name"), Some("first"));
        assert_eq!(diagnostics.len(), 1);
    }
}
