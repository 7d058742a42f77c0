//! Header contract check and column renaming

use std::collections::BTreeSet;
use tracing::debug;

use crate::error::{CurationError, Result};
use crate::schema::TableSchema;
use crate::table::{Record, Table};

/// Check that `header` holds exactly the schema's source columns
///
/// Order does not matter, but every declared column must appear once and
/// nothing else may appear.
pub fn check_header<'a>(table: &str, expected: impl IntoIterator<Item = &'a str>, header: &[String]) -> Result<()> {
    let expected: BTreeSet<&str> = expected.into_iter().collect();
    let found: BTreeSet<&str> = header.iter().map(String::as_str).collect();

    let missing: Vec<String> = expected.difference(&found).map(|s| s.to_string()).collect();
    let mut extra: Vec<String> = found.difference(&expected).map(|s| s.to_string()).collect();

    if found.len() != header.len() {
        let mut seen = BTreeSet::new();
        for column in header {
            if !seen.insert(column.as_str()) && !extra.contains(column) {
                extra.push(column.clone());
            }
        }
    }

    if missing.is_empty() && extra.is_empty() {
        return Ok(());
    }

    debug!(table, ?missing, ?extra, "check_header: mismatch");
    Err(CurationError::HeaderMismatch {
        table: table.to_string(),
        missing,
        extra,
    })
}

/// Rename a raw table's columns and build sparse records
///
/// Records come out in input row order with empty cells omitted.
pub fn map_table(schema: &TableSchema, header: &[String], rows: &[Vec<String>]) -> Result<Table> {
    debug!(table = schema.raw_name, rows = rows.len(), "map_table: called");
    check_header(schema.raw_name, schema.source_columns(), header)?;

    // check_header guarantees every entry has a target
    let renamed: Vec<&'static str> = header.iter().filter_map(|h| schema.rename(h)).collect();

    let mut records = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != renamed.len() {
            return Err(CurationError::RaggedRow {
                table: schema.raw_name.to_string(),
                row: idx + 1,
                expected: renamed.len(),
                found: row.len(),
            });
        }
        let record: Record = renamed.iter().copied().zip(row.iter().map(String::as_str)).collect();
        records.push(record);
    }

    debug!(table = schema.name, records = records.len(), "map_table: complete");
    Ok(Table::new(schema.name, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawTable;
    use crate::schema::Registry;

    fn metafeatures() -> TableSchema {
        Registry::grammaticon().get("metafeatures.csv").unwrap().clone()
    }

    #[test]
    fn test_map_renames_and_drops_empty_cells() {
        let raw = RawTable::from_strs(
            "Metafeatures.csv",
            &["id", "name", "feature_area"],
            &[&["1", "Tense", ""], &["2", "", "verbs"]],
        );

        let table = map_table(&metafeatures(), &raw.header, &raw.rows).unwrap();

        assert_eq!(table.name, "metafeatures.csv");
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0], Record::new().with("ID", "1").with("Name", "Tense"));
        assert_eq!(table.records[1], Record::new().with("ID", "2").with("Feature_Area", "verbs"));
        assert!(!table.records[0].contains("Feature_Area"));
    }

    #[test]
    fn test_map_is_positional_not_declaration_order() {
        let raw = RawTable::from_strs("Metafeatures.csv", &["feature_area", "id", "name"], &[&["nouns", "3", "Case"]]);

        let table = map_table(&metafeatures(), &raw.header, &raw.rows).unwrap();
        assert_eq!(table.records[0].get("Feature_Area"), Some("nouns"));
        assert_eq!(table.records[0].get("ID"), Some("3"));
    }

    #[test]
    fn test_map_preserves_row_order() {
        let raw = RawTable::from_strs(
            "Metafeatures.csv",
            &["id", "name", "feature_area"],
            &[&["3", "c", ""], &["1", "a", ""], &["2", "b", ""]],
        );

        let table = map_table(&metafeatures(), &raw.header, &raw.rows).unwrap();
        let ids: Vec<_> = table.records.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let raw = RawTable::from_strs("Metafeatures.csv", &["id", "name"], &[&["1", "Tense"]]);

        let err = map_table(&metafeatures(), &raw.header, &raw.rows).unwrap_err();
        match err {
            CurationError::HeaderMismatch { table, missing, extra } => {
                assert_eq!(table, "Metafeatures.csv");
                assert_eq!(missing, vec!["feature_area"]);
                assert!(extra.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extra_column_is_fatal() {
        let raw = RawTable::from_strs(
            "Metafeatures.csv",
            &["id", "name", "feature_area", "notes"],
            &[&["1", "Tense", "", ""]],
        );

        let err = map_table(&metafeatures(), &raw.header, &raw.rows).unwrap_err();
        assert!(matches!(err, CurationError::HeaderMismatch { ref extra, .. } if extra == &vec!["notes".to_string()]));
    }

    #[test]
    fn test_duplicated_header_column_is_fatal() {
        let header: Vec<String> = ["id", "name", "feature_area", "name"].iter().map(|s| s.to_string()).collect();

        let err = check_header("Metafeatures.csv", ["id", "name", "feature_area"], &header).unwrap_err();
        assert!(matches!(err, CurationError::HeaderMismatch { ref extra, .. } if extra == &vec!["name".to_string()]));
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let header: Vec<String> = ["id", "name", "feature_area"].iter().map(|s| s.to_string()).collect();
        let rows = vec![vec!["1".to_string(), "Tense".to_string()]];

        let err = map_table(&metafeatures(), &header, &rows).unwrap_err();
        assert!(matches!(err, CurationError::RaggedRow { row: 1, .. }));
    }
}
