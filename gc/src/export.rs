//! CSVW output
//!
//! Writes one CSV file per curated table plus a `csvw-metadata.json` table
//! group describing columns, datatypes and foreign keys.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::hierarchy::edges_to_table;
use crate::pipeline::Curated;
use crate::schema::{ColumnSpec, ForeignKey, ID_COLUMN, Registry};
use crate::table::Table;

/// Name of the metadata file written next to the tables
pub const METADATA_FILE: &str = "csvw-metadata.json";

const CSVW_CONTEXT: &str = "http://www.w3.org/ns/csvw";

#[derive(Debug, Serialize)]
struct TableGroup {
    #[serde(rename = "@context")]
    context: (&'static str, Language),
    tables: Vec<TableMeta>,
}

#[derive(Debug, Serialize)]
struct Language {
    #[serde(rename = "@language")]
    language: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TableMeta {
    url: String,
    table_schema: SchemaMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemaMeta {
    columns: Vec<ColumnMeta>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    foreign_keys: Vec<ForeignKeyMeta>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ColumnMeta {
    name: String,
    datatype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    property_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForeignKeyMeta {
    column_reference: String,
    reference: ReferenceMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceMeta {
    resource: String,
    column_reference: String,
}

fn table_meta(url: &str, columns: &[ColumnSpec], foreign_keys: &[ForeignKey]) -> TableMeta {
    TableMeta {
        url: url.to_string(),
        table_schema: SchemaMeta {
            columns: columns
                .iter()
                .map(|c| ColumnMeta {
                    name: c.name.to_string(),
                    datatype: c.datatype.to_string(),
                    property_url: c.property_url.clone(),
                })
                .collect(),
            foreign_keys: foreign_keys
                .iter()
                .map(|fk| ForeignKeyMeta {
                    column_reference: fk.column.to_string(),
                    reference: ReferenceMeta {
                        resource: fk.references.to_string(),
                        column_reference: ID_COLUMN.to_string(),
                    },
                })
                .collect(),
        },
    }
}

/// Build the CSVW table group description for a curated dataset
pub fn metadata(registry: &Registry, curated: &Curated) -> Result<serde_json::Value> {
    let mut tables: Vec<TableMeta> = curated
        .tables
        .iter()
        .filter_map(|t| registry.get(&t.name))
        .map(|schema| table_meta(schema.name, &schema.columns, &schema.foreign_keys))
        .collect();

    let hierarchy = &registry.hierarchy;
    tables.push(table_meta(hierarchy.name, &hierarchy.columns(), &hierarchy.foreign_keys()));

    let group = TableGroup {
        context: (CSVW_CONTEXT, Language { language: "en" }),
        tables,
    };
    Ok(serde_json::to_value(group)?)
}

/// Write one table as CSV with columns in schema order
///
/// Absent fields become empty cells.
pub fn write_table(path: &Path, columns: &[&str], table: &Table) -> Result<()> {
    debug!(?path, records = table.len(), "write_table: called");
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;
    for record in &table.records {
        writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the curated dataset to `out_dir`, returning the files written
pub fn write_csvw(registry: &Registry, curated: &Curated, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    for table in &curated.tables {
        let Some(schema) = registry.get(&table.name) else {
            continue;
        };
        let path = out_dir.join(schema.name);
        let columns: Vec<&str> = schema.column_names().collect();
        write_table(&path, &columns, table)?;
        written.push(path);
    }

    let hierarchy = &registry.hierarchy;
    let path = out_dir.join(hierarchy.name);
    let columns: Vec<&str> = hierarchy.columns().iter().map(|c| c.name).collect();
    write_table(&path, &columns, &edges_to_table(hierarchy, &curated.hierarchy))?;
    written.push(path);

    let path = out_dir.join(METADATA_FILE);
    let content = serde_json::to_string_pretty(&metadata(registry, curated)?)?;
    fs::write(&path, content + "\n")?;
    written.push(path);

    info!(?out_dir, files = written.len(), "Wrote CSVW dataset");
    Ok(written)
}
