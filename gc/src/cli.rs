//! CLI argument parsing for gc

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gc")]
#[command(author, version, about = "Curate the Grammaticon spreadsheet export into CSVW", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the raw export and write the CSVW dataset
    Curate {
        /// Directory holding the raw CSV export
        #[arg(short, long)]
        raw_dir: Option<PathBuf>,

        /// Directory to write the CSVW dataset to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Drop duplicate IDs with a diagnostic instead of aborting
        #[arg(long)]
        lenient_ids: bool,
    },

    /// Validate the raw export without writing anything
    Check {
        /// Directory holding the raw CSV export
        #[arg(short, long)]
        raw_dir: Option<PathBuf>,

        /// Drop duplicate IDs with a diagnostic instead of aborting
        #[arg(long)]
        lenient_ids: bool,
    },

    /// Print the schema registry
    Schema {
        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: SchemaFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaFormat {
    Yaml,
    Json,
}
