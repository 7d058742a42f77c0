//! gc - Grammaticon curation CLI
//!
//! Reads the raw CSV export, runs the curation pipeline and writes a CSVW
//! dataset. Diagnostics for dropped records go to stderr, one per line.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use grammaticon::cli::{Cli, Command, SchemaFormat};
use grammaticon::config::Config;
use grammaticon::{Curated, Pipeline, RawDataset, Registry, write_csvw};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!(?level, "Logging initialized");
    Ok(())
}

fn print_diagnostics(curated: &Curated) {
    for diagnostic in &curated.diagnostics {
        eprintln!("{}", diagnostic);
    }
}

fn print_summary(curated: &Curated) {
    for table in &curated.tables {
        println!(
            "  {:<28} {:>6} records {}",
            table.name.cyan(),
            table.len(),
            format!("({} dropped)", curated.diagnostics.count_for(&table.name)).dimmed()
        );
    }
    println!("  {:<28} {:>6} edges", "concept-hierarchy.csv".cyan(), curated.hierarchy.len());
}

fn run_pipeline(config: &Config, raw_dir: &std::path::Path) -> Result<(Registry, Curated)> {
    let registry = Registry::grammaticon();
    let raw = RawDataset::read_dir(raw_dir, &registry)
        .context(format!("Failed to read raw export from {}", raw_dir.display()))?;

    let pipeline = Pipeline::new(registry).with_options(config.pipeline_options());
    let curated = pipeline.run(&raw).context("Curation aborted")?;
    print_diagnostics(&curated);
    Ok((pipeline.registry().clone(), curated))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("gc starting");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Curate {
            raw_dir,
            output_dir,
            lenient_ids,
        } => {
            if let Some(dir) = raw_dir {
                config.raw_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            config.strict_ids &= !lenient_ids;

            let (registry, curated) = run_pipeline(&config, &config.raw_dir)?;
            let written = write_csvw(&registry, &curated, &config.output_dir)
                .context(format!("Failed to write CSVW to {}", config.output_dir.display()))?;

            print_summary(&curated);
            println!(
                "{} Wrote {} files to {} ({} records dropped)",
                "✓".green(),
                written.len(),
                config.output_dir.display().to_string().cyan(),
                curated.diagnostics.len()
            );
        }
        Command::Check { raw_dir, lenient_ids } => {
            if let Some(dir) = raw_dir {
                config.raw_dir = dir;
            }
            config.strict_ids &= !lenient_ids;

            let (_, curated) = run_pipeline(&config, &config.raw_dir)?;
            print_summary(&curated);
            if !curated.diagnostics.is_empty() {
                return Err(eyre::eyre!("{} records would be dropped", curated.diagnostics.len()));
            }
            println!("{} No data-quality issues", "✓".green());
        }
        Command::Schema { format } => {
            let registry = Registry::grammaticon();
            let out = match format {
                SchemaFormat::Yaml => serde_yaml::to_string(&registry)?,
                SchemaFormat::Json => serde_json::to_string_pretty(&registry)? + "\n",
            };
            print!("{}", out);
        }
    }

    Ok(())
}
