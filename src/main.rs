use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use relnest::compile_read;
use relnest::config::{CliConfig, CompilerConfig};
use relnest::entity_catalog::{load_catalog_from_yaml_file, EntityCatalog};
use relnest::result_denormalizer::denormalize;
use relnest::selection::{ReadRequest, SelectionTree};
use serde_json::Value;

/// relnest - compile nested reads into one joined SQL statement and rebuild
/// nested results from its rows
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Compiler configuration file (YAML); environment variables are used otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Separator between table alias and field in column names
    #[arg(long, global = true)]
    alias_separator: Option<String>,

    /// Table alias of the root entity
    #[arg(long, global = true)]
    base_alias: Option<String>,

    /// Limit applied when a request sets none
    #[arg(long, global = true)]
    default_limit: Option<u64>,

    /// Upper bound for any requested limit
    #[arg(long, global = true)]
    max_limit: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an entity catalog
    Check {
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Print the SQL and bindings for a read request
    Compile {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        request: PathBuf,
    },
    /// Rebuild the nested result of a read request from flat rows
    Denormalize {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        request: PathBuf,
        /// JSON array of row objects
        #[arg(long)]
        rows: PathBuf,
    },
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        CliConfig {
            alias_separator: cli.alias_separator.clone(),
            base_alias: cli.base_alias.clone(),
            default_limit: cli.default_limit,
            max_limit: cli.max_limit,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logger - defaults to WARN so stdout stays machine-readable
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env file loaded: {}", e);
    }

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Check { catalog } => {
            let catalog = load_catalog(catalog)?;
            println!(
                "✓ {} entities: {}",
                catalog.len(),
                catalog.entity_names().join(", ")
            );
        }
        Command::Compile { catalog, request } => {
            let catalog = load_catalog(catalog)?;
            let request: ReadRequest = read_json(request)?;
            let tree = SelectionTree::from_request(&catalog, &request)?;
            let compiled = compile_read(&catalog, &config, &tree)?;
            println!("{}", serde_json::to_string_pretty(&compiled.statement.render())?);
        }
        Command::Denormalize {
            catalog,
            request,
            rows,
        } => {
            let catalog = load_catalog(catalog)?;
            let request: ReadRequest = read_json(request)?;
            let rows: Value = read_json(rows)?;
            let Value::Array(rows) = rows else {
                bail!("rows file must contain a JSON array");
            };
            let tree = SelectionTree::from_request(&catalog, &request)?;
            let compiled = compile_read(&catalog, &config, &tree)?;
            let result = denormalize(&rows, &tree, &compiled.layout)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<CompilerConfig> {
    let base = match &cli.config {
        Some(path) => CompilerConfig::from_yaml_file(path)
            .with_context(|| format!("loading compiler config {}", path.display()))?,
        None => CompilerConfig::from_env().context("reading compiler config from environment")?,
    };
    Ok(base.merge_cli(cli.into())?)
}

fn load_catalog(path: &Path) -> Result<EntityCatalog> {
    load_catalog_from_yaml_file(path)
        .with_context(|| format!("loading entity catalog {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
