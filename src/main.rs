//! spannerspy - generate ER diagrams from Cloud Spanner schemas

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use spannerspy::config::{ParserConfig, DEFAULT_PARSER_SRC, PARSER_ENV, PARSER_SRC_ENV};
use spannerspy::ddl::{ParserLocator, ProcessParser};
use spannerspy::diagram::{DiagramModel, SchemaStats};
use spannerspy::loader::{SchemaLoader, SchemaSource};
use spannerspy::mcp::McpServer;
use spannerspy::render::{self, OutputFormat};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Generate ER diagrams from Cloud Spanner schemas
#[derive(Parser, Debug)]
#[command(name = "spannerspy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// JSON schema files or directories (same as --input)
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// JSON schema exported from Cloud Spanner (file or directory, repeatable)
    #[arg(short, long = "input", value_name = "PATH")]
    inputs: Vec<PathBuf>,

    /// Cloud Spanner DDL file or directory (repeatable)
    #[arg(short, long = "ddl", value_name = "PATH")]
    ddl: Vec<PathBuf>,

    /// Use the built-in sample schema
    #[arg(long)]
    sample: bool,

    /// Output format
    #[arg(short, long, value_enum, ignore_case = true, default_value = "mermaid")]
    format: Format,

    /// Write the diagram to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Prebuilt DDL parser binary
    #[arg(long, global = true, value_name = "PATH", env = PARSER_ENV)]
    parser: Option<PathBuf>,

    /// DDL parser sources, built on first use
    #[arg(long, global = true, value_name = "DIR", env = PARSER_SRC_ENV, default_value = DEFAULT_PARSER_SRC)]
    parser_src: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the diagram tool over MCP (JSON-RPC on stdin/stdout)
    Mcp,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    /// Mermaid erDiagram text
    #[value(alias = "mmd")]
    Mermaid,
    /// JSON diagram model
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Mermaid => OutputFormat::Mermaid,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = ParserConfig {
        binary: cli.parser,
        source_dir: cli.parser_src,
    };
    let locator = Arc::new(ParserLocator::new(config));
    let loader = SchemaLoader::new(Arc::new(ProcessParser::new(locator)));

    if let Some(Command::Mcp) = cli.command {
        McpServer::new(loader).serve_stdio().await?;
        return Ok(());
    }

    let mut inputs = cli.inputs;
    inputs.extend(cli.paths);
    let source = SchemaSource::from_selection(cli.sample, inputs, cli.ddl)?;

    let schema = loader.load(&source).await?;
    let stats = SchemaStats::from_schema(&schema);
    log::info!(
        "Schema: {} tables, {} columns, {} relationships, {} interleaves",
        stats.tables,
        stats.columns,
        stats.relationships,
        stats.interleaves
    );

    let model = DiagramModel::from_schema(&schema);
    let output = render::render(&model, cli.format.into())?;

    match cli.output {
        Some(path) => {
            tokio::fs::write(&path, &output)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Diagram written to {}", path.display());
        }
        None => println!("{output}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{e:#}");
        process::exit(1);
    }
}
