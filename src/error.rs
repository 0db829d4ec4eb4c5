//! Error types for schema loading and diagram generation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("No schema input provided. Use --sample, --input <path>, or --ddl <path>.")]
    NoSource,

    #[error("Use only one schema source: --sample, --input, or --ddl.")]
    MultipleSources,

    #[error("Provide one schema source: sample, schemaJson, schemaJsons, schemaPaths, ddl, or ddlPaths.")]
    NoToolSource,

    #[error("Use exactly one schema source at a time.")]
    MultipleToolSources,

    #[error("No JSON schema files found in {}", path.display())]
    NoSchemaFiles { path: PathBuf },

    #[error("No DDL files found in {}", path.display())]
    NoDdlFiles { path: PathBuf },

    #[error("No tables found in the provided schema fragments")]
    EmptySchema,

    #[error("No DDL statements found in the provided files")]
    NoStatements,

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid schema JSON in {}: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("DDL parser failed: {detail}")]
    ParserFailed { detail: String },

    #[error("DDL parser returned invalid output: {0}")]
    InvalidParserOutput(#[source] serde_json::Error),

    #[error("DDL parser binary not found: {}", path.display())]
    ParserNotFound { path: PathBuf },

    #[error(
        "The `{tool}` toolchain is required to build the DDL parser. \
         Install it, or set {env} to a prebuilt parser binary."
    )]
    ToolchainMissing { tool: String, env: String },

    #[error("Failed to build the DDL parser: {detail}")]
    ParserBuildFailed { detail: String },

    #[error("Failed to serialize diagram: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
