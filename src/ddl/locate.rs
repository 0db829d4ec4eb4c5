//! Resolve the DDL parser binary, building it at most once.

use crate::config::{ParserConfig, PARSER_ENV};
use crate::error::{Result, SchemaError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::OnceCell;

/// Produces a parser binary from sources.
#[async_trait]
pub trait ParserBuilder: Send + Sync {
    /// `output` is always absolute.
    async fn build(&self, source_dir: &Path, output: &Path) -> Result<()>;
}

/// Builds the parser with `go build`.
#[derive(Debug, Clone)]
pub struct GoBuilder {
    program: PathBuf,
}

impl GoBuilder {
    /// Use a specific `go` executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GoBuilder {
    fn default() -> Self {
        Self::with_program("go")
    }
}

#[async_trait]
impl ParserBuilder for GoBuilder {
    async fn build(&self, source_dir: &Path, output: &Path) -> Result<()> {
        let toolchain_missing = || SchemaError::ToolchainMissing {
            tool: "go".to_string(),
            env: PARSER_ENV.to_string(),
        };

        match Command::new(&self.program).arg("version").output().await {
            Ok(out) if out.status.success() => {}
            Ok(_) => return Err(toolchain_missing()),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(toolchain_missing()),
            Err(e) => return Err(SchemaError::io("go", e)),
        }

        if !source_dir.is_dir() {
            return Err(SchemaError::ParserBuildFailed {
                detail: format!("parser sources not found at {}", source_dir.display()),
            });
        }

        log::info!("Building DDL parser in {}", source_dir.display());
        let out = Command::new(&self.program)
            .arg("build")
            .arg("-o")
            .arg(output)
            .arg(".")
            .current_dir(source_dir)
            .output()
            .await
            .map_err(|e| SchemaError::io(source_dir, e))?;

        if !out.status.success() {
            return Err(SchemaError::ParserBuildFailed {
                detail: super::parser::diagnostic(&out.stdout, &out.stderr),
            });
        }
        Ok(())
    }
}

/// Finds the parser binary for a [`ParserConfig`].
///
/// The first call to [`ParserLocator::resolve`] decides the path; concurrent
/// callers wait on the same initialization and later calls reuse its result.
/// A failed resolution is not cached.
pub struct ParserLocator {
    config: ParserConfig,
    builder: Arc<dyn ParserBuilder>,
    resolved: OnceCell<PathBuf>,
}

impl ParserLocator {
    pub fn new(config: ParserConfig) -> Self {
        Self::with_builder(config, Arc::new(GoBuilder::default()))
    }

    pub fn with_builder(config: ParserConfig, builder: Arc<dyn ParserBuilder>) -> Self {
        Self {
            config,
            builder,
            resolved: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub async fn resolve(&self) -> Result<PathBuf> {
        self.resolved
            .get_or_try_init(|| self.locate())
            .await
            .cloned()
    }

    async fn locate(&self) -> Result<PathBuf> {
        if let Some(binary) = &self.config.binary {
            if !tokio::fs::try_exists(binary).await.unwrap_or(false) {
                return Err(SchemaError::ParserNotFound {
                    path: binary.clone(),
                });
            }
            return Ok(binary.clone());
        }

        // `go build` runs inside the source directory, so a relative output
        // path would land below it a second time.
        let built = self.config.built_binary();
        let built = std::path::absolute(&built).map_err(|e| SchemaError::io(&built, e))?;
        if tokio::fs::try_exists(&built).await.unwrap_or(false) {
            log::debug!("Using DDL parser at {}", built.display());
            return Ok(built);
        }

        if let Some(parent) = built.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SchemaError::io(parent, e))?;
        }
        self.builder.build(&self.config.source_dir, &built).await?;
        Ok(built)
    }
}
