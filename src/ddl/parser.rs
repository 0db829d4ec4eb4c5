//! The external DDL-to-schema parser.

use super::locate::ParserLocator;
use crate::error::{Result, SchemaError};
use crate::schema::Schema;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;

/// Turns a DDL script on disk into a [`Schema`].
#[async_trait]
pub trait DdlParser: Send + Sync {
    async fn parse(&self, path: &Path) -> Result<Schema>;
}

/// Runs the parser binary as `<binary> -input <path>` and reads JSON from stdout.
pub struct ProcessParser {
    locator: Arc<ParserLocator>,
}

impl ProcessParser {
    pub fn new(locator: Arc<ParserLocator>) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl DdlParser for ProcessParser {
    async fn parse(&self, path: &Path) -> Result<Schema> {
        let binary = self.locator.resolve().await?;
        log::debug!("Running {} -input {}", binary.display(), path.display());

        // `output` waits for exit and drains both pipes.
        let out = Command::new(&binary)
            .arg("-input")
            .arg(path)
            .output()
            .await
            .map_err(|e| SchemaError::io(&binary, e))?;

        if !out.status.success() {
            return Err(SchemaError::ParserFailed {
                detail: diagnostic(&out.stdout, &out.stderr),
            });
        }

        serde_json::from_slice(&out.stdout).map_err(SchemaError::InvalidParserOutput)
    }
}

/// Prefer stderr; fall back to stdout when stderr is empty.
pub(crate) fn diagnostic(stdout: &[u8], stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::from_utf8_lossy(stdout).trim().to_string()
    } else {
        stderr.to_string()
    }
}
