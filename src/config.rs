//! Location of the external DDL parser.

use std::path::PathBuf;

/// Environment variable naming a prebuilt DDL parser binary.
pub const PARSER_ENV: &str = "SPANNERSPY_DDL_PARSER";

/// Environment variable naming the parser source directory.
pub const PARSER_SRC_ENV: &str = "SPANNERSPY_DDL_PARSER_SRC";

pub const DEFAULT_PARSER_SRC: &str = "tools/ddlparser";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Prebuilt binary. Skips the lazy build entirely.
    pub binary: Option<PathBuf>,
    /// Sources for `go build`.
    pub source_dir: PathBuf,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            binary: None,
            source_dir: PathBuf::from(DEFAULT_PARSER_SRC),
        }
    }
}

impl ParserConfig {
    /// Where the lazily built binary is written.
    pub fn built_binary(&self) -> PathBuf {
        let name = if cfg!(windows) { "ddlparser.exe" } else { "ddlparser" };
        self.source_dir.join("bin").join(name)
    }
}
