//! Resolve a schema source (sample, JSON fragments, DDL files) into a [`Schema`].

use crate::ddl::{order_statements, DdlParser};
use crate::error::{Result, SchemaError};
use crate::merge::merge;
use crate::normalize::normalize;
use crate::sample::sample_schema;
use crate::schema::Schema;
use futures::future::try_join_all;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What kind of files a directory walk keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    SchemaJson,
    Ddl,
}

impl FileKind {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::SchemaJson => &["json"],
            Self::Ddl => &["sql", "ddl"],
        }
    }

    pub fn matches(self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions().iter().any(|x| e.eq_ignore_ascii_case(x)))
    }

    fn nothing_found(self, dir: &Path) -> SchemaError {
        let path = dir.to_path_buf();
        match self {
            Self::SchemaJson => SchemaError::NoSchemaFiles { path },
            Self::Ddl => SchemaError::NoDdlFiles { path },
        }
    }
}

/// One selected schema source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    Sample,
    Json(Vec<PathBuf>),
    Ddl(Vec<PathBuf>),
}

impl SchemaSource {
    /// Validate that exactly one kind of source was selected.
    pub fn from_selection(sample: bool, inputs: Vec<PathBuf>, ddl: Vec<PathBuf>) -> Result<Self> {
        let chosen = usize::from(sample) + usize::from(!inputs.is_empty()) + usize::from(!ddl.is_empty());
        match chosen {
            0 => Err(SchemaError::NoSource),
            1 if sample => Ok(Self::Sample),
            1 if !inputs.is_empty() => Ok(Self::Json(inputs)),
            1 => Ok(Self::Ddl(ddl)),
            _ => Err(SchemaError::MultipleSources),
        }
    }
}

/// Expand files and directories into an ordered file list.
///
/// Paths are processed in the given order. Explicit files are kept whatever
/// their extension; directories are walked recursively, following symlinks,
/// and contribute their matching files sorted by full path.
pub async fn collect_files(paths: &[PathBuf], kind: FileKind) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SchemaError::InputNotFound { path: path.clone() });
            }
            Err(e) => return Err(SchemaError::io(path, e)),
        };

        if metadata.is_dir() {
            let mut found = walk_dir(path, kind).await?;
            if found.is_empty() {
                return Err(kind.nothing_found(path));
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    log::debug!("Collected {} {:?} file(s)", files.len(), kind);
    Ok(files)
}

async fn walk_dir(root: &Path, kind: FileKind) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| SchemaError::io(&dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SchemaError::io(&dir, e))?
        {
            let path = entry.path();
            // `metadata` resolves symlinks to their target kind.
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if metadata.is_dir() {
                pending.push(path);
            } else if metadata.is_file() && kind.matches(&path) {
                found.push(path);
            }
        }
    }
    Ok(found)
}

/// Read every file concurrently, keeping input order.
pub async fn read_all(files: &[PathBuf]) -> Result<Vec<(PathBuf, String)>> {
    try_join_all(files.iter().map(|path| async move {
        tokio::fs::read_to_string(path)
            .await
            .map(|content| (path.clone(), content))
            .map_err(|e| SchemaError::io(path, e))
    }))
    .await
}

/// Parse one JSON schema payload and normalize it.
pub fn load_json_str(json: &str) -> Result<Schema> {
    let schema = parse_fragment(Path::new("<inline>"), json)?;
    Ok(normalize(&schema))
}

/// Parse several JSON payloads and merge them in order.
pub fn load_json_strings<S: AsRef<str>>(payloads: &[S]) -> Result<Schema> {
    let fragments = payloads
        .iter()
        .enumerate()
        .map(|(i, json)| parse_fragment(Path::new(&format!("<inline #{}>", i + 1)), json.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    merge(fragments)
}

fn parse_fragment(path: &Path, json: &str) -> Result<Schema> {
    serde_json::from_str(json).map_err(|source| SchemaError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads schemas from any [`SchemaSource`], delegating DDL to a [`DdlParser`].
pub struct SchemaLoader {
    parser: Arc<dyn DdlParser>,
}

impl SchemaLoader {
    pub fn new(parser: Arc<dyn DdlParser>) -> Self {
        Self { parser }
    }

    pub async fn load(&self, source: &SchemaSource) -> Result<Schema> {
        match source {
            SchemaSource::Sample => Ok(normalize(&sample_schema())),
            SchemaSource::Json(paths) => self.load_json_paths(paths).await,
            SchemaSource::Ddl(paths) => self.load_ddl_paths(paths).await,
        }
    }

    pub async fn load_json_paths(&self, paths: &[PathBuf]) -> Result<Schema> {
        let files = collect_files(paths, FileKind::SchemaJson).await?;
        let fragments = read_all(&files)
            .await?
            .iter()
            .map(|(path, content)| parse_fragment(path, content))
            .collect::<Result<Vec<_>>>()?;
        merge(fragments)
    }

    pub async fn load_ddl_paths(&self, paths: &[PathBuf]) -> Result<Schema> {
        let files = collect_files(paths, FileKind::Ddl).await?;
        let contents = read_all(&files).await?;
        let script = order_statements(&contents)?;
        self.parse_script(&script).await
    }

    /// Order and parse DDL held in memory.
    pub async fn load_ddl_str(&self, ddl: &str) -> Result<Schema> {
        let script = order_statements(&[("<inline>", ddl)])?;
        self.parse_script(&script).await
    }

    async fn parse_script(&self, script: &str) -> Result<Schema> {
        let mut file = tempfile::Builder::new()
            .prefix("spannerspy-")
            .suffix(".sql")
            .tempfile()
            .map_err(|e| SchemaError::io(std::env::temp_dir(), e))?;
        let path = file.path().to_path_buf();
        file.write_all(script.as_bytes())
            .map_err(|e| SchemaError::io(&path, e))?;
        file.flush().map_err(|e| SchemaError::io(&path, e))?;
        log::debug!("Wrote ordered DDL to {}", path.display());

        // The temp file must outlive the parser run.
        let schema = self.parser.parse(file.path()).await?;
        Ok(normalize(&schema))
    }
}
