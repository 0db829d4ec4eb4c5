//! Combine per-file schema fragments into one schema.

use crate::error::{Result, SchemaError};
use crate::normalize::normalize;
use crate::schema::Schema;

/// Concatenate fragments in the given order and normalize the union.
///
/// Tables, foreign keys and indexes are appended fragment by fragment with no
/// deduplication. Foreign keys and indexes are omitted from the result when
/// no fragment contributes any. Fails if no fragment contributes a table.
pub fn merge<I>(fragments: I) -> Result<Schema>
where
    I: IntoIterator<Item = Schema>,
{
    let mut tables = Vec::new();
    let mut foreign_keys = Vec::new();
    let mut indexes = Vec::new();

    for fragment in fragments {
        tables.extend(fragment.tables);
        foreign_keys.extend(fragment.foreign_keys.unwrap_or_default());
        indexes.extend(fragment.indexes.unwrap_or_default());
    }

    if tables.is_empty() {
        return Err(SchemaError::EmptySchema);
    }

    let combined = Schema {
        tables,
        foreign_keys: Some(foreign_keys).filter(|fks| !fks.is_empty()),
        indexes: Some(indexes).filter(|idx| !idx.is_empty()),
    };

    Ok(normalize(&combined))
}
