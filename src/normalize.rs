//! Default filling and name derivation for a single schema fragment.

use crate::schema::{Column, ForeignKey, Schema, Table};

/// Return a copy of `schema` with every optional field defaulted.
///
/// - missing `primaryKey` becomes an empty list
/// - missing `isNullable` becomes `true`, missing `isArray` becomes `false`
/// - an empty foreign-key name becomes `{referencingTable}_{referencedTable}`
///
/// Values present in the input always win. Indexes pass through untouched.
pub fn normalize(schema: &Schema) -> Schema {
    Schema {
        tables: schema.tables.iter().map(normalize_table).collect(),
        foreign_keys: schema
            .foreign_keys
            .as_ref()
            .map(|fks| fks.iter().map(normalize_foreign_key).collect()),
        indexes: schema.indexes.clone(),
    }
}

fn normalize_table(table: &Table) -> Table {
    Table {
        primary_key: Some(table.primary_key.clone().unwrap_or_default()),
        columns: table.columns.iter().map(normalize_column).collect(),
        ..table.clone()
    }
}

fn normalize_column(column: &Column) -> Column {
    Column {
        is_nullable: Some(column.is_nullable.unwrap_or(true)),
        is_array: Some(column.is_array.unwrap_or(false)),
        ..column.clone()
    }
}

fn normalize_foreign_key(fk: &ForeignKey) -> ForeignKey {
    // Collides when a table pair has several unnamed keys; left as-is.
    let name = if fk.name.is_empty() {
        format!("{}_{}", fk.referencing_table, fk.referenced_table)
    } else {
        fk.name.clone()
    };
    ForeignKey { name, ..fk.clone() }
}
