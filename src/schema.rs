use serde::{Deserialize, Serialize};

/// A relational schema: tables plus optional foreign keys and indexes.
///
/// Optional fields stay `None` until [`crate::normalize::normalize`] fills
/// in defaults, so a fragment read from disk round-trips without gaining keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub tables: Vec<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_keys: Option<Vec<ForeignKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<Index>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<String>>,
    /// Parent table for interleaved storage. Not a foreign key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interleaved_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_deletion_policy: Option<RowDeletionPolicy>,
}

impl Table {
    pub fn primary_key(&self) -> &[String] {
        self.primary_key.as_deref().unwrap_or_default()
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key().iter().any(|pk| pk == column)
    }

    /// Parent table name, treating an empty string as absent.
    pub fn parent(&self) -> Option<&str> {
        self.interleaved_in.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    /// Scalar type as written in the source, e.g. `STRING(MAX)`.
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_array: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    pub fn nullable(&self) -> bool {
        self.is_nullable != Some(false)
    }

    pub fn array(&self) -> bool {
        self.is_array == Some(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    #[serde(default)]
    pub name: String,
    pub referencing_table: String,
    #[serde(default)]
    pub referencing_columns: Vec<String>,
    pub referenced_table: String,
    #[serde(default)]
    pub referenced_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDeletionPolicy {
    pub column_name: String,
    pub num_days: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub columns: Vec<IndexKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storing: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interleaved_in: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_unique: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_null_filtered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexKey {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}
