use crate::schema::{Column, Schema, Table};
use serde::{Deserialize, Serialize};

pub const INTERLEAVED_LABEL: &str = "INTERLEAVED IN";

/// Renderer-agnostic node/edge graph derived from a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DiagramModel {
    /// Build the diagram for an already normalized schema.
    ///
    /// Foreign-key edges come first, in foreign-key order, followed by one
    /// `INTERLEAVED IN` edge per child table in table order. Edge endpoints
    /// are not checked against the node set.
    pub fn from_schema(schema: &Schema) -> Self {
        let nodes = schema
            .tables
            .iter()
            .map(|table| Node {
                id: table.name.clone(),
                label: table.name.clone(),
                fields: table
                    .columns
                    .iter()
                    .map(|column| format_field(table, column))
                    .collect(),
            })
            .collect();

        let foreign_key_edges = schema.foreign_keys.iter().flatten().map(|fk| Edge {
            from: fk.referencing_table.clone(),
            to: fk.referenced_table.clone(),
            label: Some(fk.name.clone()).filter(|name| !name.is_empty()),
        });

        let interleave_edges = schema.tables.iter().filter_map(|table| {
            table.parent().map(|parent| Edge {
                from: table.name.clone(),
                to: parent.to_string(),
                label: Some(INTERLEAVED_LABEL.to_string()),
            })
        });

        DiagramModel {
            nodes,
            edges: foreign_key_edges.chain(interleave_edges).collect(),
        }
    }
}

/// `{*}{name}: {type}{[]}{?|!}`.
///
/// The nullability suffix is independent of primary-key membership.
pub fn format_field(table: &Table, column: &Column) -> String {
    let pk = if table.is_primary_key(&column.name) { "*" } else { "" };
    let array = if column.array() { "[]" } else { "" };
    let null = if column.nullable() { "?" } else { "!" };
    format!("{pk}{}: {}{array}{null}", column.name, column.typ)
}

pub fn build_diagram(schema: &Schema) -> DiagramModel {
    DiagramModel::from_schema(schema)
}

/// Headline counts shown alongside a diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaStats {
    pub tables: usize,
    pub columns: usize,
    pub relationships: usize,
    pub interleaves: usize,
}

impl SchemaStats {
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            tables: schema.tables.len(),
            columns: schema.tables.iter().map(|t| t.columns.len()).sum(),
            relationships: schema.foreign_keys.as_ref().map_or(0, Vec::len),
            interleaves: schema.tables.iter().filter(|t| t.parent().is_some()).count(),
        }
    }
}
