//! Serialize a diagram model to Mermaid `erDiagram` text or JSON.

use crate::diagram::DiagramModel;
use crate::error::{Result, SchemaError};
use serde::Deserialize;

/// Relationship arrow between a referencing and a referenced table.
const RELATIONSHIP: &str = "}o--||";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "mmd")]
    Mermaid,
    Json,
}

impl OutputFormat {
    /// Accepts `mermaid`, `mmd` and `json`, case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mermaid" | "mmd" => Some(Self::Mermaid),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render a diagram in the requested format.
pub fn render(model: &DiagramModel, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Mermaid => Ok(render_mermaid(model)),
        OutputFormat::Json => render_json(model),
    }
}

/// Mermaid block notation: two-space node indent, four-space field indent.
pub fn render_mermaid(model: &DiagramModel) -> String {
    let mut lines = vec!["erDiagram".to_string()];

    for node in &model.nodes {
        lines.push(format!("  {} {{", sanitize_id(&node.id)));
        for field in &node.fields {
            lines.push(format!("    {field}"));
        }
        lines.push("  }".to_string());
    }

    for edge in &model.edges {
        let label = match edge.label.as_deref() {
            Some(label) if !label.is_empty() => format!(" : {label}"),
            _ => String::new(),
        };
        lines.push(format!(
            "  {} {RELATIONSHIP} {}{label}",
            sanitize_id(&edge.from),
            sanitize_id(&edge.to)
        ));
    }

    lines.join("\n")
}

/// Pretty JSON with two-space indentation and declaration-order keys.
pub fn render_json(model: &DiagramModel) -> Result<String> {
    serde_json::to_string_pretty(model).map_err(SchemaError::Serialize)
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_id(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
