pub mod config;
pub mod ddl;
pub mod diagram;
pub mod error;
#[cfg(not(target_arch = "wasm32"))]
pub mod loader;
#[cfg(not(target_arch = "wasm32"))]
pub mod mcp;
pub mod merge;
pub mod normalize;
pub mod render;
pub mod sample;
pub mod schema;

use wasm_bindgen::prelude::*;

use diagram::{DiagramModel, SchemaStats};
use normalize::normalize;
use render::OutputFormat;
use schema::Schema;

pub use error::{Result, SchemaError};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn parse_schema(schema_json: &str) -> std::result::Result<Schema, String> {
    serde_json::from_str::<Schema>(schema_json)
        .map(|schema| normalize(&schema))
        .map_err(|e| format!("Invalid schema JSON: {e}"))
}

/// Render schema JSON to a Mermaid diagram or a JSON diagram model
#[wasm_bindgen(js_name = "schemaToDiagram")]
pub fn schema_to_diagram(schema_json: &str, format: Option<String>) -> std::result::Result<String, String> {
    let format = match format.as_deref() {
        None => OutputFormat::default(),
        Some(name) => OutputFormat::from_str(name).ok_or_else(|| format!("Unsupported format: {name}"))?,
    };

    let schema = parse_schema(schema_json)?;
    let model = DiagramModel::from_schema(&schema);
    render::render(&model, format).map_err(|e| e.to_string())
}

/// Table, column, relationship and interleave counts as JSON
#[wasm_bindgen(js_name = "schemaStats")]
pub fn schema_stats(schema_json: &str) -> std::result::Result<String, String> {
    let schema = parse_schema(schema_json)?;
    serde_json::to_string(&SchemaStats::from_schema(&schema)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "tables": [
            { "name": "Users", "columns": [{ "name": "Id", "type": "INT64", "isNullable": false }], "primaryKey": ["Id"] }
        ]
    }"#;

    #[test]
    fn test_schema_to_diagram_default_mermaid() {
        let out = schema_to_diagram(SCHEMA, None).unwrap();
        assert_eq!(out, "erDiagram\n  Users {\n    *Id: INT64!\n  }");
    }

    #[test]
    fn test_schema_to_diagram_json() {
        let out = schema_to_diagram(SCHEMA, Some("json".to_string())).unwrap();
        let model: DiagramModel = serde_json::from_str(&out).unwrap();
        assert_eq!(model.nodes[0].fields, vec!["*Id: INT64!"]);
    }

    #[test]
    fn test_schema_to_diagram_errors() {
        assert!(schema_to_diagram(SCHEMA, Some("dot".to_string())).unwrap_err().contains("Unsupported format"));
        assert!(schema_to_diagram("[]", None).unwrap_err().contains("Invalid schema JSON"));
    }

    #[test]
    fn test_schema_stats() {
        let out = schema_stats(SCHEMA).unwrap();
        assert_eq!(out, r#"{"tables":1,"columns":1,"relationships":0,"interleaves":0}"#);
    }
}
