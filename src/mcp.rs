//! Model Context Protocol server for diagram rendering.
//!
//! Speaks newline-delimited JSON-RPC 2.0 over stdio: one message per line in,
//! one response per line out. Notifications (messages without an `id`) get no
//! response. The single tool, [`TOOL_NAME`], renders a diagram from exactly
//! one schema source.

use crate::diagram::DiagramModel;
use crate::error::{Result, SchemaError};
use crate::loader::{load_json_str, load_json_strings, SchemaLoader, SchemaSource};
use crate::render::{self, OutputFormat};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub const TOOL_NAME: &str = "spannerspy.renderDiagram";

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Arguments of a render tool call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default)]
    pub format: OutputFormat,
    pub sample: Option<bool>,
    pub schema_json: Option<String>,
    pub schema_jsons: Option<Vec<String>>,
    pub schema_paths: Option<Vec<String>>,
    pub ddl: Option<String>,
    pub ddl_paths: Option<Vec<String>>,
}

/// The one schema source a request names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSource<'a> {
    Sample,
    SchemaJson(&'a str),
    SchemaJsons(&'a [String]),
    SchemaPaths(&'a [String]),
    Ddl(&'a str),
    DdlPaths(&'a [String]),
}

impl RenderRequest {
    /// Pick the source, failing unless exactly one is set.
    ///
    /// Empty strings and empty lists count as unset.
    pub fn source(&self) -> Result<RequestSource<'_>> {
        let mut sources = Vec::new();
        if self.sample == Some(true) {
            sources.push(RequestSource::Sample);
        }
        if let Some(json) = text(&self.schema_json) {
            sources.push(RequestSource::SchemaJson(json));
        }
        if let Some(jsons) = list(&self.schema_jsons) {
            sources.push(RequestSource::SchemaJsons(jsons));
        }
        if let Some(paths) = list(&self.schema_paths) {
            sources.push(RequestSource::SchemaPaths(paths));
        }
        if let Some(ddl) = text(&self.ddl) {
            sources.push(RequestSource::Ddl(ddl));
        }
        if let Some(paths) = list(&self.ddl_paths) {
            sources.push(RequestSource::DdlPaths(paths));
        }

        match sources.len() {
            0 => Err(SchemaError::NoToolSource),
            1 => Ok(sources.remove(0)),
            _ => Err(SchemaError::MultipleToolSources),
        }
    }
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn list(value: &Option<Vec<String>>) -> Option<&[String]> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn to_paths(paths: &[String]) -> Vec<PathBuf> {
    paths.iter().map(PathBuf::from).collect()
}

/// Load the requested schema and render it.
pub async fn render_diagram(loader: &SchemaLoader, request: &RenderRequest) -> Result<String> {
    let schema = match request.source()? {
        RequestSource::Sample => loader.load(&SchemaSource::Sample).await?,
        RequestSource::SchemaJson(json) => load_json_str(json)?,
        RequestSource::SchemaJsons(jsons) => load_json_strings(jsons)?,
        RequestSource::SchemaPaths(paths) => loader.load_json_paths(&to_paths(paths)).await?,
        RequestSource::Ddl(ddl) => loader.load_ddl_str(ddl).await?,
        RequestSource::DdlPaths(paths) => loader.load_ddl_paths(&to_paths(paths)).await?,
    };
    let model = DiagramModel::from_schema(&schema);
    render::render(&model, request.format)
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn error_response(id: Value, error: RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": error.code, "message": error.message }
    })
}

fn tool_descriptor() -> Value {
    let strings = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "name": TOOL_NAME,
        "title": "Generate ER diagram",
        "description": "Convert Cloud Spanner schemas (JSON or DDL) into Mermaid ER diagrams or JSON diagram models.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "format": { "type": "string", "enum": ["mermaid", "json"], "default": "mermaid" },
                "sample": { "type": "boolean" },
                "schemaJson": { "type": "string" },
                "schemaJsons": strings.clone(),
                "schemaPaths": strings.clone(),
                "ddl": { "type": "string" },
                "ddlPaths": strings
            }
        }
    })
}

/// JSON-RPC front end over a [`SchemaLoader`].
pub struct McpServer {
    loader: SchemaLoader,
}

impl McpServer {
    pub fn new(loader: SchemaLoader) -> Self {
        Self { loader }
    }

    /// Answer one line of input. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => return Some(error_response(Value::Null, RpcError::new(PARSE_ERROR, e.to_string()))),
        };
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let message: Message = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => return Some(error_response(id, RpcError::new(INVALID_REQUEST, e.to_string()))),
        };

        let Some(id) = message.id else {
            log::debug!("Notification {}", message.method);
            return None;
        };

        let response = match self.dispatch(&message.method, message.params).await {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(error) => error_response(id, error),
        };
        Some(response)
    }

    async fn dispatch(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": [tool_descriptor()] })),
            "tools/call" => self.call_tool(params).await,
            other => Err(RpcError::new(METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        }
    }

    async fn call_tool(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let call: ToolCall =
            serde_json::from_value(params).map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string()))?;
        if call.name != TOOL_NAME {
            return Err(RpcError::new(INVALID_PARAMS, format!("Unknown tool: {}", call.name)));
        }
        let request: RenderRequest = if call.arguments.is_null() {
            RenderRequest::default()
        } else {
            serde_json::from_value(call.arguments).map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string()))?
        };

        // Tool failures are reported to the client as tool output, not protocol errors.
        let result = match render_diagram(&self.loader, &request).await {
            Ok(text) => json!({ "content": [{ "type": "text", "text": text }] }),
            Err(e) => {
                log::warn!("{TOOL_NAME} failed: {e}");
                json!({ "content": [{ "type": "text", "text": e.to_string() }], "isError": true })
            }
        };
        Ok(result)
    }

    /// Serve until `reader` reaches end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| SchemaError::io("<stdin>", e))?
        {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut out = response.to_string();
                out.push('\n');
                writer
                    .write_all(out.as_bytes())
                    .await
                    .map_err(|e| SchemaError::io("<stdout>", e))?;
                writer.flush().await.map_err(|e| SchemaError::io("<stdout>", e))?;
            }
        }
        Ok(())
    }

    pub async fn serve_stdio(&self) -> Result<()> {
        log::info!("MCP server listening on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

fn initialize(params: &Value) -> Value {
    let version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);
    json!({
        "protocolVersion": version,
        "capabilities": { "tools": {} },
        "serverInfo": { "name": "spannerspy", "version": env!("CARGO_PKG_VERSION") }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::DdlParser;
    use crate::schema::{Schema, Table};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Arc;

    struct StaticParser;

    #[async_trait]
    impl DdlParser for StaticParser {
        async fn parse(&self, _path: &Path) -> Result<Schema> {
            Ok(Schema {
                tables: vec![Table {
                    name: "FromDdl".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            })
        }
    }

    fn server() -> McpServer {
        McpServer::new(SchemaLoader::new(Arc::new(StaticParser)))
    }

    fn request(args: Value) -> RenderRequest {
        serde_json::from_value(args).unwrap()
    }

    fn call(args: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": { "name": TOOL_NAME, "arguments": args }
        })
        .to_string()
    }

    #[test]
    fn test_exactly_one_source() {
        assert_eq!(request(json!({ "sample": true })).source().unwrap(), RequestSource::Sample);
        assert_eq!(
            request(json!({ "ddl": "CREATE TABLE T" })).source().unwrap(),
            RequestSource::Ddl("CREATE TABLE T")
        );
        assert!(matches!(request(json!({})).source(), Err(SchemaError::NoToolSource)));
        assert!(matches!(
            request(json!({ "sample": true, "ddlPaths": ["a.sql"] })).source(),
            Err(SchemaError::MultipleToolSources)
        ));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let req = request(json!({ "sample": false, "schemaJson": "", "schemaJsons": [], "ddlPaths": ["x.sql"] }));
        assert!(matches!(req.source().unwrap(), RequestSource::DdlPaths(paths) if paths == ["x.sql"]));
    }

    #[test]
    fn test_format_defaults_to_mermaid() {
        assert_eq!(request(json!({})).format, OutputFormat::Mermaid);
        assert_eq!(request(json!({ "format": "json" })).format, OutputFormat::Json);
    }

    #[tokio::test]
    async fn test_render_sample_and_strings() {
        let loader = SchemaLoader::new(Arc::new(StaticParser));

        let mermaid = render_diagram(&loader, &request(json!({ "sample": true }))).await.unwrap();
        assert!(mermaid.starts_with("erDiagram\n  Singers {"));

        let json_text = render_diagram(
            &loader,
            &request(json!({
                "format": "json",
                "schemaJsons": [
                    r#"{"tables":[{"name":"A","columns":[]}]}"#,
                    r#"{"tables":[{"name":"B","columns":[]}]}"#
                ]
            })),
        )
        .await
        .unwrap();
        let model: DiagramModel = serde_json::from_str(&json_text).unwrap();
        let ids: Vec<_> = model.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);

        let ddl = render_diagram(&loader, &request(json!({ "ddl": "CREATE TABLE FromDdl (A INT64) PRIMARY KEY (A)" })))
            .await
            .unwrap();
        assert_eq!(ddl, "erDiagram\n  FromDdl {\n  }");
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let server = server();
        let init = server
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#)
            .await
            .unwrap();
        assert_eq!(init["id"], 1);
        assert_eq!(init["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(init["result"]["serverInfo"]["name"], "spannerspy");

        let list = server
            .handle_line(r#"{"jsonrpc":"2.0","id":"l","method":"tools/list"}"#)
            .await
            .unwrap();
        assert_eq!(list["id"], "l");
        assert_eq!(list["result"]["tools"][0]["name"], TOOL_NAME);
        assert!(list["result"]["tools"][0]["inputSchema"]["properties"]["ddlPaths"].is_object());
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let server = server();
        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();

        let parse = server.handle_line("{not json").await.unwrap();
        assert_eq!(parse["error"]["code"], PARSE_ERROR);
        assert!(parse["id"].is_null());

        let unknown = server
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let tool = server
            .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"other"}}"#)
            .await
            .unwrap();
        assert_eq!(tool["error"]["code"], INVALID_PARAMS);

        let bad_format = server.handle_line(&call(json!({ "sample": true, "format": "svg" }))).await.unwrap();
        assert_eq!(bad_format["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_failure_is_tool_output() {
        let server = server();

        let none = server.handle_line(&call(json!({}))).await.unwrap();
        assert_eq!(none["id"], 7);
        assert_eq!(none["result"]["isError"], true);
        assert!(none["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Provide one schema source"));

        let many = server
            .handle_line(&call(json!({ "sample": true, "schemaJson": "{}" })))
            .await
            .unwrap();
        assert_eq!(
            many["result"]["content"][0]["text"],
            "Use exactly one schema source at a time."
        );
    }

    #[tokio::test]
    async fn test_serve_lines() {
        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            call(json!({ "sample": true })).as_str(),
        ]
        .join("\n");
        let mut output = Vec::new();
        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"], json!({}));
        assert_eq!(responses[1]["id"], 7);
        assert!(responses[1]["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("erDiagram\n  Singers {"));
    }
}
