//! MCP (Model Context Protocol) server implementation

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sragate::{Gateway, GatewayError, Tool, TOOL_LLMTXT};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

/// JSON-RPC 2.0 request
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// MCP Server implementation
struct McpServer {
    tool: Tool,
}

impl McpServer {
    fn new(gateway: Gateway) -> Self {
        Self {
            tool: Tool::new(gateway),
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "sragate",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": TOOL_LLMTXT
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": self.tool.definitions() }))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let Some(tool_name) = params.get("name").and_then(|v| v.as_str()) else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing tool name");
        };

        if !self.tool.definitions().iter().any(|d| d.name == tool_name) {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", tool_name),
            );
        }

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
        debug!(tool = tool_name, "Calling tool");

        match self.tool.call(tool_name, arguments).await {
            Ok(output) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{
                        "type": "text",
                        "text": output.into_text()
                    }]
                }),
            ),
            Err(GatewayError::InvalidArgument(message)) => JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Invalid arguments: {}", message),
            ),
            Err(e) => tool_error(id, &e),
        }
    }
}

/// Tool failures other than bad arguments are results, not protocol errors
fn tool_error(id: Option<Value>, err: &GatewayError) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "content": [{
                "type": "text",
                "text": format!("Error: {}", err)
            }],
            "isError": true
        }),
    )
}

/// Decode one input line into the response to send, if any
async fn handle_line(server: &McpServer, line: &str) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            return Some(JsonRpcResponse::error(
                None,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ))
        }
    };

    // Notifications carry no id and get no response
    if request.id.is_none() {
        debug!(method = %request.method, "Ignoring notification");
        return None;
    }

    Some(server.handle_request(request).await)
}

/// Run the MCP server over stdio
pub async fn run_server(gateway: Gateway) {
    info!("Starting SRA gateway MCP server");
    let server = McpServer::new(gateway);
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Error reading stdin");
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = handle_line(&server, &line).await else {
            continue;
        };

        let mut json = serde_json::to_string(&response).unwrap_or_default();
        json.push('\n');
        if let Err(e) = stdout.write_all(json.as_bytes()).await {
            error!(error = %e, "Error writing to stdout");
            break;
        }
        let _ = stdout.flush().await;
    }

    info!("MCP server stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::new(Gateway::default())
    }

    async fn call(line: &str) -> Value {
        let response = handle_line(&server(), line).await.unwrap();
        serde_json::to_value(&response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let value = call(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;
        assert_eq!(value["id"], 1);
        assert_eq!(value["result"]["serverInfo"]["name"], "sragate");
        assert!(value["result"]["instructions"]
            .as_str()
            .unwrap()
            .contains("## search"));
    }

    #[tokio::test]
    async fn test_tools_list() {
        let value = call(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let tools = value["result"]["tools"].as_array().unwrap();
        let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["search", "read", "recommend"]);
        assert!(tools[0]["inputSchema"]["properties"]["search_phrase"].is_object());
    }

    #[tokio::test]
    async fn test_parse_error() {
        let value = call("not json").await;
        assert_eq!(value["error"]["code"], -32700);
        assert!(value.get("id").is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let value = call(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#).await;
        assert_eq!(value["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let value = call(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"fetch","arguments":{}}}"#,
        )
        .await;
        assert_eq!(value["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_validation_error_is_tool_error() {
        let value = call(
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"read","arguments":{"url":"https://example.com/a.html"}}}"#,
        )
        .await;
        assert_eq!(value["result"]["isError"], true);
        assert!(value["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Error: Invalid URL"));
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid_params() {
        let value = call(
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"search","arguments":{"limit":3}}}"#,
        )
        .await;
        assert_eq!(value["id"], 6);
        assert_eq!(value["error"]["code"], -32602);
        assert!(value["error"]["message"]
            .as_str()
            .unwrap()
            .contains("search_phrase"));
        assert!(value.get("result").is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_argument_is_invalid_params() {
        let value = call(
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"recommend","arguments":{"url":"https://docs.aws.amazon.com/a.html","limit":0}}}"#,
        )
        .await;
        assert_eq!(value["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let response = handle_line(
            &server(),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;
        assert!(response.is_none());
    }
}
