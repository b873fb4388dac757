#![forbid(unsafe_code)]

use crate::tools::{ToolName, dispatch_tool, tool_definitions, unknown_tool};
use crate::{McpServer, ai_error};
use dm_service::DocService;
use serde_json::{Value, json};

impl McpServer {
    pub(crate) fn new(service: DocService) -> Self {
        Self {
            initialized: false,
            service,
        }
    }

    pub(crate) fn service_mut(&mut self) -> &mut DocService {
        &mut self.service
    }

    pub(crate) fn handle(&mut self, request: crate::JsonRpcRequest) -> Option<Value> {
        let method = request.method.as_str();
        let expects_response = !matches!(request.id.as_ref(), None | Some(Value::Null));

        if method == "initialize" {
            let protocol_version = request
                .params
                .as_ref()
                .and_then(|v| v.get("protocolVersion"))
                .and_then(|v| v.as_str())
                .unwrap_or(crate::MCP_VERSION);
            return Some(crate::json_rpc_response(
                request.id,
                json!({
                    "protocolVersion": protocol_version,
                    "serverInfo": { "name": crate::SERVER_NAME, "version": crate::SERVER_VERSION },
                    "capabilities": { "tools": {} }
                }),
            ));
        }

        // Both spellings are notifications and never get a response.
        if method == "notifications/initialized" || method == "initialized" {
            self.initialized = true;
            return None;
        }
        if !expects_response {
            return None;
        }

        if method == "ping" {
            return Some(crate::json_rpc_response(request.id, json!({})));
        }

        if !self.initialized {
            return Some(crate::json_rpc_error(
                request.id,
                -32002,
                "Server not initialized",
            ));
        }

        if method == "tools/list" {
            return Some(crate::json_rpc_response(
                request.id,
                json!({ "tools": tool_definitions() }),
            ));
        }

        if method == "tools/call" {
            let Some(params) = request.params.as_ref().and_then(|v| v.as_object()) else {
                return Some(crate::json_rpc_error(
                    request.id,
                    -32602,
                    "params must be an object",
                ));
            };
            let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
            let body = match params.get("arguments") {
                None | Some(Value::Null) => self.call_tool(name, &serde_json::Map::new()),
                Some(Value::Object(args)) => self.call_tool(name, args),
                Some(_) => ai_error("INVALID_INPUT", "arguments must be an object"),
            };
            let is_error = !body
                .get("success")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            return Some(crate::json_rpc_response(
                request.id,
                json!({
                    "content": [crate::tool_text_content(&body)],
                    "isError": is_error
                }),
            ));
        }

        Some(crate::json_rpc_error(
            request.id,
            -32601,
            &format!("Method not found: {method}"),
        ))
    }

    pub(crate) fn call_tool(&mut self, name: &str, args: &crate::Args) -> Value {
        let Some(tool) = ToolName::parse(name) else {
            tracing::warn!(tool = name, "unknown tool");
            return unknown_tool(name);
        };
        let started = std::time::Instant::now();
        let resp = dispatch_tool(self, tool, args);
        let success = resp.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
        tracing::debug!(
            tool = tool.as_str(),
            success,
            elapsed_ms = crate::duration_ms(started.elapsed()),
            "tool call"
        );
        resp
    }
}
