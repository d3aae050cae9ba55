//! JSON-RPC request handling and tool dispatch. Dispatch is the single
//! choke point for every tool call regardless of transport: registry
//! lookup, argument validation, handler execution under the call timeout,
//! and error classification all happen here.

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ToolError;
use crate::mcp::protocol::{error_codes, Request, Response};
use crate::mcp::registry::{input_schema, validate};
use crate::AppState;

pub const SERVER_NAME: &str = "story_mcp";
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Run one tool call end to end. A timed-out read maps to `Timeout`; a
/// timed-out write maps to `StateUnknown` because the transaction may have
/// landed after the deadline.
pub async fn dispatch(state: &AppState, name: &str, args: &Value) -> Result<Value, ToolError> {
    let entry = state
        .registry
        .get(name)
        .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
    let canonical = validate(&entry.def, args)?;

    let budget = state.config.call_timeout;
    info!(tool = name, "dispatching tool call");
    match tokio::time::timeout(budget, (entry.handler)(state, canonical)).await {
        Ok(result) => result,
        Err(_elapsed) => {
            warn!(tool = name, timeout_s = budget.as_secs(), "tool call timed out");
            if entry.def.mutates {
                Err(ToolError::StateUnknown(budget.as_secs()))
            } else {
                Err(ToolError::Timeout(budget.as_secs()))
            }
        }
    }
}

/// Wrap a handler payload in the MCP tool-result shape. The text content is
/// the payload's summary line; the full payload rides along as structured
/// content.
pub fn make_texty_result(payload: Value) -> Value {
    let text = payload
        .get("summary")
        .and_then(|s| s.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| payload.to_string());
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": payload,
        "isError": false,
    })
}

async fn handle_tool_call(state: &AppState, id: Value, params: &Value) -> Response {
    let name = match params.get("name").and_then(|n| n.as_str()) {
        Some(n) => n,
        None => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                "tools/call requires a 'name' parameter".to_string(),
            )
        }
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    match dispatch(state, name, &arguments).await {
        Ok(payload) => Response::success(id, make_texty_result(payload)),
        Err(err) => {
            warn!(tool = name, kind = err.kind(), error = %err, "tool call failed");
            Response::tool_error(id, &err)
        }
    }
}

/// Route a single MCP request. Returns `None` for notifications, which get
/// no response on either transport.
pub async fn handle_mcp_request(state: &AppState, req: Request) -> Option<Response> {
    if req.method.starts_with("notifications/") {
        return None;
    }
    let id = req.id.clone();
    let params = req.params.clone().unwrap_or(Value::Null);

    let response = match req.method.as_str() {
        "initialize" => Response::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ),
        "ping" => Response::success(id, json!({})),
        "tools/list" => {
            let tools: Vec<Value> = state
                .registry
                .definitions()
                .into_iter()
                .map(|def| {
                    json!({
                        "name": def.name,
                        "description": def.description,
                        "inputSchema": input_schema(def),
                    })
                })
                .collect();
            Response::success(id, json!({ "tools": tools }))
        }
        "tools/call" => handle_tool_call(state, id, &params).await,
        // Direct method form: the tool name as the JSON-RPC method with the
        // arguments as params.
        method if state.registry.contains(method) => {
            let rewritten = json!({ "name": method, "arguments": params });
            handle_tool_call(state, id, &rewritten).await
        }
        other => Response::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("unknown method: '{}'", other),
        ),
    };
    Some(response)
}
