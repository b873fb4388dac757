#![forbid(unsafe_code)]

mod support;
use support::*;

use serde_json::json;

#[test]
fn tools_list_advertises_every_tool() {
    let mut server = Server::start_initialized();

    let tools_list = server.request(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/list",
        "params": {}
    }));
    let tools = tools_list
        .get("result")
        .and_then(|v| v.get("tools"))
        .and_then(|v| v.as_array())
        .expect("result.tools");

    let mut names = tools
        .iter()
        .filter_map(|tool| tool.get("name").and_then(|v| v.as_str()))
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(
        names,
        vec![
            "batch_apply",
            "block_create",
            "block_delete",
            "block_edit",
            "block_query",
            "branch_create",
            "branch_list",
            "branch_switch",
            "commit",
            "doc_create",
            "doc_delete",
            "doc_edit",
            "doc_query",
            "pull",
            "push",
            "remote_verify",
            "repo_create",
            "repo_get",
            "repo_list",
            "repo_set_remote",
            "search",
            "status",
        ]
    );
    assert!(
        tools
            .iter()
            .all(|tool| tool.get("inputSchema").and_then(|v| v.get("type")) == Some(&json!("object")))
    );
}

#[test]
fn initialize_echoes_protocol_and_gates_tools() {
    let mut server = Server::start();

    let early = server.request(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }));
    assert_json_rpc_error(&early, -32002);

    let init = server.request(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "initialize",
        "params": { "protocolVersion": "2025-03-26" }
    }));
    assert_eq!(init["result"]["protocolVersion"], json!("2025-03-26"));
    assert_eq!(init["result"]["serverInfo"]["name"], json!("docmirror-mcp"));

    server.send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }));
    let pong = server.request(json!({ "jsonrpc": "2.0", "id": 3, "method": "ping" }));
    assert_eq!(pong["result"], json!({}));
}

#[test]
fn malformed_frames_get_json_rpc_errors() {
    let mut server = Server::start_initialized();

    server.send_raw("{not json");
    assert_json_rpc_error(&server.recv(), -32700);

    server.send_raw("[1, 2]");
    assert_json_rpc_error(&server.recv(), -32600);

    let resp = server.request(json!({ "jsonrpc": "2.0", "id": 9, "params": {} }));
    assert_json_rpc_error(&resp, -32600);
    assert_eq!(resp["id"], json!(9));

    let resp = server.request(json!({ "jsonrpc": "2.0", "id": 10, "method": "resources/list" }));
    assert_json_rpc_error(&resp, -32601);

    let resp = server.request(json!({
        "jsonrpc": "2.0",
        "id": 11,
        "method": "tools/call",
        "params": "commit"
    }));
    assert_json_rpc_error(&resp, -32602);
}

#[test]
fn tool_failures_are_envelopes_not_crashes() {
    let mut server = Server::start_initialized();

    let resp = server.request(json!({
        "jsonrpc": "2.0",
        "id": 20,
        "method": "tools/call",
        "params": { "name": "doc_move", "arguments": {} }
    }));
    assert_eq!(resp["result"]["isError"], json!(true));
    let payload = extract_tool_text(&resp);
    assert_eq!(payload["success"], json!(false));
    assert_eq!(error_code(&payload), Some("UNKNOWN_TOOL"));

    let payload = server.call("repo_get", json!({}));
    assert_eq!(error_code(&payload), Some("INVALID_INPUT"));
    let payload = server.call("repo_get", json!({ "repoId": 42 }));
    assert_eq!(error_code(&payload), Some("NOT_FOUND"));

    // Still serving.
    let data = server.call_ok("repo_list", json!({}));
    assert_eq!(data["repositories"], json!([]));
}
