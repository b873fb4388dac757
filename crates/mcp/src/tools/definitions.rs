#![forbid(unsafe_code)]

use super::ToolName;
use serde_json::{Map, Value, json};

fn schema(properties: Value, required: &[&str]) -> Value {
    let mut props = match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    props.entry("repoId").or_insert(json!({ "type": "integer" }));
    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

fn branch_prop() -> Value {
    json!({ "type": "string", "description": "Defaults to the repository's current branch." })
}

fn actor_prop() -> Value {
    json!({
        "type": "object",
        "properties": { "id": { "type": "string" }, "name": { "type": "string" } },
        "required": ["id", "name"]
    })
}

fn node_ref_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "kind": { "type": "string", "enum": ["doc", "block"] },
            "id": { "type": "integer" }
        },
        "required": ["kind", "id"]
    })
}

fn definition(tool: ToolName) -> (&'static str, Value) {
    match tool {
        ToolName::DocQuery => (
            "One doc with its children and blocks, or the whole tree when did is omitted.",
            schema(json!({ "branch": branch_prop(), "did": { "type": "integer" } }), &["repoId"]),
        ),
        ToolName::DocCreate => (
            "Create a doc (folder). Appended after its last sibling when order is omitted.",
            schema(
                json!({
                    "branch": branch_prop(),
                    "title": { "type": "string" },
                    "body": { "type": "string" },
                    "parentDid": { "type": "integer" },
                    "order": { "type": "integer" }
                }),
                &["repoId", "title"],
            ),
        ),
        ToolName::DocEdit => (
            "Change a doc's title and/or body.",
            schema(
                json!({
                    "branch": branch_prop(),
                    "did": { "type": "integer" },
                    "title": { "type": "string" },
                    "body": { "type": "string" }
                }),
                &["repoId", "did"],
            ),
        ),
        ToolName::DocDelete => (
            "Delete one doc. Children and blocks are not removed.",
            schema(
                json!({ "branch": branch_prop(), "did": { "type": "integer" } }),
                &["repoId", "did"],
            ),
        ),
        ToolName::BlockQuery => (
            "One block.",
            schema(
                json!({ "branch": branch_prop(), "bid": { "type": "integer" } }),
                &["repoId", "bid"],
            ),
        ),
        ToolName::BlockCreate => (
            "Create a block inside a doc.",
            schema(
                json!({
                    "branch": branch_prop(),
                    "did": { "type": "integer" },
                    "title": { "type": "string" },
                    "body": { "type": "string" },
                    "order": { "type": "integer" }
                }),
                &["repoId", "did", "title"],
            ),
        ),
        ToolName::BlockEdit => (
            "Change a block's title and/or body.",
            schema(
                json!({
                    "branch": branch_prop(),
                    "bid": { "type": "integer" },
                    "title": { "type": "string" },
                    "body": { "type": "string" }
                }),
                &["repoId", "bid"],
            ),
        ),
        ToolName::BlockDelete => (
            "Delete one block.",
            schema(
                json!({ "branch": branch_prop(), "bid": { "type": "integer" } }),
                &["repoId", "bid"],
            ),
        ),
        ToolName::RepoCreate => (
            "Create a repository with branch main.",
            json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "remoteUrl": { "type": "string" },
                    "displayMode": { "type": "string", "enum": ["tree", "list"] }
                },
                "required": ["title"]
            }),
        ),
        ToolName::RepoGet => ("One repository.", schema(json!({}), &["repoId"])),
        ToolName::RepoList => (
            "All repositories.",
            json!({ "type": "object", "properties": {} }),
        ),
        ToolName::RepoSetRemote => (
            "Set the remote URL; null clears it.",
            schema(
                json!({ "remoteUrl": { "type": ["string", "null"] } }),
                &["repoId", "remoteUrl"],
            ),
        ),
        ToolName::BranchCreate => (
            "Commit main, then fork a new branch from it and make it current. Only allowed while main is current.",
            schema(
                json!({ "name": { "type": "string" }, "actor": actor_prop() }),
                &["repoId", "name"],
            ),
        ),
        ToolName::BranchSwitch => (
            "Make a known branch current.",
            schema(json!({ "name": { "type": "string" } }), &["repoId", "name"]),
        ),
        ToolName::BranchList => (
            "Known branches with their sync state.",
            schema(json!({}), &["repoId"]),
        ),
        ToolName::Commit => (
            "Project the branch into its working copy and commit when anything changed.",
            schema(
                json!({
                    "branch": branch_prop(),
                    "message": { "type": "string" },
                    "actor": actor_prop()
                }),
                &["repoId"],
            ),
        ),
        ToolName::Push => (
            "Push the branch to the repository's remote.",
            schema(json!({ "branch": branch_prop() }), &["repoId"]),
        ),
        ToolName::Pull => (
            "Reset the branch to the remote and rebuild its docs and blocks from it.",
            schema(json!({ "branch": branch_prop() }), &["repoId"]),
        ),
        ToolName::Status => (
            "Working-copy status with ahead/behind counts and sync state.",
            schema(
                json!({ "branch": branch_prop(), "remoteUrl": { "type": "string" } }),
                &["repoId"],
            ),
        ),
        ToolName::BatchApply => (
            "Apply deletes, creates (placeholder parents allowed), updates and structure moves, then commit.",
            schema(
                json!({
                    "branch": branch_prop(),
                    "deletes": { "type": "array", "items": node_ref_schema() },
                    "creates": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "kind": { "type": "string", "enum": ["doc", "block"] },
                                "placeholderId": { "type": "string" },
                                "parent": { "type": ["integer", "string", "null"] },
                                "title": { "type": "string" },
                                "content": { "type": "string" },
                                "order": { "type": "integer" }
                            },
                            "required": ["kind", "title"]
                        }
                    },
                    "updates": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "kind": { "type": "string", "enum": ["doc", "block"] },
                                "id": { "type": "integer" },
                                "title": { "type": "string" },
                                "content": { "type": "string" }
                            },
                            "required": ["kind", "id"]
                        }
                    },
                    "structure": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "kind": { "type": "string", "enum": ["doc", "block"] },
                                "id": { "type": "integer" },
                                "parentId": { "type": ["integer", "null"] },
                                "order": { "type": "integer" }
                            },
                            "required": ["kind", "id", "order"]
                        }
                    },
                    "message": { "type": "string" },
                    "actor": actor_prop()
                }),
                &["repoId"],
            ),
        ),
        ToolName::Search => (
            "Case-insensitive keyword search over titles and bodies; every keyword must match.",
            schema(
                json!({
                    "branch": branch_prop(),
                    "keywords": { "type": "array", "items": { "type": "string" } },
                    "kind": { "type": "string", "enum": ["doc", "block"] },
                    "limit": { "type": "integer" },
                    "skip": { "type": "integer" },
                    "domainId": { "type": "string" }
                }),
                &["repoId", "keywords"],
            ),
        ),
        ToolName::RemoteVerify => (
            "Check that a remote URL is reachable and list its branches.",
            json!({
                "type": "object",
                "properties": { "url": { "type": "string" } },
                "required": ["url"]
            }),
        ),
    }
}

pub(crate) fn tool_definitions() -> Vec<Value> {
    ToolName::ALL
        .into_iter()
        .map(|tool| {
            let (description, input_schema) = definition(tool);
            json!({
                "name": tool.as_str(),
                "description": description,
                "inputSchema": input_schema,
            })
        })
        .collect()
}
