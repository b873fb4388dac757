#![forbid(unsafe_code)]

use super::{ToolResult, scope};
use crate::{
    Args, ai_ok, block_json, doc_json, invalid, optional_i64, optional_string, require_i64,
    service_error, tree_json,
};
use dm_service::DocService;
use dm_storage::{NewBlock, NewDoc};
use serde_json::{Value, json};

pub(super) fn doc_query(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    match optional_i64(args, "did")? {
        Some(did) => {
            let view = service
                .query_doc(repo, &branch, did)
                .map_err(service_error)?;
            let mut data = doc_json(&view.doc);
            data["children"] = Value::Array(view.children.iter().map(doc_json).collect());
            data["blocks"] = Value::Array(view.blocks.iter().map(block_json).collect());
            Ok(ai_ok("doc_query", format!("doc {did}"), data))
        }
        None => {
            let tree = service.query_tree(repo, &branch).map_err(service_error)?;
            Ok(ai_ok(
                "doc_query",
                format!("{} docs on {branch}", tree.len()),
                json!({ "branch": branch.as_str(), "tree": tree_json(&tree) }),
            ))
        }
    }
}

pub(super) fn doc_create(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let title = required_title(args)?;
    let request = NewDoc {
        parent_id: optional_i64(args, "parentDid")?,
        title,
        body: optional_string(args, "body")?.unwrap_or_default(),
        order: optional_i64(args, "order")?,
    };
    let doc = service
        .create_doc(repo, &branch, request)
        .map_err(service_error)?;
    Ok(ai_ok("doc_create", format!("created doc {}", doc.id), doc_json(&doc)))
}

pub(super) fn doc_edit(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let did = require_i64(args, "did")?;
    let (title, body) = edits(args)?;
    let doc = service
        .edit_doc(repo, &branch, did, title.as_deref(), body.as_deref())
        .map_err(service_error)?;
    Ok(ai_ok("doc_edit", format!("updated doc {did}"), doc_json(&doc)))
}

pub(super) fn doc_delete(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let did = require_i64(args, "did")?;
    service
        .delete_doc(repo, &branch, did)
        .map_err(service_error)?;
    Ok(ai_ok("doc_delete", format!("deleted doc {did}"), json!({ "did": did })))
}

pub(super) fn block_query(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let bid = require_i64(args, "bid")?;
    let block = service
        .query_block(repo, &branch, bid)
        .map_err(service_error)?;
    Ok(ai_ok("block_query", format!("block {bid}"), block_json(&block)))
}

pub(super) fn block_create(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let request = NewBlock {
        doc_id: require_i64(args, "did")?,
        title: required_title(args)?,
        body: optional_string(args, "body")?.unwrap_or_default(),
        order: optional_i64(args, "order")?,
    };
    let block = service
        .create_block(repo, &branch, request)
        .map_err(service_error)?;
    Ok(ai_ok(
        "block_create",
        format!("created block {}", block.id),
        block_json(&block),
    ))
}

pub(super) fn block_edit(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let bid = require_i64(args, "bid")?;
    let (title, body) = edits(args)?;
    let block = service
        .edit_block(repo, &branch, bid, title.as_deref(), body.as_deref())
        .map_err(service_error)?;
    Ok(ai_ok("block_edit", format!("updated block {bid}"), block_json(&block)))
}

pub(super) fn block_delete(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let bid = require_i64(args, "bid")?;
    service
        .delete_block(repo, &branch, bid)
        .map_err(service_error)?;
    Ok(ai_ok("block_delete", format!("deleted block {bid}"), json!({ "bid": bid })))
}

fn required_title(args: &Args) -> Result<String, Value> {
    let title = optional_string(args, "title")?.unwrap_or_default();
    if title.trim().is_empty() {
        return Err(invalid("title is required"));
    }
    Ok(title)
}

fn edits(args: &Args) -> Result<(Option<String>, Option<String>), Value> {
    let title = optional_string(args, "title")?;
    let body = optional_string(args, "body")?;
    if title.is_none() && body.is_none() {
        return Err(invalid("title or body is required"));
    }
    if title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(invalid("title must not be empty"));
    }
    Ok((title, body))
}
