#![forbid(unsafe_code)]

use super::{ToolResult, scope};
use crate::{
    Args, ai_ok, batch_json, invalid, object_list, optional_actor, optional_i64, optional_string,
    require_i64, require_kind, service_error,
};
use dm_core::batch::{BatchRequest, CreateItem, NodeRef, ParentRef, StructureEntry, UpdateItem};
use dm_service::DocService;
use serde_json::Value;

pub(super) fn batch_apply(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let request = parse_request(args)?;
    let actor = optional_actor(args)?;
    let report = service
        .apply_batch(repo, &branch, &request, actor.as_ref())
        .map_err(service_error)?;

    let message = format!(
        "{} deleted, {} created, {} updated, {} unresolved, {} skipped, {} rejected; commit {}",
        report.deleted.len(),
        report.created.len(),
        report.updated.len(),
        report.unresolved.len(),
        report.skipped.len(),
        report.rejected.len(),
        if report.commit.ok { "ok" } else { "failed" },
    );
    let mut data = batch_json(&report);
    data["branch"] = Value::String(branch.to_string());
    Ok(ai_ok("batch_apply", message, data))
}

fn parse_request(args: &Args) -> Result<BatchRequest, Value> {
    let mut request = BatchRequest {
        message: optional_string(args, "message")?,
        ..BatchRequest::default()
    };
    for item in object_list(args, "deletes")? {
        request.deletes.push(node_ref(item)?);
    }
    for item in object_list(args, "creates")? {
        request.creates.push(create_item(item)?);
    }
    for item in object_list(args, "updates")? {
        request.updates.push(UpdateItem {
            target: node_ref(item)?,
            title: optional_string(item, "title")?,
            content: optional_string(item, "content")?,
        });
    }
    for item in object_list(args, "structure")? {
        request.structure.push(StructureEntry {
            kind: require_kind(item, "kind")?,
            id: require_i64(item, "id")?,
            parent_id: optional_i64(item, "parentId")?,
            order: require_i64(item, "order")?,
        });
    }
    Ok(request)
}

fn node_ref(item: &Args) -> Result<NodeRef, Value> {
    Ok(NodeRef {
        kind: require_kind(item, "kind")?,
        id: require_i64(item, "id")?,
    })
}

/// `parent` is a concrete id, a placeholder token from the same batch, or absent for a root doc.
fn create_item(item: &Args) -> Result<CreateItem, Value> {
    let parent = match item.get("parent") {
        None | Some(Value::Null) => ParentRef::Root,
        Some(Value::Number(n)) => ParentRef::Id(
            n.as_i64()
                .ok_or_else(|| invalid("creates[].parent must be an integer or a string"))?,
        ),
        Some(Value::String(token)) if !token.trim().is_empty() => {
            ParentRef::Placeholder(token.trim().to_string())
        }
        Some(_) => return Err(invalid("creates[].parent must be an integer or a string")),
    };
    let title = optional_string(item, "title")?.unwrap_or_default();
    if title.trim().is_empty() {
        return Err(invalid("creates[].title is required"));
    }
    Ok(CreateItem {
        kind: require_kind(item, "kind")?,
        placeholder_id: optional_string(item, "placeholderId")?
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        parent,
        title,
        content: optional_string(item, "content")?.unwrap_or_default(),
        order: optional_i64(item, "order")?,
    })
}
