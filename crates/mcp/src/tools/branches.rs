#![forbid(unsafe_code)]

use super::{ToolResult, repo_arg};
use crate::{Args, ai_ok, optional_actor, repo_json, require_string, service_error, sync_json};
use dm_service::DocService;
use serde_json::json;

pub(super) fn branch_create(service: &mut DocService, args: &Args) -> ToolResult {
    let repo = repo_arg(args)?;
    let name = require_string(args, "name")?;
    let actor = optional_actor(args)?;
    let repo = service
        .create_branch(repo, &name, actor.as_ref())
        .map_err(service_error)?;
    Ok(ai_ok(
        "branch_create",
        format!("created branch {} from main", repo.current_branch),
        repo_json(&repo),
    ))
}

pub(super) fn branch_switch(service: &mut DocService, args: &Args) -> ToolResult {
    let repo = repo_arg(args)?;
    let name = require_string(args, "name")?;
    let repo = service
        .switch_branch(repo, &name)
        .map_err(service_error)?;
    Ok(ai_ok(
        "branch_switch",
        format!("current branch is {}", repo.current_branch),
        repo_json(&repo),
    ))
}

pub(super) fn branch_list(service: &mut DocService, args: &Args) -> ToolResult {
    let repo = repo_arg(args)?;
    let list = service.list_branches(repo).map_err(service_error)?;
    let branches = list
        .branches
        .iter()
        .map(|entry| {
            json!({
                "name": entry.name.as_str(),
                "isCurrent": entry.is_current,
                "readOnly": entry.name.is_main(),
                "sync": sync_json(&entry.sync),
            })
        })
        .collect::<Vec<_>>();
    Ok(ai_ok(
        "branch_list",
        format!("{} branches", branches.len()),
        json!({ "current": list.current.as_str(), "branches": branches }),
    ))
}
