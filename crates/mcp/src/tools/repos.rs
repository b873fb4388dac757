#![forbid(unsafe_code)]

use super::{ToolResult, repo_arg};
use crate::{
    Args, ai_ok, invalid, optional_string, remote_json, repo_json, require_string, service_error,
};
use dm_core::model::DisplayMode;
use dm_service::DocService;
use dm_storage::NewRepository;
use serde_json::{Value, json};

pub(super) fn repo_create(service: &mut DocService, args: &Args) -> ToolResult {
    let display_mode = match optional_string(args, "displayMode")? {
        None => DisplayMode::default(),
        Some(raw) => DisplayMode::parse(&raw)
            .ok_or_else(|| invalid("displayMode must be one of: tree|list"))?,
    };
    let request = NewRepository {
        title: require_string(args, "title")?,
        description: optional_string(args, "description")?.unwrap_or_default(),
        remote_url: non_blank(optional_string(args, "remoteUrl")?),
        display_mode,
    };
    let repo = service.repo_create(request).map_err(service_error)?;
    Ok(ai_ok(
        "repo_create",
        format!("created repository {}", repo.id),
        repo_json(&repo),
    ))
}

pub(super) fn repo_get(service: &mut DocService, args: &Args) -> ToolResult {
    let repo = repo_arg(args)?;
    let repo = service.repo_get(repo).map_err(service_error)?;
    Ok(ai_ok("repo_get", format!("repository {}", repo.id), repo_json(&repo)))
}

pub(super) fn repo_list(service: &mut DocService) -> ToolResult {
    let repos = service.repo_list().map_err(service_error)?;
    Ok(ai_ok(
        "repo_list",
        format!("{} repositories", repos.len()),
        json!({ "repositories": repos.iter().map(repo_json).collect::<Vec<Value>>() }),
    ))
}

/// `remoteUrl: null` (or blank) clears the remote.
pub(super) fn repo_set_remote(service: &mut DocService, args: &Args) -> ToolResult {
    let repo = repo_arg(args)?;
    if !args.contains_key("remoteUrl") {
        return Err(invalid("remoteUrl is required (null clears it)"));
    }
    let remote = non_blank(optional_string(args, "remoteUrl")?);
    let repo = service
        .repo_set_remote(repo, remote.as_deref())
        .map_err(service_error)?;
    let message = match repo.remote_url {
        Some(_) => "remote updated",
        None => "remote cleared",
    };
    Ok(ai_ok("repo_set_remote", message, repo_json(&repo)))
}

pub(super) fn remote_verify(service: &mut DocService, args: &Args) -> ToolResult {
    let url = require_string(args, "url")?;
    let info = service.verify_remote(&url).map_err(service_error)?;
    Ok(ai_ok(
        "remote_verify",
        format!("{} remote branches", info.branches.len()),
        remote_json(&info),
    ))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
