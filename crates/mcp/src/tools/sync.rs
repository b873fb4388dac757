#![forbid(unsafe_code)]

use super::{ToolResult, repo_arg, scope};
use crate::{Args, ai_ok, invalid, optional_actor, optional_string, service_error, status_json};
use dm_core::ids::BranchName;
use dm_service::DocService;
use serde_json::json;

pub(super) fn commit(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let message = optional_string(args, "message")?;
    let actor = optional_actor(args)?;
    let outcome = service
        .commit(repo, &branch, message.as_deref(), actor.as_ref())
        .map_err(service_error)?;
    let summary = match &outcome.commit {
        Some(hash) => format!("committed {hash} on {branch}"),
        None => format!("nothing to commit on {branch}"),
    };
    Ok(ai_ok(
        "commit",
        summary,
        json!({
            "branch": branch.as_str(),
            "commit": outcome.commit,
            "message": outcome.message,
            "docs": outcome.docs,
            "blocks": outcome.blocks,
        }),
    ))
}

pub(super) fn push(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let outcome = service.push(repo, &branch).map_err(service_error)?;
    Ok(ai_ok(
        "push",
        format!("pushed {branch}"),
        json!({
            "branch": branch.as_str(),
            "remote": outcome.remote,
            "setUpstream": outcome.set_upstream,
        }),
    ))
}

/// The branch may be unknown locally; pulling registers it.
pub(super) fn pull(service: &mut DocService, args: &Args) -> ToolResult {
    let repo = repo_arg(args)?;
    let branch = match optional_string(args, "branch")?
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
    {
        Some(raw) => BranchName::try_new(raw)
            .map_err(|err| invalid(format!("branch name: {}", err.message())))?,
        None => service.repo_get(repo).map_err(service_error)?.current_branch,
    };
    let outcome = service.pull(repo, &branch).map_err(service_error)?;
    Ok(ai_ok(
        "pull",
        format!("pulled {branch}"),
        json!({ "branch": branch.as_str(), "docs": outcome.docs, "blocks": outcome.blocks }),
    ))
}

pub(super) fn status(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let remote = optional_string(args, "remoteUrl")?;
    let status = service
        .status(repo, &branch, remote.as_deref())
        .map_err(service_error)?;
    Ok(ai_ok(
        "status",
        format!("{branch}: {}", status.sync.state.as_str()),
        status_json(&status),
    ))
}
