#![forbid(unsafe_code)]

mod batch;
mod branches;
mod definitions;
mod nodes;
mod repos;
mod search;
mod sync;

pub(crate) use definitions::tool_definitions;

use crate::{Args, McpServer, ai_error, invalid, optional_string, require_i64, service_error};
use dm_core::ids::{BranchName, RepoId};
use dm_service::DocService;
use serde_json::Value;

/// Every tool the server answers, parsed once from the `name` of a `tools/call`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToolName {
    DocQuery,
    DocCreate,
    DocEdit,
    DocDelete,
    BlockQuery,
    BlockCreate,
    BlockEdit,
    BlockDelete,
    RepoCreate,
    RepoGet,
    RepoList,
    RepoSetRemote,
    BranchCreate,
    BranchSwitch,
    BranchList,
    Commit,
    Push,
    Pull,
    Status,
    BatchApply,
    Search,
    RemoteVerify,
}

impl ToolName {
    pub(crate) const ALL: [ToolName; 22] = [
        ToolName::DocQuery,
        ToolName::DocCreate,
        ToolName::DocEdit,
        ToolName::DocDelete,
        ToolName::BlockQuery,
        ToolName::BlockCreate,
        ToolName::BlockEdit,
        ToolName::BlockDelete,
        ToolName::RepoCreate,
        ToolName::RepoGet,
        ToolName::RepoList,
        ToolName::RepoSetRemote,
        ToolName::BranchCreate,
        ToolName::BranchSwitch,
        ToolName::BranchList,
        ToolName::Commit,
        ToolName::Push,
        ToolName::Pull,
        ToolName::Status,
        ToolName::BatchApply,
        ToolName::Search,
        ToolName::RemoteVerify,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ToolName::DocQuery => "doc_query",
            ToolName::DocCreate => "doc_create",
            ToolName::DocEdit => "doc_edit",
            ToolName::DocDelete => "doc_delete",
            ToolName::BlockQuery => "block_query",
            ToolName::BlockCreate => "block_create",
            ToolName::BlockEdit => "block_edit",
            ToolName::BlockDelete => "block_delete",
            ToolName::RepoCreate => "repo_create",
            ToolName::RepoGet => "repo_get",
            ToolName::RepoList => "repo_list",
            ToolName::RepoSetRemote => "repo_set_remote",
            ToolName::BranchCreate => "branch_create",
            ToolName::BranchSwitch => "branch_switch",
            ToolName::BranchList => "branch_list",
            ToolName::Commit => "commit",
            ToolName::Push => "push",
            ToolName::Pull => "pull",
            ToolName::Status => "status",
            ToolName::BatchApply => "batch_apply",
            ToolName::Search => "search",
            ToolName::RemoteVerify => "remote_verify",
        }
    }

    pub(crate) fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

type ToolResult = Result<Value, Value>;

pub(crate) fn dispatch_tool(server: &mut McpServer, tool: ToolName, args: &Args) -> Value {
    let service = server.service_mut();
    let result = match tool {
        ToolName::DocQuery => nodes::doc_query(service, args),
        ToolName::DocCreate => nodes::doc_create(service, args),
        ToolName::DocEdit => nodes::doc_edit(service, args),
        ToolName::DocDelete => nodes::doc_delete(service, args),
        ToolName::BlockQuery => nodes::block_query(service, args),
        ToolName::BlockCreate => nodes::block_create(service, args),
        ToolName::BlockEdit => nodes::block_edit(service, args),
        ToolName::BlockDelete => nodes::block_delete(service, args),
        ToolName::RepoCreate => repos::repo_create(service, args),
        ToolName::RepoGet => repos::repo_get(service, args),
        ToolName::RepoList => repos::repo_list(service),
        ToolName::RepoSetRemote => repos::repo_set_remote(service, args),
        ToolName::BranchCreate => branches::branch_create(service, args),
        ToolName::BranchSwitch => branches::branch_switch(service, args),
        ToolName::BranchList => branches::branch_list(service, args),
        ToolName::Commit => sync::commit(service, args),
        ToolName::Push => sync::push(service, args),
        ToolName::Pull => sync::pull(service, args),
        ToolName::Status => sync::status(service, args),
        ToolName::BatchApply => batch::batch_apply(service, args),
        ToolName::Search => search::search(service, args),
        ToolName::RemoteVerify => repos::remote_verify(service, args),
    };
    result.unwrap_or_else(|err| err)
}

pub(crate) fn unknown_tool(name: &str) -> Value {
    ai_error("UNKNOWN_TOOL", &format!("Unknown tool: {name}"))
}

fn repo_arg(args: &Args) -> Result<RepoId, Value> {
    let id = require_i64(args, "repoId")?;
    if id <= 0 {
        return Err(invalid("repoId must be a positive integer"));
    }
    Ok(RepoId::new(id))
}

/// `repoId` plus the effective branch: `arguments.branch`, else the repository's current branch.
fn scope(service: &DocService, args: &Args) -> Result<(RepoId, BranchName), Value> {
    let repo = repo_arg(args)?;
    let branch = optional_string(args, "branch")?;
    let branch = service
        .resolve_branch(repo, branch.as_deref())
        .map_err(service_error)?;
    Ok((repo, branch))
}
