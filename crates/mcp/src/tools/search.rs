#![forbid(unsafe_code)]

use super::{ToolResult, scope};
use crate::{
    Args, ai_ok, hit_json, invalid, optional_kind, optional_string, optional_string_array,
    optional_usize, service_error,
};
use dm_service::{DEFAULT_SEARCH_LIMIT, DocService, SearchQuery};
use serde_json::json;

pub(super) fn search(service: &mut DocService, args: &Args) -> ToolResult {
    let (repo, branch) = scope(service, args)?;
    let keywords = optional_string_array(args, "keywords")?
        .ok_or_else(|| invalid("keywords is required"))?;
    let query = SearchQuery {
        domain_id: optional_string(args, "domainId")?,
        repo_id: repo,
        branch,
        keywords,
        kind: optional_kind(args, "kind")?,
        limit: optional_usize(args, "limit")?.unwrap_or(DEFAULT_SEARCH_LIMIT),
        skip: optional_usize(args, "skip")?.unwrap_or(0),
    };
    let page = service.search(&query).map_err(service_error)?;
    Ok(ai_ok(
        "search",
        format!("{} matches", page.total),
        json!({
            "results": page.results.iter().map(hit_json).collect::<Vec<_>>(),
            "total": page.total,
        }),
    ))
}
