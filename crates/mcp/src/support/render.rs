#![forbid(unsafe_code)]

//! JSON views of domain values. Keys are camelCase on the wire.

use super::time::ts_ms_to_rfc3339;
use dm_core::batch::{CreatedItem, NodeRef, UnresolvedCreate};
use dm_core::model::{Block, Doc, Repository};
use dm_core::structure::RejectedEntry;
use dm_service::{BatchFailure, BatchReport, BranchStatus, CommitReport, Skipped, TreeEntry};
use dm_storage::{SearchHit, SyncRecord};
use dm_vcs::{RemoteInfo, VcsStatus, redact_url};
use serde_json::{Value, json};

pub(crate) fn repo_json(repo: &Repository) -> Value {
    json!({
        "id": repo.id.get(),
        "title": repo.title,
        "description": repo.description,
        "currentBranch": repo.current_branch.as_str(),
        "branches": repo.branches.iter().map(|b| b.as_str()).collect::<Vec<_>>(),
        "remoteUrl": repo.remote_url.as_deref().map(redact_url),
        "displayMode": repo.display_mode.as_str(),
        "createdAt": ts_ms_to_rfc3339(repo.created_at_ms),
    })
}

pub(crate) fn doc_json(doc: &Doc) -> Value {
    json!({
        "did": doc.id,
        "parentDid": doc.parent_id,
        "title": doc.title,
        "body": doc.body,
        "order": doc.order,
        "path": doc.path,
        "branch": doc.branch.as_str(),
        "updatedAt": ts_ms_to_rfc3339(doc.updated_at_ms),
    })
}

pub(crate) fn block_json(block: &Block) -> Value {
    json!({
        "bid": block.id,
        "did": block.doc_id,
        "title": block.title,
        "body": block.body,
        "order": block.order,
        "branch": block.branch.as_str(),
        "updatedAt": ts_ms_to_rfc3339(block.updated_at_ms),
    })
}

pub(crate) fn tree_json(entries: &[TreeEntry]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|entry| {
                let mut doc = doc_json(&entry.doc);
                doc["depth"] = json!(entry.depth);
                doc["blocks"] = Value::Array(entry.blocks.iter().map(block_json).collect());
                doc
            })
            .collect(),
    )
}

pub(crate) fn sync_json(record: &SyncRecord) -> Value {
    json!({
        "state": record.state.as_str(),
        "lastError": record.last_error,
        "updatedAt": record.updated_at_ms.map(ts_ms_to_rfc3339),
    })
}

fn vcs_json(vcs: &VcsStatus) -> Value {
    json!({
        "hasLocalRepo": vcs.has_local_repo,
        "currentBranch": vcs.current_branch,
        "hasLocalBranch": vcs.has_local_branch,
        "localCommitCount": vcs.local_commit_count,
        "isDirty": vcs.is_dirty,
        "lastCommit": vcs.last_commit.as_ref().map(|c| json!({
            "hash": c.hash,
            "message": c.message,
            "timestamp": c.timestamp,
        })),
        "hasRemote": vcs.has_remote,
        "hasRemoteBranch": vcs.has_remote_branch,
        "remoteCommitCount": vcs.remote_commit_count,
        "ahead": vcs.ahead,
        "behind": vcs.behind,
    })
}

pub(crate) fn status_json(status: &BranchStatus) -> Value {
    let mut out = vcs_json(&status.vcs);
    out["branch"] = json!(status.branch.as_str());
    out["sync"] = sync_json(&status.sync);
    out
}

pub(crate) fn remote_json(info: &RemoteInfo) -> Value {
    json!({ "url": info.url, "branches": info.branches })
}

pub(crate) fn hit_json(hit: &SearchHit) -> Value {
    json!({
        "kind": hit.kind.as_str(),
        "id": hit.id,
        "title": hit.title,
        "snippet": hit.snippet,
    })
}

fn node_ref_json(node: &NodeRef) -> Value {
    json!({ "kind": node.kind.as_str(), "id": node.id })
}

fn created_json(item: &CreatedItem) -> Value {
    json!({
        "kind": item.kind.as_str(),
        "placeholderId": item.placeholder_id,
        "id": item.id,
        "parentId": item.parent_id,
    })
}

fn unresolved_json(item: &UnresolvedCreate) -> Value {
    json!({
        "kind": item.kind.as_str(),
        "placeholderId": item.placeholder_id,
        "title": item.title,
        "reason": item.reason.describe(),
    })
}

fn rejected_json(entry: &RejectedEntry) -> Value {
    json!({
        "kind": entry.kind.as_str(),
        "id": entry.id,
        "reason": entry.reason.as_str(),
    })
}

fn skipped_json(skipped: &Skipped) -> Value {
    let (op, node) = match skipped {
        Skipped::Delete(node) => ("delete", node),
        Skipped::Update(node) => ("update", node),
    };
    let mut out = node_ref_json(node);
    out["op"] = json!(op);
    out
}

fn failure_json(failure: &BatchFailure) -> Value {
    match failure {
        BatchFailure::Delete(node, error) | BatchFailure::Update(node, error) => {
            let mut out = node_ref_json(node);
            let op = if matches!(failure, BatchFailure::Delete(..)) {
                "delete"
            } else {
                "update"
            };
            out["op"] = json!(op);
            out["error"] = json!(error);
            out
        }
        BatchFailure::Structure(error) => json!({ "op": "structure", "error": error }),
    }
}

fn commit_report_json(commit: &CommitReport) -> Value {
    json!({
        "ok": commit.ok,
        "commit": commit.commit,
        "message": commit.message,
        "error": commit.error,
    })
}

pub(crate) fn batch_json(report: &BatchReport) -> Value {
    json!({
        "deleted": report.deleted.iter().map(node_ref_json).collect::<Vec<_>>(),
        "created": report.created.iter().map(created_json).collect::<Vec<_>>(),
        "unresolved": report.unresolved.iter().map(unresolved_json).collect::<Vec<_>>(),
        "createPasses": report.create_passes,
        "updated": report.updated.iter().map(node_ref_json).collect::<Vec<_>>(),
        "skipped": report.skipped.iter().map(skipped_json).collect::<Vec<_>>(),
        "rejected": report.rejected.iter().map(rejected_json).collect::<Vec<_>>(),
        "failures": report.failures.iter().map(failure_json).collect::<Vec<_>>(),
        "commit": commit_report_json(&report.commit),
    })
}
