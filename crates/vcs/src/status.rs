#![forbid(unsafe_code)]

use crate::gateway::{WorkingCopy, local_ref, remote_ref};
use dm_core::ids::BranchName;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastCommit {
    pub hash: String,
    pub message: String,
    pub timestamp: i64,
}

/// Snapshot of one branch in a working copy. Every field falls back to a conservative
/// default when its git query fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VcsStatus {
    pub has_local_repo: bool,
    pub current_branch: Option<String>,
    pub has_local_branch: bool,
    pub local_commit_count: u64,
    pub is_dirty: bool,
    pub last_commit: Option<LastCommit>,
    pub has_remote: bool,
    pub has_remote_branch: bool,
    pub remote_commit_count: u64,
    pub ahead: u64,
    pub behind: u64,
}

impl WorkingCopy<'_> {
    pub fn status(&self, branch: &BranchName, remote_url: Option<&str>) -> VcsStatus {
        let mut status = VcsStatus {
            has_local_repo: self.exists(),
            ..VcsStatus::default()
        };
        if !status.has_local_repo {
            return status;
        }

        status.current_branch = self.current_branch();
        status.has_local_branch = self.has_local_branch(branch);
        let local = local_ref(branch);
        if status.has_local_branch {
            status.local_commit_count = self.count(&local).unwrap_or(0);
            status.last_commit = self.last_commit(&local);
        }
        status.is_dirty = match self.is_dirty() {
            Ok(dirty) => dirty,
            Err(err) => {
                tracing::warn!(repo = %self.repo(), error = %err, "status: dirty check failed");
                false
            }
        };

        let Some(url) = remote_url.map(str::trim).filter(|u| !u.is_empty()) else {
            return status;
        };
        if let Err(err) = self.set_remote(url) {
            tracing::warn!(repo = %self.repo(), error = %err, "status: remote setup failed");
            return status;
        }
        status.has_remote = true;

        status.has_remote_branch = match self.has_remote_branch(branch) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(repo = %self.repo(), error = %err, "status: ls-remote failed");
                status.has_remote = false;
                false
            }
        };
        if !status.has_remote_branch {
            status.ahead = status.local_commit_count;
            return status;
        }
        if let Err(err) = self.fetch(branch) {
            tracing::warn!(repo = %self.repo(), error = %err, "status: fetch failed");
            status.has_remote = false;
            status.ahead = status.local_commit_count;
            return status;
        }

        let remote = remote_ref(branch);
        status.remote_commit_count = self.count(&remote).unwrap_or(0);
        if !status.has_local_branch {
            status.behind = status.remote_commit_count;
            return status;
        }
        let (ahead, behind) = self.ahead_behind(&local, &remote).unwrap_or_else(|| {
            let local = status.local_commit_count;
            let remote = status.remote_commit_count;
            (local.saturating_sub(remote), remote.saturating_sub(local))
        });
        status.ahead = ahead;
        status.behind = behind;
        status
    }

    fn count(&self, range: &str) -> Option<u64> {
        let out = self.git_output(&["rev-list", "--count", range, "--"]).ok()?;
        if !out.success {
            return None;
        }
        out.trimmed().parse().ok()
    }

    fn ahead_behind(&self, local: &str, remote: &str) -> Option<(u64, u64)> {
        let range = format!("{local}...{remote}");
        if let Ok(out) = self.git_output(&["rev-list", "--left-right", "--count", &range, "--"]) {
            let mut parts = out.trimmed().split_whitespace();
            if out.success {
                if let (Some(a), Some(b)) = (parts.next(), parts.next()) {
                    if let (Ok(a), Ok(b)) = (a.parse(), b.parse()) {
                        return Some((a, b));
                    }
                }
            }
        }
        tracing::warn!(repo = %self.repo(), "status: left-right count failed, trying one-sided counts");
        let ahead = self.count(&format!("{remote}..{local}"))?;
        let behind = self.count(&format!("{local}..{remote}"))?;
        Some((ahead, behind))
    }

    fn last_commit(&self, local: &str) -> Option<LastCommit> {
        let out = self
            .git_output(&["log", "-1", "--format=%H%x1f%s%x1f%ct", local, "--"])
            .ok()?;
        if !out.success {
            return None;
        }
        let mut fields = out.trimmed().split('\u{1f}');
        let hash = fields.next()?.to_string();
        let message = fields.next()?.to_string();
        let timestamp = fields.next()?.parse().ok()?;
        Some(LastCommit {
            hash,
            message,
            timestamp,
        })
    }
}
