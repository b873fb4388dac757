#![forbid(unsafe_code)]

use crate::error::GitError;
use crate::process::{GitOutput, GitRunner};
use crate::remote::{authenticated_url, redact_url};
use dm_core::ids::{BranchName, RepoId};
use dm_core::naming::VCS_DIR;
use parking_lot::{Mutex, RawMutex};
use parking_lot::lock_api::ArcMutexGuard;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const REMOTE_NAME: &str = "origin";

/// Fully qualified names keep git from confusing a ref with a projected path of the same name.
pub(crate) fn local_ref(branch: &BranchName) -> String {
    format!("refs/heads/{branch}")
}

pub(crate) fn remote_ref(branch: &BranchName) -> String {
    format!("refs/remotes/{REMOTE_NAME}/{branch}")
}

#[derive(Clone, Debug)]
pub struct GitConfig {
    pub program: String,
    pub timeout: Duration,
    pub committer_name: String,
    pub committer_email: String,
    /// Embedded into HTTPS remotes without userinfo.
    pub remote_token: Option<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            timeout: Duration::from_secs(120),
            committer_name: "docmirror".to_string(),
            committer_email: "docmirror@localhost".to_string(),
            remote_token: None,
        }
    }
}

/// Owner of the per-repository working copies under one root directory.
#[derive(Debug)]
pub struct GitGateway {
    config: GitConfig,
    runner: GitRunner,
    root: PathBuf,
    locks: Mutex<HashMap<RepoId, Arc<Mutex<()>>>>,
}

impl GitGateway {
    pub fn new(root: impl Into<PathBuf>, config: GitConfig) -> Self {
        let runner = GitRunner {
            program: config.program.clone(),
            timeout: config.timeout,
        };
        Self {
            config,
            runner,
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &GitConfig {
        &self.config
    }

    pub fn working_dir(&self, repo: RepoId) -> PathBuf {
        self.root.join(repo.get().to_string())
    }

    /// Exclusive access to one repository's working copy. Blocks while another lease on the
    /// same repository is alive; leases on other repositories do not contend.
    pub fn lease(&self, repo: RepoId) -> WorkingCopy<'_> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(repo).or_default())
        };
        let guard = lock.lock_arc();
        WorkingCopy {
            gateway: self,
            repo,
            path: self.working_dir(repo),
            _guard: guard,
        }
    }

    pub(crate) fn runner(&self) -> &GitRunner {
        &self.runner
    }

    pub(crate) fn remote_url_for(&self, url: &str) -> String {
        authenticated_url(url, self.config.remote_token.as_deref())
    }
}

/// A leased working copy. Holding it keeps the repository's mutex locked.
pub struct WorkingCopy<'a> {
    gateway: &'a GitGateway,
    repo: RepoId,
    path: PathBuf,
    _guard: ArcMutexGuard<RawMutex, ()>,
}

impl std::fmt::Debug for WorkingCopy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkingCopy")
            .field("repo", &self.repo)
            .field("path", &self.path)
            .finish()
    }
}

impl WorkingCopy<'_> {
    pub fn repo(&self) -> RepoId {
        self.repo
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.join(VCS_DIR).exists()
    }

    pub(crate) fn git(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        self.gateway.runner().run(&self.path, args)
    }

    pub(crate) fn git_output(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        self.gateway.runner().output(&self.path, args)
    }

    fn require_repo(&self) -> Result<(), GitError> {
        if self.exists() {
            Ok(())
        } else {
            Err(GitError::NotInitialized(self.path.clone()))
        }
    }

    /// Initialize the working copy on `main` with the configured committer identity.
    /// Returns whether a new repository was created.
    pub fn ensure_initialized(&self) -> Result<bool, GitError> {
        let created = !self.exists();
        if created {
            std::fs::create_dir_all(&self.path)?;
            self.git(&["init", "--quiet"])?;
            let head = format!("refs/heads/{}", dm_core::MAIN_BRANCH);
            self.git(&["symbolic-ref", "HEAD", &head])?;
            tracing::info!(repo = %self.repo, path = %self.path.display(), "working copy initialized");
        }
        let config = self.gateway.config();
        self.git(&["config", "user.name", &config.committer_name])?;
        self.git(&["config", "user.email", &config.committer_email])?;
        self.git(&["config", "commit.gpgsign", "false"])?;
        Ok(created)
    }

    pub fn current_branch(&self) -> Option<String> {
        if !self.exists() {
            return None;
        }
        let out = self.git_output(&["symbolic-ref", "--short", "HEAD"]).ok()?;
        let name = out.trimmed();
        (out.success && !name.is_empty()).then(|| name.to_string())
    }

    pub fn has_local_branch(&self, branch: &BranchName) -> bool {
        let reference = local_ref(branch);
        self.git_output(&["rev-parse", "--verify", "--quiet", &reference])
            .map(|out| out.success)
            .unwrap_or(false)
    }

    /// Switch to `branch`, creating it from the current HEAD when it does not exist.
    pub fn checkout(&self, branch: &BranchName) -> Result<(), GitError> {
        self.require_repo()?;
        if self.current_branch().as_deref() == Some(branch.as_str()) {
            return Ok(());
        }
        if self.has_local_branch(branch) {
            self.git(&["checkout", "--quiet", branch.as_str(), "--"])?;
        } else {
            self.git(&["checkout", "--quiet", "-b", branch.as_str()])?;
        }
        Ok(())
    }

    /// Point `branch` at `base`, creating or moving it.
    pub fn branch_from(&self, branch: &BranchName, base: &BranchName) -> Result<(), GitError> {
        self.require_repo()?;
        self.git(&["branch", "-f", branch.as_str(), base.as_str()])?;
        Ok(())
    }

    pub fn stage_all(&self) -> Result<(), GitError> {
        self.git(&["add", "-A"])?;
        Ok(())
    }

    pub fn is_dirty(&self) -> Result<bool, GitError> {
        let out = self.git(&["status", "--porcelain"])?;
        Ok(!out.trimmed().is_empty())
    }

    /// Commit staged changes. Returns the new commit hash, or `None` when nothing changed.
    pub fn commit_if_dirty(&self, message: &str) -> Result<Option<String>, GitError> {
        if !self.is_dirty()? {
            return Ok(None);
        }
        self.git(&["commit", "--quiet", "-m", message])?;
        let head = self.git(&["rev-parse", "HEAD"])?;
        Ok(Some(head.trimmed().to_string()))
    }

    /// Add `origin` or repoint it at `url`. The stored URL carries credentials when a
    /// token is configured.
    pub fn set_remote(&self, url: &str) -> Result<(), GitError> {
        self.require_repo()?;
        let target = self.gateway.remote_url_for(url);
        let remotes = self.git(&["remote"])?;
        let exists = remotes.stdout.lines().any(|line| line.trim() == REMOTE_NAME);
        if exists {
            self.git(&["remote", "set-url", REMOTE_NAME, &target])?;
        } else {
            self.git(&["remote", "add", REMOTE_NAME, &target])?;
        }
        tracing::debug!(repo = %self.repo, remote = %redact_url(&target), "remote configured");
        Ok(())
    }

    pub fn fetch(&self, branch: &BranchName) -> Result<(), GitError> {
        let refspec = format!("+{}:{}", local_ref(branch), remote_ref(branch));
        self.git(&["fetch", "--quiet", REMOTE_NAME, &refspec])?;
        Ok(())
    }

    pub fn has_remote_branch(&self, branch: &BranchName) -> Result<bool, GitError> {
        let out = self.git(&["ls-remote", "--heads", REMOTE_NAME, branch.as_str()])?;
        let reference = local_ref(branch);
        Ok(out
            .stdout
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(reference.as_str())))
    }

    /// Push `branch` to `origin`, setting upstream when the remote branch is new.
    pub fn push(&self, branch: &BranchName) -> Result<bool, GitError> {
        let set_upstream = !self.has_remote_branch(branch)?;
        if set_upstream {
            self.git(&["push", "--quiet", "-u", REMOTE_NAME, branch.as_str()])?;
        } else {
            self.git(&["push", "--quiet", REMOTE_NAME, branch.as_str()])?;
        }
        Ok(set_upstream)
    }

    /// Fetch `branch`, check it out (tracking the remote ref when new) and hard-reset it
    /// to the remote state.
    pub fn pull_reset(&self, branch: &BranchName) -> Result<(), GitError> {
        self.fetch(branch)?;
        let remote_ref = remote_ref(branch);
        if self.current_branch().as_deref() != Some(branch.as_str()) {
            if self.has_local_branch(branch) {
                self.git(&["checkout", "--quiet", branch.as_str(), "--"])?;
            } else {
                self.git(&["checkout", "--quiet", "-b", branch.as_str(), &remote_ref])?;
            }
        }
        self.git(&["reset", "--quiet", "--hard", &remote_ref])?;
        Ok(())
    }

    /// Fast-forward `branch` from `origin` with `git pull`.
    pub fn pull_fast_forward(&self, branch: &BranchName) -> Result<(), GitError> {
        self.checkout(branch)?;
        self.git(&["pull", "--quiet", "--ff-only", REMOTE_NAME, branch.as_str()])?;
        Ok(())
    }
}
