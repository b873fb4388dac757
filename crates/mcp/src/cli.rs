#![forbid(unsafe_code)]

use clap::Parser;
use dm_core::model::Actor;
use dm_service::config::{DEFAULT_STORAGE_DIR, ServiceConfig};
use dm_vcs::GitConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Branch-aware doc store with a git mirror, served as MCP tools over stdio.
#[derive(Debug, Parser)]
#[command(name = "dm_mcp", version)]
pub(crate) struct Args {
    /// Directory holding the SQLite store and the per-repository working copies.
    #[arg(long, env = "DOCMIRROR_STORAGE_DIR", default_value = DEFAULT_STORAGE_DIR)]
    pub(crate) storage_dir: PathBuf,

    /// git executable.
    #[arg(long, env = "DOCMIRROR_GIT_BIN", default_value = "git")]
    pub(crate) git_bin: String,

    /// Per-command timeout for git child processes.
    #[arg(long, env = "DOCMIRROR_GIT_TIMEOUT_SECS", default_value_t = 120)]
    pub(crate) git_timeout_secs: u64,

    #[arg(long, env = "DOCMIRROR_COMMITTER_NAME", default_value = "docmirror")]
    pub(crate) committer_name: String,

    #[arg(long, env = "DOCMIRROR_COMMITTER_EMAIL", default_value = "docmirror@localhost")]
    pub(crate) committer_email: String,

    /// Token embedded into https remote URLs for push, pull and verification.
    #[arg(long, env = "DOCMIRROR_REMOTE_TOKEN", hide_env_values = true)]
    pub(crate) remote_token: Option<String>,

    /// Actor recorded in commit messages when a call names none.
    #[arg(long, env = "DOCMIRROR_ACTOR_ID", default_value = "system")]
    pub(crate) actor_id: String,

    #[arg(long, env = "DOCMIRROR_ACTOR_NAME", default_value = "docmirror")]
    pub(crate) actor_name: String,

    /// tracing filter directive, e.g. `info` or `dm_vcs=debug`.
    #[arg(long, env = "DOCMIRROR_LOG", default_value = "info")]
    pub(crate) log: String,
}

impl Args {
    pub(crate) fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            storage_dir: self.storage_dir.clone(),
            git: GitConfig {
                program: self.git_bin.clone(),
                timeout: Duration::from_secs(self.git_timeout_secs.max(1)),
                committer_name: self.committer_name.clone(),
                committer_email: self.committer_email.clone(),
                remote_token: self
                    .remote_token
                    .as_deref()
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(str::to_string),
            },
            actor: Actor::new(self.actor_id.trim(), self.actor_name.trim()),
        }
    }
}
