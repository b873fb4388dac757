#![forbid(unsafe_code)]

use crate::error::GitError;
use crate::gateway::{GitGateway, REMOTE_NAME};
use crate::remote::redact_url;
use tempfile::TempDir;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteInfo {
    pub url: String,
    pub branches: Vec<String>,
}

impl GitGateway {
    /// Clone `url` into a scratch directory to prove it is reachable and list its branches.
    /// The scratch directory is removed when this returns.
    pub fn verify_remote(&self, url: &str) -> Result<RemoteInfo, GitError> {
        let scratch = TempDir::new()?;
        let target = self.remote_url_for(url);
        let shown = redact_url(url);

        self.runner().run(
            scratch.path(),
            &["clone", "--quiet", "--no-checkout", &target, "mirror"],
        )?;
        let listing = self
            .runner()
            .run(&scratch.path().join("mirror"), &["branch", "-r"])?;

        let prefix = format!("{REMOTE_NAME}/");
        let mut branches: Vec<String> = listing
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.contains("->"))
            .map(|line| line.strip_prefix(&prefix).unwrap_or(line).to_string())
            .collect();
        branches.sort();

        tracing::info!(remote = %shown, branches = branches.len(), "remote verified");
        Ok(RemoteInfo {
            url: shown,
            branches,
        })
    }
}
