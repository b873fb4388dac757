#![forbid(unsafe_code)]

//! Mirror of branch contents into git working copies.
//!
//! [`GitGateway`] owns one working directory per repository and hands out
//! [`WorkingCopy`] leases; all git invocations go through a leased copy. The projector
//! and importer convert between a stored branch and a directory tree.

mod error;
mod gateway;
mod importer;
mod mirror;
mod process;
mod projector;
mod remote;
mod status;
mod verify;

pub use error::GitError;
pub use gateway::{GitConfig, GitGateway, WorkingCopy};
pub use importer::import_tree;
pub use mirror::replace_contents;
pub use projector::{ProjectionReport, project};
pub use remote::{authenticated_url, redact_text, redact_url};
pub use status::{LastCommit, VcsStatus};
pub use verify::RemoteInfo;
