#![forbid(unsafe_code)]

use dm_storage::StoreError;
use dm_vcs::GitError;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PolicyViolation,
    InvalidInput,
    External,
    Internal,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("branch {0} is read-only")]
    ReadOnlyBranch(String),
    #[error("{0}")]
    Policy(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ReadOnlyBranch(_) | Self::Policy(_) => ErrorKind::PolicyViolation,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Store(err) if err.is_not_found() => ErrorKind::NotFound,
            Self::Store(StoreError::InvalidInput(_)) => ErrorKind::InvalidInput,
            Self::Store(_) | Self::Io(_) => ErrorKind::Internal,
            Self::Git(_) => ErrorKind::External,
        }
    }

    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}
