#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("unknown repository {0}")]
    UnknownRepository(i64),
    #[error("unknown branch {0}")]
    UnknownBranch(String),
    #[error("unknown parent doc {0}")]
    UnknownParent(i64),
    #[error("unknown doc {0}")]
    UnknownDoc(i64),
    #[error("unknown block {0}")]
    UnknownBlock(i64),
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownRepository(_)
                | Self::UnknownBranch(_)
                | Self::UnknownParent(_)
                | Self::UnknownDoc(_)
                | Self::UnknownBlock(_)
        )
    }
}
