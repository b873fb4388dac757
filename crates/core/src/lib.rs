#![forbid(unsafe_code)]

pub mod batch;
pub mod naming;
pub mod structure;
pub mod tree;

pub const MAIN_BRANCH: &str = "main";

pub mod ids {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct RepoId(i64);

    impl RepoId {
        pub fn new(value: i64) -> Self {
            Self(value)
        }

        pub fn get(self) -> i64 {
            self.0
        }

        /// Commit scope used as the prefix of generated commit messages.
        pub fn scope(self) -> String {
            format!("repo-{}", self.0)
        }
    }

    impl std::fmt::Display for RepoId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct BranchName(String);

    impl BranchName {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn main() -> Self {
            Self(super::MAIN_BRANCH.to_string())
        }

        pub fn is_main(&self) -> bool {
            self.0 == super::MAIN_BRANCH
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, BranchNameError> {
            let value = value.into();
            validate_branch_name(&value)?;
            Ok(Self(value))
        }
    }

    impl std::fmt::Display for BranchName {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum BranchNameError {
        Empty,
        TooLong,
        InvalidStart,
        InvalidEnd,
        DoubleDot,
        EmptyComponent,
        InvalidChar { ch: char, index: usize },
    }

    impl BranchNameError {
        pub fn message(&self) -> String {
            match self {
                Self::Empty => "branch name must not be empty".to_string(),
                Self::TooLong => "branch name is too long".to_string(),
                Self::InvalidStart => "branch name must not start with '-', '/' or '.'".to_string(),
                Self::InvalidEnd => "branch name must not end with '/' or '.lock'".to_string(),
                Self::DoubleDot => "branch name must not contain '..'".to_string(),
                Self::EmptyComponent => "branch name must not contain '//'".to_string(),
                Self::InvalidChar { ch, index } => {
                    format!("branch name contains invalid character {ch:?} at {index}")
                }
            }
        }
    }

    fn validate_branch_name(value: &str) -> Result<(), BranchNameError> {
        if value.is_empty() {
            return Err(BranchNameError::Empty);
        }
        if value.len() > 100 {
            return Err(BranchNameError::TooLong);
        }
        if value.starts_with(['-', '/', '.']) {
            return Err(BranchNameError::InvalidStart);
        }
        if value.ends_with('/') || value.ends_with(".lock") {
            return Err(BranchNameError::InvalidEnd);
        }
        if value.contains("..") {
            return Err(BranchNameError::DoubleDot);
        }
        if value.contains("//") {
            return Err(BranchNameError::EmptyComponent);
        }
        for (index, ch) in value.chars().enumerate() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/') {
                continue;
            }
            return Err(BranchNameError::InvalidChar { ch, index });
        }
        Ok(())
    }
}

pub mod model {
    use crate::ids::{BranchName, RepoId};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum NodeKind {
        Doc,
        Block,
    }

    impl NodeKind {
        pub fn as_str(self) -> &'static str {
            match self {
                NodeKind::Doc => "doc",
                NodeKind::Block => "block",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim() {
                "doc" => Some(NodeKind::Doc),
                "block" => Some(NodeKind::Block),
                _ => None,
            }
        }
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub enum DisplayMode {
        #[default]
        Tree,
        List,
    }

    impl DisplayMode {
        pub fn as_str(self) -> &'static str {
            match self {
                DisplayMode::Tree => "tree",
                DisplayMode::List => "list",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim() {
                "tree" => Some(DisplayMode::Tree),
                "list" => Some(DisplayMode::List),
                _ => None,
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Repository {
        pub id: RepoId,
        pub title: String,
        pub description: String,
        pub current_branch: BranchName,
        pub branches: Vec<BranchName>,
        pub remote_url: Option<String>,
        pub display_mode: DisplayMode,
        pub created_at_ms: i64,
    }

    impl Repository {
        pub fn knows_branch(&self, branch: &BranchName) -> bool {
            self.branches.iter().any(|known| known == branch)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Doc {
        pub id: i64,
        pub repo_id: RepoId,
        pub branch: BranchName,
        pub parent_id: Option<i64>,
        pub title: String,
        pub body: String,
        pub order: i64,
        pub path: String,
        pub updated_at_ms: i64,
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Block {
        pub id: i64,
        pub repo_id: RepoId,
        pub branch: BranchName,
        pub doc_id: i64,
        pub title: String,
        pub body: String,
        pub order: i64,
        pub updated_at_ms: i64,
    }

    /// Everything the projector needs to render one branch.
    #[derive(Clone, Debug)]
    pub struct BranchSnapshot {
        pub repository: Repository,
        pub branch: BranchName,
        pub docs: Vec<Doc>,
        pub blocks: Vec<Block>,
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Actor {
        pub id: String,
        pub name: String,
    }

    impl Actor {
        pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                name: name.into(),
            }
        }
    }

    /// Where a branch stands between the store and its VCS mirror.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub enum SyncState {
        #[default]
        Clean,
        Dirty,
        Committed,
        Pushed,
        Unsynced,
    }

    impl SyncState {
        pub fn as_str(self) -> &'static str {
            match self {
                SyncState::Clean => "clean",
                SyncState::Dirty => "dirty",
                SyncState::Committed => "committed",
                SyncState::Pushed => "pushed",
                SyncState::Unsynced => "unsynced",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value {
                "clean" => Some(SyncState::Clean),
                "dirty" => Some(SyncState::Dirty),
                "committed" => Some(SyncState::Committed),
                "pushed" => Some(SyncState::Pushed),
                "unsynced" => Some(SyncState::Unsynced),
                _ => None,
            }
        }
    }

    pub fn root_path(id: i64) -> String {
        format!("/{id}")
    }

    pub fn child_path(parent_path: &str, id: i64) -> String {
        format!("{parent_path}/{id}")
    }

    /// `<scope>/<actor-id>/<actor-name>`, with `: <message>` appended when a custom message
    /// is supplied.
    pub fn commit_message(repo: RepoId, actor: &Actor, custom: Option<&str>) -> String {
        let prefix = format!("{}/{}/{}", repo.scope(), actor.id, actor.name);
        match custom.map(str::trim) {
            Some(message) if !message.is_empty() => format!("{prefix}: {message}"),
            _ => prefix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ids::{BranchName, BranchNameError, RepoId};
    use super::model::{Actor, child_path, commit_message, root_path};

    #[test]
    fn branch_name_validation() {
        assert_eq!(BranchName::try_new("").unwrap_err(), BranchNameError::Empty);
        assert_eq!(
            BranchName::try_new("-x").unwrap_err(),
            BranchNameError::InvalidStart
        );
        assert_eq!(
            BranchName::try_new("a..b").unwrap_err(),
            BranchNameError::DoubleDot
        );
        assert_eq!(
            BranchName::try_new("feat.lock").unwrap_err(),
            BranchNameError::InvalidEnd
        );
        assert!(matches!(
            BranchName::try_new("has space").unwrap_err(),
            BranchNameError::InvalidChar { ch: ' ', index: 3 }
        ));
        assert!(BranchName::try_new("feature/x-1").is_ok());
        assert!(BranchName::main().is_main());
    }

    #[test]
    fn materialized_paths() {
        assert_eq!(root_path(4), "/4");
        assert_eq!(child_path("/4", 9), "/4/9");
    }

    #[test]
    fn commit_message_defaults_and_prefixes() {
        let actor = Actor::new("u7", "Ada");
        let repo = RepoId::new(3);
        assert_eq!(commit_message(repo, &actor, None), "repo-3/u7/Ada");
        assert_eq!(commit_message(repo, &actor, Some("  ")), "repo-3/u7/Ada");
        assert_eq!(
            commit_message(repo, &actor, Some("tidy intro")),
            "repo-3/u7/Ada: tidy intro"
        );
    }
}
