use std::path::PathBuf;

/// Failures a single run can end with.
///
/// `Configuration` and `FileUpdate` happen before any git command is issued.
/// `Push` is the only variant that leaves a local commit behind.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0}")]
    Configuration(String),
    #[error("failed to update {}: {source}", path.display())]
    FileUpdate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("repository missing: {0}")]
    RepositoryMissing(String),
    #[error("wrong branch: HEAD is on '{actual}', configured branch is '{expected}'")]
    WrongBranch { expected: String, actual: String },
    #[error("staging failed: {0}")]
    Staging(String),
    #[error("commit failed: {0}")]
    Commit(String),
    #[error("push failed: {0}")]
    Push(String),
}

impl RunError {
    /// Whether the run can still count a local commit after this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Push(_))
    }

    /// Whether the error was raised before the repository was touched
    pub fn is_pre_repository(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::FileUpdate { .. })
    }
}

pub type RunOutcome<T> = Result<T, RunError>;
