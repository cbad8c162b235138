use codenav_gittree::GitTreeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodeNavError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeNavError {
    /// A collaborator (document store, upload registry, VCS, repo registry) failed
    #[error("{context}: {message}")]
    Backend { context: String, message: String },

    /// The uploads visible to a paginated query changed between pages.
    /// Callers should restart pagination from an empty cursor.
    #[error("result set changed while paginating")]
    ConcurrentModification,

    /// Two layers disagree about a contract (batched result lengths, hunk bodies)
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CodeNavError {
    pub fn backend(context: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Backend {
            context: context.into(),
            message: format!("{err:#}"),
        }
    }

    pub fn is_concurrent_modification(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

impl From<GitTreeError> for CodeNavError {
    fn from(err: GitTreeError) -> Self {
        match err {
            GitTreeError::Backend { context, message } => Self::Backend {
                context: format!("git tree translator: {context}"),
                message,
            },
            GitTreeError::MalformedHunk(message) => Self::InvariantViolation(message),
            GitTreeError::InvalidDiff(message) => Self::Backend {
                context: "git tree translator: diff".to_string(),
                message,
            },
        }
    }
}
