use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitTreeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitTreeError {
    /// The version control backend failed to produce a diff
    #[error("{context}: {message}")]
    Backend { context: String, message: String },

    /// A hunk body is shorter than its own header claims.
    /// This is a contract breach between the diff producer and the translator.
    #[error("Malformed hunk body: {0}")]
    MalformedHunk(String),

    #[error("Invalid diff: {0}")]
    InvalidDiff(String),
}

impl GitTreeError {
    pub fn backend(context: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Backend {
            context: context.into(),
            message: format!("{err:#}"),
        }
    }

    /// True for errors that indicate broken invariants rather than I/O trouble
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::MalformedHunk(_))
    }
}
