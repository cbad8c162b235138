use crate::hunk::Hunk;
use async_trait::async_trait;
use codenav_protocol::RepoCommit;

/// The slice of the version control backend the translation layer needs
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Hunks of `path` between `source_commit` (original side) and `target_commit`
    /// (new side), ordered by original start line. No changes is an empty vector.
    async fn diff_hunks(
        &self,
        repository_name: &str,
        source_commit: &str,
        target_commit: &str,
        path: &str,
    ) -> anyhow::Result<Vec<Hunk>>;

    /// For each pair, whether the commit exists. The result is positionally
    /// aligned with `commits` and must have the same length.
    async fn commits_exist(&self, commits: &[RepoCommit]) -> anyhow::Result<Vec<bool>>;
}
