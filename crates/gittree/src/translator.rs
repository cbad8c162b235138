use crate::cache::{HunkCache, Hunks};
use crate::client::VcsClient;
use crate::error::{GitTreeError, Result};
use crate::hunk;
use codenav_protocol::{Position, Range};
use std::sync::Arc;

/// The repository, commit and path a request was made against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationContext {
    pub repository_id: i64,
    pub repository_name: String,
    pub commit: String,
    pub path: String,
}

/// A translated value together with the path it applies to in the target commit.
/// Paths are carried through unchanged: renames are not followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated<T> {
    pub path: String,
    pub value: T,
}

/// Translates positions and ranges of one repository between commits using
/// the diff of the file between them.
///
/// The translator is bound to the commit and path of a request; the
/// `get_target_commit_*` methods translate between that commit and another
/// one, `reverse` choosing the direction.
#[derive(Clone)]
pub struct GitTreeTranslator {
    client: Arc<dyn VcsClient>,
    hunk_cache: Option<Arc<HunkCache>>,
    local: TranslationContext,
}

impl GitTreeTranslator {
    /// `hunk_cache: None` fetches the diff from `client` on every call
    pub fn new(
        client: Arc<dyn VcsClient>,
        hunk_cache: Option<Arc<HunkCache>>,
        local: TranslationContext,
    ) -> Self {
        Self {
            client,
            hunk_cache,
            local,
        }
    }

    pub fn context(&self) -> &TranslationContext {
        &self.local
    }

    /// The commit the translator is bound to
    pub fn source_commit(&self) -> &str {
        &self.local.commit
    }

    /// Translate `position` of the request path from the request commit to `commit`,
    /// or from `commit` to the request commit when `reverse` is set.
    pub async fn get_target_commit_position_from_source_position(
        &self,
        commit: &str,
        position: Position,
        reverse: bool,
    ) -> Result<Option<Translated<Position>>> {
        let path = self.local.path.clone();
        let (from, to) = self.direction(commit, reverse);
        Ok(self
            .translate_position(from, to, &path, position)
            .await?
            .map(|value| Translated { path, value }))
    }

    /// Translate `range` of `path` from the request commit to `commit`, or from
    /// `commit` to the request commit when `reverse` is set.
    pub async fn get_target_commit_range_from_source_range(
        &self,
        commit: &str,
        path: &str,
        range: Range,
        reverse: bool,
    ) -> Result<Option<Translated<Range>>> {
        let (from, to) = self.direction(commit, reverse);
        Ok(self
            .translate_range(from, to, path, range)
            .await?
            .map(|value| Translated {
                path: path.to_string(),
                value,
            }))
    }

    /// Translate a position of `path` at `from_commit` into `to_commit`.
    /// `Ok(None)` means the line was edited and has no precise counterpart.
    pub async fn translate_position(
        &self,
        from_commit: &str,
        to_commit: &str,
        path: &str,
        position: Position,
    ) -> Result<Option<Position>> {
        if from_commit == to_commit {
            return Ok(Some(position));
        }
        let hunks = self.read_cached_hunks(from_commit, to_commit, path).await?;
        hunk::translate_position(&hunks, position)
    }

    pub async fn translate_range(
        &self,
        from_commit: &str,
        to_commit: &str,
        path: &str,
        range: Range,
    ) -> Result<Option<Range>> {
        if from_commit == to_commit {
            return Ok(Some(range));
        }
        let hunks = self.read_cached_hunks(from_commit, to_commit, path).await?;
        hunk::translate_range(&hunks, range)
    }

    fn direction<'a>(&'a self, commit: &'a str, reverse: bool) -> (&'a str, &'a str) {
        if reverse {
            (commit, self.local.commit.as_str())
        } else {
            (self.local.commit.as_str(), commit)
        }
    }

    async fn read_cached_hunks(
        &self,
        source_commit: &str,
        target_commit: &str,
        path: &str,
    ) -> Result<Hunks> {
        let Some(cache) = &self.hunk_cache else {
            return self.read_hunks(source_commit, target_commit, path).await;
        };

        let key = HunkCache::key(self.local.repository_id, source_commit, target_commit, path);
        if let Some(hunks) = cache.get(&key) {
            return Ok(hunks);
        }

        let hunks = self.read_hunks(source_commit, target_commit, path).await?;
        cache.set(key, hunks.clone());
        Ok(hunks)
    }

    async fn read_hunks(
        &self,
        source_commit: &str,
        target_commit: &str,
        path: &str,
    ) -> Result<Hunks> {
        let hunks = self
            .client
            .diff_hunks(
                &self.local.repository_name,
                source_commit,
                target_commit,
                path,
            )
            .await
            .map_err(|err| GitTreeError::backend("vcs.diff_hunks", &err))?;
        log::debug!(
            "fetched {} hunks for {path} between {source_commit} and {target_commit}",
            hunks.len()
        );
        Ok(hunks.into())
    }
}
