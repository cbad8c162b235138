//! Memoized "does this commit exist" answers for `(repository, commit)` pairs.
//!
//! Lookups take the read lock only; misses are resolved against the repo
//! registry and the VCS backend with no lock held, in one batched call, and
//! written back under the write lock. A pair learned to be resolvable is never
//! downgraded.

use crate::error::{CodeNavError, Result};
use crate::stores::RepoRegistry;
use codenav_gittree::VcsClient;
use codenav_protocol::{RepoCommit, RepositoryCommit};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

pub struct CommitCache {
    repos: Arc<dyn RepoRegistry>,
    vcs: Arc<dyn VcsClient>,
    cache: RwLock<HashMap<i64, HashMap<String, bool>>>,
}

impl CommitCache {
    pub fn new(repos: Arc<dyn RepoRegistry>, vcs: Arc<dyn VcsClient>) -> Self {
        Self {
            repos,
            vcs,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Whether each pair exists, positionally aligned with `commits`
    pub async fn exists_batch(&self, commits: &[RepositoryCommit]) -> Result<Vec<bool>> {
        let mut exists = vec![false; commits.len()];
        let mut missing = Vec::new();
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            for (idx, rc) in commits.iter().enumerate() {
                match cache.get(&rc.repository_id).and_then(|by_commit| by_commit.get(&rc.commit)) {
                    Some(&known) => exists[idx] = known,
                    None => missing.push(idx),
                }
            }
        }
        if missing.is_empty() {
            return Ok(exists);
        }

        let learned = self.resolve(commits, &missing).await?;

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        for (idx, resolvable) in learned {
            exists[idx] = resolvable;
            let rc = &commits[idx];
            let entry = cache
                .entry(rc.repository_id)
                .or_default()
                .entry(rc.commit.clone())
                .or_insert(false);
            *entry |= resolvable;
        }
        Ok(exists)
    }

    /// Same as [`exists_batch`](Self::exists_batch)
    pub async fn are_commits_resolvable(&self, commits: &[RepositoryCommit]) -> Result<Vec<bool>> {
        self.exists_batch(commits).await
    }

    /// Record a pair as resolvable without asking the backend
    pub fn set_resolvable_commit(&self, repository_id: i64, commit: &str) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(repository_id)
            .or_default()
            .insert(commit.to_string(), true);
    }

    /// Answers for the `missing` positions of `commits`
    async fn resolve(
        &self,
        commits: &[RepositoryCommit],
        missing: &[usize],
    ) -> Result<Vec<(usize, bool)>> {
        let mut repository_ids: Vec<i64> =
            missing.iter().map(|&idx| commits[idx].repository_id).collect();
        repository_ids.sort_unstable();
        repository_ids.dedup();

        let names = self
            .repos
            .repos_by_ids(&repository_ids)
            .await
            .map_err(|err| CodeNavError::backend("repo_registry.repos_by_ids", &err))?;

        // One backend slot per distinct (name, commit)
        let mut batch: Vec<RepoCommit> = Vec::new();
        let mut slots: HashMap<(String, String), usize> = HashMap::new();
        let mut slot_of: Vec<Option<usize>> = Vec::with_capacity(missing.len());
        let mut unknown_repos = HashSet::new();
        for &idx in missing {
            let rc = &commits[idx];
            let Some(name) = names.get(&rc.repository_id) else {
                unknown_repos.insert(rc.repository_id);
                slot_of.push(None);
                continue;
            };
            let key = (name.clone(), rc.commit.clone());
            let slot = *slots.entry(key).or_insert_with(|| {
                batch.push(RepoCommit {
                    repo: name.clone(),
                    commit: rc.commit.clone(),
                });
                batch.len() - 1
            });
            slot_of.push(Some(slot));
        }
        if !unknown_repos.is_empty() {
            log::debug!("commit cache: {} repositories could not be resolved", unknown_repos.len());
        }

        let answers = if batch.is_empty() {
            Vec::new()
        } else {
            self.vcs
                .commits_exist(&batch)
                .await
                .map_err(|err| CodeNavError::backend("vcs.commits_exist", &err))?
        };
        if answers.len() != batch.len() {
            log::error!(
                "commits_exist returned {} results for {} commits",
                answers.len(),
                batch.len()
            );
            return Err(CodeNavError::InvariantViolation(format!(
                "expected {} commit existence results, got {}",
                batch.len(),
                answers.len()
            )));
        }

        Ok(missing
            .iter()
            .zip(slot_of)
            .map(|(&idx, slot)| (idx, slot.is_some_and(|slot| answers[slot])))
            .collect())
    }
}
