//! In-memory collaborators for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use codenav::{
    CodeNavConfig, CodeNavService, Collaborators, DocumentStore, LocationKey, LocationKind,
    Operations, ReferencingUploads, RepoRegistry, UploadRegistry,
};
use codenav_gittree::{Hunk, VcsClient};
use codenav_protocol::{
    CodeIntelligenceRange, Diagnostic, Document, Location, MonikerData, Position, QualifiedMoniker,
    Range, RepoCommit, Upload,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn upload(id: i64, repository_id: i64, commit: &str, root: &str) -> Upload {
    Upload {
        id,
        repository_id,
        repository_name: format!("github.com/acme/repo-{repository_id}"),
        commit: commit.to_string(),
        root: root.to_string(),
        indexer: "scip-go".to_string(),
    }
}

pub fn location(upload_id: i64, path: &str, line: u32) -> Location {
    Location::new(upload_id, path, Range::from_coords(line, 4, line, 10))
}

/// A remote location reachable through `identifier` in `table`
#[derive(Debug, Clone)]
pub struct MonikerLocation {
    pub table: String,
    pub identifier: String,
    pub location: Location,
}

#[derive(Default)]
pub struct FakeDocuments {
    pub documents: HashMap<(i64, String), Document>,
    /// Keyed by upload id, path and line of the queried position
    pub local: HashMap<(i64, String, u32), (Vec<Location>, Vec<String>)>,
    pub moniker_locations: Vec<MonikerLocation>,
    pub hovers: HashMap<(i64, String, u32), (String, Range)>,
    pub monikers: HashMap<(i64, String, u32), Vec<QualifiedMoniker>>,
    /// Keyed by upload id and path relative to the upload root
    pub diagnostics: HashMap<(i64, String), Vec<Diagnostic>>,
    pub ranges: HashMap<(i64, String), Vec<CodeIntelligenceRange>>,
    pub stencils: HashMap<(i64, String), Vec<Range>>,
    pub bulk_calls: AtomicUsize,
}

#[async_trait]
impl DocumentStore for FakeDocuments {
    async fn scip_document(&self, upload_id: i64, path: &str) -> anyhow::Result<Option<Document>> {
        Ok(self.documents.get(&(upload_id, path.to_string())).cloned())
    }

    async fn extract_locations_and_symbols(
        &self,
        _kind: LocationKind,
        key: &LocationKey,
    ) -> anyhow::Result<(Vec<Location>, Vec<String>)> {
        Ok(self
            .local
            .get(&(key.upload_id, key.path.clone(), key.position.line))
            .cloned()
            .unwrap_or_default())
    }

    async fn bulk_moniker_locations(
        &self,
        table: &str,
        upload_ids: &[i64],
        monikers: &[MonikerData],
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<(Vec<Location>, usize)> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        let identifiers: HashSet<&str> = monikers.iter().map(|m| m.identifier.as_str()).collect();
        let mut matching: Vec<Location> = self
            .moniker_locations
            .iter()
            .filter(|entry| {
                entry.table == table
                    && upload_ids.contains(&entry.location.upload_id)
                    && identifiers.contains(entry.identifier.as_str())
            })
            .map(|entry| entry.location.clone())
            .collect();
        matching.sort();
        let total = matching.len();
        Ok((
            matching.into_iter().skip(offset).take(limit).collect(),
            total,
        ))
    }

    async fn hover(
        &self,
        upload_id: i64,
        path: &str,
        position: Position,
    ) -> anyhow::Result<Option<(String, Range)>> {
        Ok(self
            .hovers
            .get(&(upload_id, path.to_string(), position.line))
            .cloned())
    }

    async fn monikers_at_position(
        &self,
        upload_id: i64,
        path: &str,
        position: Position,
    ) -> anyhow::Result<Vec<QualifiedMoniker>> {
        Ok(self
            .monikers
            .get(&(upload_id, path.to_string(), position.line))
            .cloned()
            .unwrap_or_default())
    }

    async fn diagnostics(
        &self,
        upload_id: i64,
        path_prefix: &str,
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<(Vec<Diagnostic>, usize)> {
        let all = self
            .diagnostics
            .get(&(upload_id, path_prefix.to_string()))
            .cloned()
            .unwrap_or_default();
        let total = all.len();
        Ok((all.into_iter().skip(offset).take(limit).collect(), total))
    }

    async fn ranges(
        &self,
        upload_id: i64,
        path: &str,
        start_line: u32,
        end_line: u32,
    ) -> anyhow::Result<Vec<CodeIntelligenceRange>> {
        Ok(self
            .ranges
            .get(&(upload_id, path.to_string()))
            .map(|ranges| {
                ranges
                    .iter()
                    .filter(|r| (start_line..end_line).contains(&r.range.start.line))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn stencil(&self, upload_id: i64, path: &str) -> anyhow::Result<Vec<Range>> {
        Ok(self
            .stencils
            .get(&(upload_id, path.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeUploads {
    pub uploads: Vec<Upload>,
    /// Moniker identifier -> defining upload ids
    pub definitions: HashMap<String, Vec<i64>>,
    /// Moniker identifier -> referencing upload ids
    pub references: HashMap<String, Vec<i64>>,
    pub reference_pages: Mutex<Vec<usize>>,
}

impl FakeUploads {
    fn by_ids(&self, ids: &BTreeSet<i64>) -> Vec<Upload> {
        self.uploads
            .iter()
            .filter(|upload| ids.contains(&upload.id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UploadRegistry for FakeUploads {
    async fn dumps_by_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<Upload>> {
        Ok(self.by_ids(&ids.iter().copied().collect()))
    }

    async fn dumps_with_definitions_for_monikers(
        &self,
        monikers: &[QualifiedMoniker],
    ) -> anyhow::Result<Vec<Upload>> {
        let ids: BTreeSet<i64> = monikers
            .iter()
            .filter_map(|m| self.definitions.get(&m.moniker.identifier))
            .flatten()
            .copied()
            .collect();
        Ok(self.by_ids(&ids))
    }

    async fn upload_ids_with_references(
        &self,
        monikers: &[QualifiedMoniker],
        exclude_ids: &[i64],
        _repository_id: i64,
        _commit: &str,
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<ReferencingUploads> {
        self.reference_pages.lock().expect("pages lock").push(offset);
        let candidates: Vec<i64> = monikers
            .iter()
            .filter_map(|m| self.references.get(&m.moniker.identifier))
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let page: Vec<i64> = candidates.iter().copied().skip(offset).take(limit).collect();
        Ok(ReferencingUploads {
            ids: page.iter().copied().filter(|id| !exclude_ids.contains(id)).collect(),
            scanned: page.len(),
            total: candidates.len(),
        })
    }
}

#[derive(Default)]
pub struct FakeVcs {
    pub diffs: HashMap<(String, String, String), Vec<Hunk>>,
    /// Commits unknown to the backend; everything else exists
    pub missing_commits: HashSet<String>,
    pub diff_calls: AtomicUsize,
    pub exist_calls: AtomicUsize,
}

impl FakeVcs {
    pub fn with_diff(mut self, source: &str, target: &str, path: &str, hunks: Vec<Hunk>) -> Self {
        self.diffs.insert(
            (source.to_string(), target.to_string(), path.to_string()),
            hunks,
        );
        self
    }
}

#[async_trait]
impl VcsClient for FakeVcs {
    async fn diff_hunks(
        &self,
        _repository_name: &str,
        source_commit: &str,
        target_commit: &str,
        path: &str,
    ) -> anyhow::Result<Vec<Hunk>> {
        self.diff_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .diffs
            .get(&(
                source_commit.to_string(),
                target_commit.to_string(),
                path.to_string(),
            ))
            .cloned()
            .unwrap_or_default())
    }

    async fn commits_exist(&self, commits: &[RepoCommit]) -> anyhow::Result<Vec<bool>> {
        self.exist_calls.fetch_add(1, Ordering::SeqCst);
        Ok(commits
            .iter()
            .map(|rc| !self.missing_commits.contains(&rc.commit))
            .collect())
    }
}

pub struct FakeRepos;

#[async_trait]
impl RepoRegistry for FakeRepos {
    async fn repos_by_ids(&self, ids: &[i64]) -> anyhow::Result<HashMap<i64, String>> {
        Ok(ids
            .iter()
            .map(|&id| (id, format!("github.com/acme/repo-{id}")))
            .collect())
    }
}

pub struct Fixture {
    pub documents: Arc<FakeDocuments>,
    pub uploads: Arc<FakeUploads>,
    pub vcs: Arc<FakeVcs>,
    pub operations: Arc<Operations>,
    pub service: CodeNavService,
}

impl Fixture {
    pub fn new(
        documents: FakeDocuments,
        uploads: FakeUploads,
        vcs: FakeVcs,
        config: CodeNavConfig,
    ) -> Self {
        init_logging();
        let documents = Arc::new(documents);
        let uploads = Arc::new(uploads);
        let vcs = Arc::new(vcs);
        let operations = Arc::new(Operations::new());
        let service = CodeNavService::new(
            config,
            Collaborators {
                documents: documents.clone(),
                uploads: uploads.clone(),
                vcs: vcs.clone(),
                repos: Arc::new(FakeRepos),
            },
            operations.clone(),
        )
        .expect("valid config");
        Self {
            documents,
            uploads,
            vcs,
            operations,
            service,
        }
    }
}
