//! Capability traits for the collaborators the service reads from.
//!
//! Each trait is narrow enough to be replaced by an in-memory fake. All of
//! them report failures as `anyhow::Error`; the service wraps those with the
//! call site before handing them to its caller.

use async_trait::async_trait;
use codenav_protocol::{
    CodeIntelligenceRange, Diagnostic, Document, Location, MonikerData, Position, QualifiedMoniker,
    Range, Upload,
};
use std::collections::HashMap;

/// The kind of location a query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    Definitions,
    References,
    Implementations,
    Prototypes,
}

impl LocationKind {
    /// Table searched by the moniker lookup, `None` for local-only kinds
    pub fn remote_table(self) -> Option<&'static str> {
        match self {
            Self::References => Some("references"),
            Self::Implementations => Some("implementations"),
            Self::Definitions | Self::Prototypes => None,
        }
    }

    pub fn has_remote_phase(self) -> bool {
        self.remote_table().is_some()
    }

    /// Whether uploads that merely reference a moniker are searched as well as
    /// the ones defining it
    pub fn includes_referencing_indexes(self) -> bool {
        matches!(self, Self::References | Self::Implementations)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Definitions => "definitions",
            Self::References => "references",
            Self::Implementations => "implementations",
            Self::Prototypes => "prototypes",
        }
    }
}

/// A position inside one upload, in that upload's own coordinates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey {
    pub upload_id: i64,
    /// Relative to the upload root
    pub path: String,
    pub position: Position,
}

/// One page of uploads referencing a set of monikers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencingUploads {
    pub ids: Vec<i64>,
    /// Candidate uploads examined for this page, whether or not they matched
    pub scanned: usize,
    pub total: usize,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The SCIP document of `path` (relative to the upload root), `None` when absent
    async fn scip_document(&self, upload_id: i64, path: &str) -> anyhow::Result<Option<Document>>;

    /// Locations of `kind` reachable from `key` inside the same index, and the
    /// names of the symbols found at `key`
    async fn extract_locations_and_symbols(
        &self,
        kind: LocationKind,
        key: &LocationKey,
    ) -> anyhow::Result<(Vec<Location>, Vec<String>)>;

    /// Locations in `upload_ids` carrying any of `monikers`, skipping `offset`
    /// and returning at most `limit`, plus the total number of matches
    async fn bulk_moniker_locations(
        &self,
        table: &str,
        upload_ids: &[i64],
        monikers: &[MonikerData],
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<(Vec<Location>, usize)>;

    /// Hover text and the enclosing range at `position`, `None` when nothing is attached
    async fn hover(
        &self,
        upload_id: i64,
        path: &str,
        position: Position,
    ) -> anyhow::Result<Option<(String, Range)>>;

    /// Monikers attached to the ranges enclosing `position`, innermost first
    async fn monikers_at_position(
        &self,
        upload_id: i64,
        path: &str,
        position: Position,
    ) -> anyhow::Result<Vec<QualifiedMoniker>>;

    /// Diagnostics of documents under `path_prefix`, skipping `offset` and
    /// returning at most `limit`, plus the total number available
    async fn diagnostics(
        &self,
        upload_id: i64,
        path_prefix: &str,
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<(Vec<Diagnostic>, usize)>;

    /// Range summaries of `path` starting within `[start_line, end_line)`
    async fn ranges(
        &self,
        upload_id: i64,
        path: &str,
        start_line: u32,
        end_line: u32,
    ) -> anyhow::Result<Vec<CodeIntelligenceRange>>;

    /// Every range in `path` the index has precise data for
    async fn stencil(&self, upload_id: i64, path: &str) -> anyhow::Result<Vec<Range>>;
}

#[async_trait]
pub trait UploadRegistry: Send + Sync {
    async fn dumps_by_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<Upload>>;

    async fn dumps_with_definitions_for_monikers(
        &self,
        monikers: &[QualifiedMoniker],
    ) -> anyhow::Result<Vec<Upload>>;

    /// Page through uploads referencing `monikers` as seen from `commit` of
    /// `repository_id`, excluding `exclude_ids`
    async fn upload_ids_with_references(
        &self,
        monikers: &[QualifiedMoniker],
        exclude_ids: &[i64],
        repository_id: i64,
        commit: &str,
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<ReferencingUploads>;
}

#[async_trait]
pub trait RepoRegistry: Send + Sync {
    /// Names of the repositories that exist; unknown ids are absent from the map
    async fn repos_by_ids(&self, ids: &[i64]) -> anyhow::Result<HashMap<i64, String>>;
}
