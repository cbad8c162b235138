use crate::commit_cache::CommitCache;
use crate::config::CodeNavConfig;
use crate::error::{CodeNavError, Result};
use crate::mapped::MappedIndex;
use crate::operations::Operations;
use crate::request_state::{PositionalRequestArgs, RequestState};
use crate::stores::{DocumentStore, LocationKind, RepoRegistry, UploadRegistry};
use crate::visible::{get_upload_paths, get_visible_uploads, VisibleUpload};
use codenav_gittree::{GitTreeTranslator, HunkCache, TranslationContext, VcsClient};
use codenav_protocol::{
    decode_cursor, encode_cursor, Cursor, Location, MonikerData, Position, QualifiedMoniker, Range,
    RepositoryCommit, Upload, UploadLocation,
};
use std::collections::HashSet;
use std::sync::Arc;

/// The backends the service reads from
#[derive(Clone)]
pub struct Collaborators {
    pub documents: Arc<dyn DocumentStore>,
    pub uploads: Arc<dyn UploadRegistry>,
    pub vcs: Arc<dyn VcsClient>,
    pub repos: Arc<dyn RepoRegistry>,
}

/// Hover text for a position and the range to highlight, in request coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hover {
    pub text: String,
    pub range: Range,
}

pub struct CodeNavService {
    pub(crate) config: CodeNavConfig,
    pub(crate) documents: Arc<dyn DocumentStore>,
    pub(crate) uploads: Arc<dyn UploadRegistry>,
    pub(crate) vcs: Arc<dyn VcsClient>,
    pub(crate) commit_cache: Arc<CommitCache>,
    pub(crate) hunk_cache: Option<Arc<HunkCache>>,
    pub(crate) operations: Arc<Operations>,
}

impl CodeNavService {
    pub fn new(
        config: CodeNavConfig,
        collaborators: Collaborators,
        operations: Arc<Operations>,
    ) -> Result<Self> {
        config.validate()?;
        let hunk_cache = (config.hunk_cache_max_cost > 0)
            .then(|| Arc::new(HunkCache::new(config.hunk_cache_max_cost)));
        let commit_cache =
            Arc::new(CommitCache::new(collaborators.repos, collaborators.vcs.clone()));
        log::info!(
            "codenav service ready (hunk cache budget {}, {} indexes per moniker search)",
            config.hunk_cache_max_cost,
            config.maximum_indexes_per_moniker_search
        );
        Ok(Self {
            config,
            documents: collaborators.documents,
            uploads: collaborators.uploads,
            vcs: collaborators.vcs,
            commit_cache,
            hunk_cache,
            operations,
        })
    }

    pub fn config(&self) -> &CodeNavConfig {
        &self.config
    }

    pub fn operations(&self) -> &Operations {
        &self.operations
    }

    pub fn commit_cache(&self) -> &Arc<CommitCache> {
        &self.commit_cache
    }

    pub fn hunk_cache(&self) -> Option<&Arc<HunkCache>> {
        self.hunk_cache.as_ref()
    }

    /// Per-request state for a query at `context`, over the candidate uploads
    /// for its path. The request commit itself is known to exist.
    pub fn request_state(&self, context: TranslationContext, uploads: Vec<Upload>) -> RequestState {
        self.commit_cache
            .set_resolvable_commit(context.repository_id, &context.commit);
        let translator = GitTreeTranslator::new(self.vcs.clone(), self.hunk_cache.clone(), context);
        RequestState::new(uploads, translator, self.commit_cache.clone())
    }

    /// Documents of `upload` presented at the request commit
    pub fn mapped_index(&self, request_state: &RequestState, upload: Upload) -> MappedIndex {
        MappedIndex::new(
            self.documents.clone(),
            request_state.translator.clone(),
            upload,
        )
    }

    pub async fn get_definitions(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        cursor: Cursor,
    ) -> Result<(Vec<UploadLocation>, Cursor)> {
        self.gather_locations(args, request_state, cursor, LocationKind::Definitions)
            .await
    }

    pub async fn get_references(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        cursor: Cursor,
    ) -> Result<(Vec<UploadLocation>, Cursor)> {
        self.gather_locations(args, request_state, cursor, LocationKind::References)
            .await
    }

    pub async fn get_implementations(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        cursor: Cursor,
    ) -> Result<(Vec<UploadLocation>, Cursor)> {
        self.gather_locations(args, request_state, cursor, LocationKind::Implementations)
            .await
    }

    pub async fn get_prototypes(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        cursor: Cursor,
    ) -> Result<(Vec<UploadLocation>, Cursor)> {
        self.gather_locations(args, request_state, cursor, LocationKind::Prototypes)
            .await
    }

    /// Hover text at the request position.
    ///
    /// Text attached in one of the visible uploads wins. Otherwise the import
    /// monikers at the position are followed to the uploads defining them and
    /// the text attached to a definition is returned, still highlighting the
    /// range found in the request document.
    pub async fn get_hover(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
    ) -> Result<Option<Hover>> {
        self.operations.record_request();
        let position = Position::new(args.line, args.character);
        let visible = get_visible_uploads(request_state, position).await?;

        let mut adjusted_ranges = Vec::with_capacity(visible.len());
        for upload in &visible {
            let hover = self
                .documents
                .hover(
                    upload.upload.id,
                    &upload.target_path_without_root,
                    upload.target_position,
                )
                .await
                .map_err(|err| CodeNavError::backend("document_store.hover", &err))?;
            let Some((text, range)) = hover else {
                continue;
            };

            let (_, adjusted, _) = self
                .get_source_range(args, request_state, &upload.upload, &args.path, range)
                .await?;
            if !text.is_empty() {
                return Ok(Some(Hover { text, range: adjusted }));
            }
            adjusted_ranges.push(adjusted);
        }

        // Indexers may leave hover text off external symbols; look at their definitions
        let range = adjusted_ranges.first().copied().unwrap_or_default();
        let monikers = self.get_ordered_monikers(&visible, "import").await?;
        if monikers.is_empty() {
            return Ok(None);
        }

        let defining = self
            .get_uploads_with_definitions_for_monikers(&monikers, request_state)
            .await?;
        let (locations, _) = self
            .get_bulk_monikers_locations(
                &defining,
                &monikers,
                "definitions",
                self.config.hover_definitions_limit,
                0,
            )
            .await?;
        log::debug!(
            "hover: {} import monikers, {} defining uploads, {} definitions",
            monikers.len(),
            defining.len(),
            locations.len()
        );

        for location in &locations {
            let hover = self
                .documents
                .hover(location.upload_id, &location.path, location.range.start)
                .await
                .map_err(|err| CodeNavError::backend("document_store.hover", &err))?;
            if let Some((text, _)) = hover {
                if !text.is_empty() {
                    return Ok(Some(Hover { text, range }));
                }
            }
        }
        Ok(None)
    }

    /// Candidate uploads for the request path
    pub fn visible_uploads_for_path(&self, request_state: &RequestState) -> Vec<Upload> {
        let path = request_state.translator.context().path.clone();
        get_upload_paths(request_state, &path)
            .into_iter()
            .map(|visible| visible.upload)
            .collect()
    }

    /// Translate index locations into the request commit.
    ///
    /// Locations whose upload is unknown to the request are skipped. An
    /// untranslatable location is kept at its indexed commit and range when
    /// `include_fallback_locations` is set, and dropped otherwise.
    pub async fn get_upload_locations(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        locations: &[Location],
        include_fallback_locations: bool,
    ) -> Result<Vec<UploadLocation>> {
        let mut upload_locations = Vec::with_capacity(locations.len());
        for location in locations {
            let Some(upload) = request_state.cached_upload(location.upload_id) else {
                log::debug!("skipping location in unknown upload {}", location.upload_id);
                continue;
            };

            let path = format!("{}{}", upload.root, location.path);
            let (target_commit, target_range, translated) = self
                .get_source_range(args, request_state, &upload, &path, location.range)
                .await?;
            if !translated {
                self.operations.record_translation_failure();
                if !include_fallback_locations {
                    self.operations.record_dropped_location();
                    continue;
                }
            }

            upload_locations.push(UploadLocation {
                upload,
                path,
                target_commit,
                target_range,
            });
        }
        Ok(upload_locations)
    }

    /// Translate `range` of `path` at the upload's commit into the request
    /// commit. On failure the upload's commit and the untouched range come
    /// back with `false`. Uploads of other repositories are never translated.
    pub(crate) async fn get_source_range(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        upload: &Upload,
        path: &str,
        range: Range,
    ) -> Result<(String, Range, bool)> {
        if upload.repository_id != args.repository_id {
            return Ok((upload.commit.clone(), range, true));
        }

        let translated = request_state
            .translator
            .get_target_commit_range_from_source_range(&upload.commit, path, range, true)
            .await?;
        Ok(match translated {
            Some(target) => (args.commit.clone(), target.value, true),
            None => (upload.commit.clone(), range, false),
        })
    }

    /// Monikers of `kind` attached at each visible position, de-duplicated,
    /// at most `moniker_limit` of them
    async fn get_ordered_monikers(
        &self,
        visible: &[VisibleUpload],
        kind: &str,
    ) -> Result<Vec<QualifiedMoniker>> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for upload in visible {
            let monikers = self
                .documents
                .monikers_at_position(
                    upload.upload.id,
                    &upload.target_path_without_root,
                    upload.target_position,
                )
                .await
                .map_err(|err| CodeNavError::backend("document_store.monikers_at_position", &err))?;

            for moniker in monikers {
                if moniker.package.name.is_empty() || moniker.moniker.kind != kind {
                    continue;
                }
                if seen.insert(moniker.clone()) {
                    ordered.push(moniker);
                }
                if ordered.len() >= self.config.moniker_limit {
                    return Ok(ordered);
                }
            }
        }
        Ok(ordered)
    }

    /// Uploads defining any of `monikers` whose commits still exist
    pub(crate) async fn get_uploads_with_definitions_for_monikers(
        &self,
        monikers: &[QualifiedMoniker],
        request_state: &RequestState,
    ) -> Result<Vec<Upload>> {
        let uploads = self
            .uploads
            .dumps_with_definitions_for_monikers(monikers)
            .await
            .map_err(|err| {
                CodeNavError::backend("upload_registry.dumps_with_definitions_for_monikers", &err)
            })?;
        request_state.cache_uploads(&uploads);
        filter_uploads_with_commits(&request_state.commit_cache, uploads).await
    }

    /// Uploads with the given ids whose commits exist. Uploads already known
    /// to the request are not fetched again.
    pub(crate) async fn get_uploads_by_ids(
        &self,
        ids: &[i64],
        request_state: &RequestState,
    ) -> Result<Vec<Upload>> {
        let mut existing = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for &id in ids {
            match request_state.cached_upload(id) {
                Some(upload) => existing.push(upload),
                None => missing.push(id),
            }
        }
        if missing.is_empty() {
            return Ok(existing);
        }

        let fetched = self
            .uploads
            .dumps_by_ids(&missing)
            .await
            .map_err(|err| CodeNavError::backend("upload_registry.dumps_by_ids", &err))?;
        let resolvable = filter_uploads_with_commits(&request_state.commit_cache, fetched).await?;
        request_state.cache_uploads(&resolvable);

        existing.extend(resolvable);
        Ok(existing)
    }

    pub(crate) async fn get_bulk_monikers_locations(
        &self,
        uploads: &[Upload],
        monikers: &[QualifiedMoniker],
        table: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Location>, usize)> {
        let ids: Vec<i64> = uploads.iter().map(|upload| upload.id).collect();
        let monikers: Vec<MonikerData> = monikers.iter().map(|m| m.moniker.clone()).collect();
        self.documents
            .bulk_moniker_locations(table, &ids, &monikers, limit, offset)
            .await
            .map_err(|err| CodeNavError::backend("document_store.bulk_moniker_locations", &err))
    }
}

/// Keep the uploads whose commits are known to the VCS backend
pub async fn filter_uploads_with_commits(
    commit_cache: &CommitCache,
    uploads: Vec<Upload>,
) -> Result<Vec<Upload>> {
    let commits: Vec<RepositoryCommit> = uploads
        .iter()
        .map(|upload| RepositoryCommit::new(upload.repository_id, upload.commit.clone()))
        .collect();
    let exists = commit_cache.exists_batch(&commits).await?;

    let before = uploads.len();
    let filtered: Vec<Upload> = uploads
        .into_iter()
        .zip(exists)
        .filter_map(|(upload, exists)| exists.then_some(upload))
        .collect();
    if filtered.len() < before {
        log::warn!("dropped {} uploads at unknown commits", before - filtered.len());
    }
    Ok(filtered)
}

/// Cursor carried by an API page token; an empty token starts a new query
pub fn cursor_from_token(token: &str) -> Result<Cursor> {
    if token.trim().is_empty() {
        return Ok(Cursor::default());
    }
    decode_cursor(token).map_err(|err| CodeNavError::InvalidCursor(format!("{err:#}")))
}

/// Page token for `cursor`, `None` once the query is exhausted
pub fn next_page_token(cursor: &Cursor) -> Result<Option<String>> {
    if cursor.is_done() {
        return Ok(None);
    }
    encode_cursor(cursor)
        .map(Some)
        .map_err(|err| CodeNavError::InvalidCursor(format!("{err:#}")))
}
