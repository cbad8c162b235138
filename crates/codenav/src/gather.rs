//! The page-filling driver behind definitions, references, implementations
//! and prototypes.
//!
//! ```text
//! Cursor { phase: Local }
//!     │  each visible upload in turn: locations reachable inside its own
//!     │  index, paged by local_location_offset; symbol names collected
//!     ▼
//! Cursor { phase: Remote }              (local-only kinds skip to Done)
//!     │  symbol names -> monikers
//!     │  first batch: defining uploads ∪ visible uploads
//!     │  later batches: referencing uploads, paged by remote_upload_offset
//!     │  each batch paged by remote_location_offset
//!     ▼
//! Cursor { phase: Done }
//! ```
//!
//! Every step either returns locations or moves an offset forward, so the
//! driver loop always terminates.

use crate::error::{CodeNavError, Result};
use crate::request_state::{PositionalRequestArgs, RequestState};
use crate::service::CodeNavService;
use crate::stores::{LocationKey, LocationKind};
use crate::visible::{get_visible_uploads, visible_uploads_from_cursor, VisibleUpload};
use codenav_protocol::{symbols_to_monikers, Cursor, Location, Phase, Position, UploadLocation};

impl CodeNavService {
    pub(crate) async fn gather_locations(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        mut cursor: Cursor,
        kind: LocationKind,
    ) -> Result<(Vec<UploadLocation>, Cursor)> {
        args.validate()?;
        self.operations.record_request();
        if cursor.is_done() {
            return Ok((Vec::new(), cursor));
        }

        let visible = if is_first_page(&cursor) {
            let position = Position::new(args.line, args.character);
            let visible = get_visible_uploads(request_state, position).await?;
            cursor.visible_uploads = visible.iter().map(VisibleUpload::to_cursor).collect();
            visible
        } else {
            visible_uploads_from_cursor(request_state, &cursor.visible_uploads)?
        };

        let mut locations: Vec<Location> = Vec::new();
        while !cursor.is_done() && locations.len() < args.limit {
            self.operations.record_driver_round();

            let budget = args.limit - locations.len();
            let (local, next) = self.gather_local_locations(&visible, cursor, kind, budget).await?;
            locations.extend(local);
            cursor = next;

            if cursor.is_done() || locations.len() >= args.limit {
                break;
            }

            let budget = args.limit - locations.len();
            let (remote, next) = self
                .gather_remote_locations(args, request_state, &visible, cursor, kind, budget)
                .await?;
            locations.extend(remote);
            cursor = next;
        }

        log::debug!(
            "{}: {} raw locations, cursor now {:?}",
            kind.as_str(),
            locations.len(),
            cursor.phase
        );

        let upload_locations = self
            .get_upload_locations(
                args,
                request_state,
                &locations,
                self.config.include_fallback_locations,
            )
            .await?;
        self.operations.record_locations(upload_locations.len());
        Ok((upload_locations, cursor))
    }

    /// Consume up to `budget` locations from the visible uploads' own indexes
    async fn gather_local_locations(
        &self,
        visible: &[VisibleUpload],
        mut cursor: Cursor,
        kind: LocationKind,
        budget: usize,
    ) -> Result<(Vec<Location>, Cursor)> {
        if cursor.phase != Phase::Local {
            return Ok((Vec::new(), cursor));
        }

        let mut gathered = Vec::new();
        while cursor.local_upload_offset < visible.len() && gathered.len() < budget {
            let upload = &visible[cursor.local_upload_offset];
            let key = LocationKey {
                upload_id: upload.upload.id,
                path: upload.target_path_without_root.clone(),
                position: upload.target_position,
            };
            let (locations, symbol_names) = self
                .documents
                .extract_locations_and_symbols(kind, &key)
                .await
                .map_err(|err| {
                    CodeNavError::backend("document_store.extract_locations_and_symbols", &err)
                })?;
            cursor.add_symbol_names(symbol_names);

            let total = locations.len();
            let page: Vec<Location> = locations
                .into_iter()
                .skip(cursor.local_location_offset)
                .take(budget - gathered.len())
                .collect();
            if page.is_empty() {
                cursor = cursor.advance_local_upload();
                continue;
            }

            cursor
                .skip_paths_by_upload_id
                .insert(upload.upload.id, upload.target_path_without_root.clone());
            let n = page.len();
            gathered.extend(page);
            cursor = cursor.bump_local_location_offset(n, total);
        }

        if cursor.local_upload_offset >= visible.len() {
            cursor.phase = if kind.has_remote_phase() { Phase::Remote } else { Phase::Done };
            log::debug!("{}: local phase finished, moving to {:?}", kind.as_str(), cursor.phase);
        }
        Ok((gathered, cursor))
    }

    /// Consume up to `budget` locations from other indexes sharing a moniker
    /// with the symbols found locally
    async fn gather_remote_locations(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        visible: &[VisibleUpload],
        mut cursor: Cursor,
        kind: LocationKind,
        budget: usize,
    ) -> Result<(Vec<Location>, Cursor)> {
        if cursor.phase != Phase::Remote {
            return Ok((Vec::new(), cursor));
        }
        let Some(table) = kind.remote_table() else {
            cursor.phase = Phase::Done;
            return Ok((Vec::new(), cursor));
        };

        let monikers = symbols_to_monikers(&cursor.symbol_names);
        if monikers.is_empty() {
            log::debug!("{}: no monikers to search", kind.as_str());
            cursor.phase = Phase::Done;
            return Ok((Vec::new(), cursor));
        }

        if cursor.definition_ids.is_empty() && cursor.remote_upload_offset == 0 {
            let defining = self
                .get_uploads_with_definitions_for_monikers(&monikers, request_state)
                .await?;
            let mut ids: Vec<i64> = visible
                .iter()
                .map(|upload| upload.upload.id)
                .chain(defining.iter().map(|upload| upload.id))
                .collect();
            ids.sort_unstable();
            ids.dedup();
            cursor.definition_ids = ids.clone();
            cursor.upload_ids = ids;
        }

        let referencing = kind.includes_referencing_indexes();
        if cursor.upload_ids.is_empty() && referencing && !cursor.remote_uploads_exhausted() {
            let offset = usize::try_from(cursor.remote_upload_offset).unwrap_or_default();
            let page = self
                .uploads
                .upload_ids_with_references(
                    &monikers,
                    &cursor.definition_ids,
                    args.repository_id,
                    &args.commit,
                    self.config.maximum_indexes_per_moniker_search,
                    offset,
                )
                .await
                .map_err(|err| {
                    CodeNavError::backend("upload_registry.upload_ids_with_references", &err)
                })?;
            log::debug!(
                "{}: referencing uploads page at {offset}: {} ids, {} scanned of {}",
                kind.as_str(),
                page.ids.len(),
                page.scanned,
                page.total
            );

            cursor.upload_ids = page.ids;
            cursor = if page.scanned == 0 {
                cursor.exhaust_remote_uploads()
            } else {
                cursor.bump_remote_upload_offset(page.scanned, page.total)
            };
        }

        if cursor.upload_ids.is_empty() {
            if !referencing || cursor.remote_uploads_exhausted() {
                cursor.phase = Phase::Done;
            }
            return Ok((Vec::new(), cursor));
        }

        let uploads = self.get_uploads_by_ids(&cursor.upload_ids, request_state).await?;
        let (locations, total) = if uploads.is_empty() {
            (Vec::new(), 0)
        } else {
            let offset = cursor.remote_location_offset;
            self.get_bulk_monikers_locations(&uploads, &monikers, table, budget, offset)
                .await?
        };

        cursor = if locations.is_empty() {
            cursor.finish_remote_batch()
        } else {
            cursor.bump_remote_location_offset(locations.len(), total)
        };
        if cursor.upload_ids.is_empty() && (!referencing || cursor.remote_uploads_exhausted()) {
            cursor.phase = Phase::Done;
        }

        let filtered = locations
            .into_iter()
            .filter(|location| {
                cursor
                    .skip_paths_by_upload_id
                    .get(&location.upload_id)
                    .map_or(true, |skip| *skip != location.path)
            })
            .collect();
        Ok((filtered, cursor))
    }
}

/// Nothing has been consumed yet, so the visible uploads are computed afresh
fn is_first_page(cursor: &Cursor) -> bool {
    cursor.phase == Phase::Local
        && cursor.visible_uploads.is_empty()
        && cursor.local_upload_offset == 0
        && cursor.local_location_offset == 0
}
