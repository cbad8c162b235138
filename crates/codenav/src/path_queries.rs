//! Queries scoped to the request path rather than a position: diagnostics,
//! range summaries and the stencil.
//!
//! Each one walks every candidate upload for the path, asks the document
//! store in the upload's own coordinates, and reports the results at the
//! request commit.

use crate::error::{CodeNavError, Result};
use crate::request_state::{PositionalRequestArgs, RequestState};
use crate::service::CodeNavService;
use crate::visible::{get_upload_paths, VisibleUpload};
use codenav_protocol::{CodeIntelligenceRange, Diagnostic, Range, Upload, UploadLocation};

/// A diagnostic together with the upload it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticAtUpload {
    /// As indexed, except that `path` is repository-relative
    pub diagnostic: Diagnostic,
    pub upload: Upload,
    /// The request commit, or the upload's commit when the range could not
    /// be translated
    pub adjusted_commit: String,
    pub adjusted_range: Range,
}

/// A range summary at the request commit. Locations that do not survive
/// translation are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustedCodeIntelligenceRange {
    pub range: Range,
    pub definitions: Vec<UploadLocation>,
    pub references: Vec<UploadLocation>,
    pub implementations: Vec<UploadLocation>,
    pub hover_text: String,
}

impl CodeNavService {
    /// Diagnostics of the request path, at most `args.limit` of them, and the
    /// total number the candidate uploads hold
    pub async fn get_diagnostics(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
    ) -> Result<(Vec<DiagnosticAtUpload>, usize)> {
        args.validate()?;
        self.operations.record_request();

        let mut diagnostics = Vec::new();
        let mut total = 0;
        for upload in get_upload_paths(request_state, &args.path) {
            let remaining = args.limit.saturating_sub(diagnostics.len());
            let (page, count) = self
                .documents
                .diagnostics(
                    upload.upload.id,
                    &upload.target_path_without_root,
                    remaining,
                    0,
                )
                .await
                .map_err(|err| CodeNavError::backend("document_store.diagnostics", &err))?;

            for diagnostic in page {
                let adjusted = self
                    .get_requested_commit_diagnostic(args, request_state, &upload, diagnostic)
                    .await?;
                diagnostics.push(adjusted);
            }
            total += count;
        }

        diagnostics.truncate(args.limit);
        log::debug!("diagnostics: {} of {total} returned", diagnostics.len());
        Ok((diagnostics, total))
    }

    async fn get_requested_commit_diagnostic(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        upload: &VisibleUpload,
        mut diagnostic: Diagnostic,
    ) -> Result<DiagnosticAtUpload> {
        diagnostic.path = format!("{}{}", upload.upload.root, diagnostic.path);
        let (adjusted_commit, adjusted_range, _) = self
            .get_source_range(
                args,
                request_state,
                &upload.upload,
                &diagnostic.path,
                diagnostic.range,
            )
            .await?;
        Ok(DiagnosticAtUpload {
            diagnostic,
            upload: upload.upload.clone(),
            adjusted_commit,
            adjusted_range,
        })
    }

    /// Range summaries of the request path starting on index lines
    /// `[start_line, end_line)`. Summaries whose own range cannot be
    /// translated are skipped.
    pub async fn get_ranges(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        start_line: u32,
        end_line: u32,
    ) -> Result<Vec<AdjustedCodeIntelligenceRange>> {
        self.operations.record_request();

        let mut adjusted = Vec::new();
        for upload in get_upload_paths(request_state, &args.path) {
            let summaries = self
                .documents
                .ranges(
                    upload.upload.id,
                    &upload.target_path_without_root,
                    start_line,
                    end_line,
                )
                .await
                .map_err(|err| CodeNavError::backend("document_store.ranges", &err))?;

            for summary in summaries {
                if let Some(range) = self
                    .get_code_intelligence_range(args, request_state, &upload, summary)
                    .await?
                {
                    adjusted.push(range);
                }
            }
        }
        log::debug!("ranges {start_line}..{end_line}: {} summaries", adjusted.len());
        Ok(adjusted)
    }

    async fn get_code_intelligence_range(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
        upload: &VisibleUpload,
        summary: CodeIntelligenceRange,
    ) -> Result<Option<AdjustedCodeIntelligenceRange>> {
        let (_, range, translated) = self
            .get_source_range(
                args,
                request_state,
                &upload.upload,
                &upload.target_path,
                summary.range,
            )
            .await?;
        if !translated {
            return Ok(None);
        }

        let definitions = self
            .get_upload_locations(args, request_state, &summary.definitions, false)
            .await?;
        let references = self
            .get_upload_locations(args, request_state, &summary.references, false)
            .await?;
        let implementations = self
            .get_upload_locations(args, request_state, &summary.implementations, false)
            .await?;

        Ok(Some(AdjustedCodeIntelligenceRange {
            range,
            definitions,
            references,
            implementations,
            hover_text: summary.hover_text,
        }))
    }

    /// Every range of the request path with precise data in any candidate
    /// upload, sorted and de-duplicated. Ranges that cannot be translated are
    /// reported as indexed.
    pub async fn get_stencil(
        &self,
        args: &PositionalRequestArgs,
        request_state: &RequestState,
    ) -> Result<Vec<Range>> {
        self.operations.record_request();

        let mut ranges = Vec::new();
        for upload in get_upload_paths(request_state, &args.path) {
            let stencil = self
                .documents
                .stencil(upload.upload.id, &upload.target_path_without_root)
                .await
                .map_err(|err| CodeNavError::backend("document_store.stencil", &err))?;

            for range in stencil {
                let (_, adjusted, _) = self
                    .get_source_range(args, request_state, &upload.upload, &args.path, range)
                    .await?;
                ranges.push(adjusted);
            }
        }

        ranges.sort();
        ranges.dedup();
        Ok(ranges)
    }
}
