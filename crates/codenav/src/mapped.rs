//! An upload's documents presented in the coordinates of another commit.
//!
//! A [`MappedDocument`] answers point queries cheaply by translating the query
//! into the index's commit, and remaps its whole occurrence list at most once,
//! on first request. Concurrent callers of [`MappedDocument::get_occurrences`]
//! wait on the same remap and all observe its outcome, including an error.

use crate::error::{CodeNavError, Result};
use crate::stores::DocumentStore;
use codenav_gittree::GitTreeTranslator;
use codenav_protocol::{
    find_occurrences_with_equal_range, sort_occurrences, Document, Occurrence, Range, Upload,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Documents of one upload, translated into the commit `translator` is bound to
pub struct MappedIndex {
    store: Arc<dyn DocumentStore>,
    translator: GitTreeTranslator,
    upload: Upload,
}

impl MappedIndex {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        translator: GitTreeTranslator,
        upload: Upload,
    ) -> Self {
        Self {
            store,
            translator,
            upload,
        }
    }

    pub fn upload(&self) -> &Upload {
        &self.upload
    }

    /// Fetch the document at repository-relative `path`. A missing document is `Ok(None)`.
    pub async fn get_document(&self, path: &str) -> Result<Option<MappedDocument>> {
        let path_in_upload = path.strip_prefix(self.upload.root.as_str()).unwrap_or(path);
        let document = self
            .store
            .scip_document(self.upload.id, path_in_upload)
            .await
            .map_err(|err| CodeNavError::backend("document_store.scip_document", &err))?;

        Ok(document.map(|document| MappedDocument {
            translator: self.translator.clone(),
            index_commit: self.upload.commit.clone(),
            path: path.to_string(),
            document,
            remapped: OnceCell::new(),
        }))
    }
}

pub struct MappedDocument {
    translator: GitTreeTranslator,
    index_commit: String,
    /// Repository-relative
    path: String,
    document: Document,
    remapped: OnceCell<Result<Arc<Vec<Occurrence>>>>,
}

impl MappedDocument {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Every occurrence whose range survives translation into the target
    /// commit, sorted by range
    pub async fn get_occurrences(&self) -> Result<Arc<Vec<Occurrence>>> {
        self.remapped.get_or_init(|| self.remap()).await.clone()
    }

    /// Occurrences at exactly `range`, given in target-commit coordinates
    pub async fn get_occurrences_at_range(&self, range: Range) -> Result<Vec<Occurrence>> {
        if let Some(Ok(occurrences)) = self.remapped.get() {
            return Ok(find_occurrences_with_equal_range(occurrences, range));
        }

        let translated = self
            .translator
            .get_target_commit_range_from_source_range(&self.index_commit, &self.path, range, false)
            .await?;
        let Some(index_range) = translated else {
            log::debug!(
                "{}: query range {range:?} does not exist at {}",
                self.path,
                self.index_commit
            );
            return Ok(Vec::new());
        };

        // Matches are reported at the query range, the only coordinates the caller knows
        let mut matches =
            find_occurrences_with_equal_range(&self.document.occurrences, index_range.value);
        for occurrence in &mut matches {
            occurrence.range = range;
        }
        Ok(matches)
    }

    async fn remap(&self) -> Result<Arc<Vec<Occurrence>>> {
        let mut remapped = Vec::with_capacity(self.document.occurrences.len());
        for occurrence in &self.document.occurrences {
            let translated = self
                .translator
                .get_target_commit_range_from_source_range(
                    &self.index_commit,
                    &self.path,
                    occurrence.range,
                    true,
                )
                .await?;
            if let Some(target) = translated {
                remapped.push(Occurrence {
                    range: target.value,
                    ..occurrence.clone()
                });
            }
        }
        sort_occurrences(&mut remapped);

        log::debug!(
            "{}: remapped {}/{} occurrences from {}",
            self.path,
            remapped.len(),
            self.document.occurrences.len(),
            self.index_commit
        );
        Ok(Arc::new(remapped))
    }
}
