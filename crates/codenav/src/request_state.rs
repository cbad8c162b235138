use crate::commit_cache::CommitCache;
use crate::error::{CodeNavError, Result};
use codenav_gittree::GitTreeTranslator;
use codenav_protocol::Upload;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// A navigation request: where the user is and how many results they want
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalRequestArgs {
    pub repository_id: i64,
    pub commit: String,
    /// Repository-relative
    pub path: String,
    pub line: u32,
    pub character: u32,
    /// Page size. Must be at least 1 or no page could make progress.
    pub limit: usize,
}

impl PositionalRequestArgs {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(CodeNavError::InvalidRequest(
                "limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything resolved once per request and shared by its pagination steps.
///
/// `uploads` are the candidate uploads for the request path, in priority
/// order. Uploads fetched later (defining or referencing indexes) are added
/// to the same lookup cache so they are never fetched twice in one request.
pub struct RequestState {
    pub translator: GitTreeTranslator,
    pub commit_cache: Arc<CommitCache>,
    uploads: Vec<Upload>,
    upload_cache: Mutex<HashMap<i64, Upload>>,
}

impl RequestState {
    pub fn new(
        uploads: Vec<Upload>,
        translator: GitTreeTranslator,
        commit_cache: Arc<CommitCache>,
    ) -> Self {
        let upload_cache = uploads.iter().map(|upload| (upload.id, upload.clone())).collect();
        Self {
            translator,
            commit_cache,
            uploads,
            upload_cache: Mutex::new(upload_cache),
        }
    }

    pub fn candidate_uploads(&self) -> &[Upload] {
        &self.uploads
    }

    pub fn cached_upload(&self, id: i64) -> Option<Upload> {
        let cache = self.upload_cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(&id).cloned()
    }

    pub fn cache_uploads<'a, I>(&self, uploads: I)
    where
        I: IntoIterator<Item = &'a Upload>,
    {
        let mut cache = self.upload_cache.lock().unwrap_or_else(PoisonError::into_inner);
        for upload in uploads {
            cache.entry(upload.id).or_insert_with(|| upload.clone());
        }
    }
}
