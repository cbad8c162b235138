use crate::error::{CodeNavError, Result};
use crate::request_state::RequestState;
use codenav_protocol::{CursorVisibleUpload, Position, Upload};

/// An upload relevant to a query, with the query path and position translated
/// into the upload's own commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleUpload {
    pub upload: Upload,
    pub target_path: String,
    pub target_position: Position,
    pub target_path_without_root: String,
}

impl VisibleUpload {
    pub fn new(upload: Upload, target_path: String, target_position: Position) -> Self {
        let target_path_without_root = target_path
            .strip_prefix(upload.root.as_str())
            .unwrap_or(&target_path)
            .to_string();
        Self {
            upload,
            target_path,
            target_position,
            target_path_without_root,
        }
    }

    pub fn to_cursor(&self) -> CursorVisibleUpload {
        CursorVisibleUpload {
            upload_id: self.upload.id,
            target_path: self.target_path.clone(),
            target_position: self.target_position,
            target_path_without_root: self.target_path_without_root.clone(),
        }
    }
}

/// Translate `position` of the request path into each candidate upload's
/// commit. Uploads where the position was edited away are left out.
pub async fn get_visible_uploads(
    request_state: &RequestState,
    position: Position,
) -> Result<Vec<VisibleUpload>> {
    let mut visible = Vec::with_capacity(request_state.candidate_uploads().len());
    for upload in request_state.candidate_uploads() {
        let translated = request_state
            .translator
            .get_target_commit_position_from_source_position(&upload.commit, position, false)
            .await?;
        match translated {
            Some(target) => {
                let upload = VisibleUpload::new(upload.clone(), target.path, target.value);
                visible.push(upload);
            }
            None => log::debug!(
                "upload {}: position {position:?} not present at {}",
                upload.id,
                upload.commit
            ),
        }
    }
    Ok(visible)
}

/// Candidate uploads paired with the request path, without a position
pub fn get_upload_paths(request_state: &RequestState, path: &str) -> Vec<VisibleUpload> {
    request_state
        .candidate_uploads()
        .iter()
        .map(|upload| VisibleUpload::new(upload.clone(), path.to_string(), Position::default()))
        .collect()
}

/// Rebuild the visible uploads frozen in a cursor.
///
/// Fails with [`CodeNavError::ConcurrentModification`] when an upload the
/// cursor refers to is no longer known to this request.
pub fn visible_uploads_from_cursor(
    request_state: &RequestState,
    persisted: &[CursorVisibleUpload],
) -> Result<Vec<VisibleUpload>> {
    persisted
        .iter()
        .map(|entry| {
            let Some(upload) = request_state.cached_upload(entry.upload_id) else {
                log::warn!("cursor refers to unknown upload {}", entry.upload_id);
                return Err(CodeNavError::ConcurrentModification);
            };
            Ok(VisibleUpload {
                upload,
                target_path: entry.target_path.clone(),
                target_position: entry.target_position,
                target_path_without_root: entry.target_path_without_root.clone(),
            })
        })
        .collect()
}
