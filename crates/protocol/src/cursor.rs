//! Resumable pagination state for location queries.
//!
//! A [`Cursor`] is handed back to the caller with every page and passed in
//! again to request the next one. It carries no behaviour beyond the pure
//! offset transforms below; field names are part of the wire format.

use crate::types::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which half of the resolution a cursor is in. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Same-document graph traversal in each visible upload
    #[default]
    #[serde(rename = "local", alias = "")]
    Local,
    /// Moniker search across other uploads
    #[serde(rename = "remote")]
    Remote,
    #[serde(rename = "done")]
    Done,
}

/// The persisted part of a visible upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorVisibleUpload {
    pub upload_id: i64,
    pub target_path: String,
    pub target_position: Position,
    pub target_path_without_root: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cursor {
    pub phase: Phase,
    /// Frozen on the first page; empty means "not computed yet"
    pub visible_uploads: Vec<CursorVisibleUpload>,
    /// Sorted and de-duplicated
    pub symbol_names: Vec<String>,
    pub skip_paths_by_upload_id: BTreeMap<i64, String>,

    pub local_upload_offset: usize,
    pub local_location_offset: usize,

    pub definition_ids: Vec<i64>,
    pub upload_ids: Vec<i64>,
    /// `-1` once the referencing-upload supply is exhausted
    pub remote_upload_offset: i64,
    pub remote_location_offset: usize,
}

impl Cursor {
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Record `n` consumed locations out of `total` in the current local upload.
    /// Reaching `total` moves on to the next upload.
    #[must_use]
    pub fn bump_local_location_offset(mut self, n: usize, total: usize) -> Self {
        if n == 0 {
            return self;
        }
        self.local_location_offset += n;
        if self.local_location_offset >= total {
            self.local_location_offset = 0;
            self.local_upload_offset += 1;
        }
        self
    }

    /// Move past the current local upload without consuming anything from it
    #[must_use]
    pub fn advance_local_upload(mut self) -> Self {
        self.local_location_offset = 0;
        self.local_upload_offset += 1;
        self
    }

    /// Record `n` scanned referencing uploads out of `total`
    #[must_use]
    pub fn bump_remote_upload_offset(mut self, n: usize, total: usize) -> Self {
        if n == 0 {
            return self;
        }
        self.remote_upload_offset += n as i64;
        if self.remote_upload_offset >= total as i64 {
            self.remote_upload_offset = -1;
        }
        self
    }

    #[must_use]
    pub fn exhaust_remote_uploads(mut self) -> Self {
        self.remote_upload_offset = -1;
        self
    }

    pub fn remote_uploads_exhausted(&self) -> bool {
        self.remote_upload_offset < 0
    }

    /// Record `n` consumed locations out of `total` for the current upload batch.
    /// Reaching `total` drops the batch so the next call fetches a fresh one.
    #[must_use]
    pub fn bump_remote_location_offset(mut self, n: usize, total: usize) -> Self {
        if n == 0 {
            return self;
        }
        self.remote_location_offset += n;
        if self.remote_location_offset >= total {
            self.remote_location_offset = 0;
            self.upload_ids.clear();
        }
        self
    }

    /// Drop the current upload batch without consuming anything from it
    #[must_use]
    pub fn finish_remote_batch(mut self) -> Self {
        self.remote_location_offset = 0;
        self.upload_ids.clear();
        self
    }

    /// Merge `names` into the sorted, de-duplicated symbol name set
    pub fn add_symbol_names<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.symbol_names.extend(names);
        self.symbol_names.sort();
        self.symbol_names.dedup();
    }
}
