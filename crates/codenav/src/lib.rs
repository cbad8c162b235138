//! # Codenav
//!
//! Precise code navigation over SCIP indexes built at arbitrary commits:
//! definitions, references, implementations, prototypes and hover, answered
//! in the coordinates of the commit the user is looking at.
//!
//! ## Architecture
//!
//! ```text
//! PositionalRequestArgs + RequestState + Cursor
//!     │
//!     ├──> Visible uploads (GitTreeTranslator, request -> index commit)
//!     │
//!     ├──> Local phase   (DocumentStore::extract_locations_and_symbols)
//!     ├──> Remote phase  (monikers -> UploadRegistry -> bulk moniker lookup)
//!     │      └─ uploads filtered through the CommitCache
//!     │
//!     └──> Post-processing (GitTreeTranslator, index -> request commit)
//!            └─> Vec<UploadLocation> + next Cursor
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use codenav::{CodeNavService, PositionalRequestArgs};
//! use codenav_protocol::Cursor;
//!
//! async fn all_references(
//!     service: &CodeNavService,
//!     args: &PositionalRequestArgs,
//!     state: &codenav::RequestState,
//! ) -> codenav::Result<usize> {
//!     let mut cursor = Cursor::default();
//!     let mut seen = 0;
//!     loop {
//!         let (page, next) = service.get_references(args, state, cursor).await?;
//!         seen += page.len();
//!         if next.is_done() {
//!             return Ok(seen);
//!         }
//!         cursor = next;
//!     }
//! }
//! ```

mod commit_cache;
mod config;
mod error;
mod gather;
mod mapped;
mod operations;
mod path_queries;
mod request_state;
mod service;
mod stores;
mod visible;

pub use commit_cache::CommitCache;
pub use config::CodeNavConfig;
pub use error::{CodeNavError, Result};
pub use mapped::{MappedDocument, MappedIndex};
pub use operations::{Operations, OperationsSnapshot};
pub use path_queries::{AdjustedCodeIntelligenceRange, DiagnosticAtUpload};
pub use request_state::{PositionalRequestArgs, RequestState};
pub use service::{
    cursor_from_token, filter_uploads_with_commits, next_page_token, CodeNavService, Collaborators,
    Hover,
};
pub use stores::{
    DocumentStore, LocationKey, LocationKind, ReferencingUploads, RepoRegistry, UploadRegistry,
};
pub use visible::VisibleUpload;
