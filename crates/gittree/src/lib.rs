//! # Codenav Git Tree
//!
//! Translates positions and ranges of a file between two commits of the same
//! repository, so that an index built at one commit can answer queries made
//! against another.
//!
//! ## Architecture
//!
//! ```text
//! (repository, source commit, target commit, path)
//!     │
//!     ├──> HunkCache (LRU, weighed by hunk count)
//!     │      └─ miss ──> VcsClient::diff_hunks
//!     │
//!     └──> translate_position / translate_range
//!            ├─ before first hunk: unchanged
//!            ├─ past a hunk: shifted by the hunk delta
//!            └─ inside a hunk: context lines map, edited lines fail
//! ```
//!
//! Lines in hunks are one-indexed; every [`Position`](codenav_protocol::Position)
//! crossing this crate's API is zero-indexed.

mod cache;
mod client;
mod error;
mod hunk;
mod translator;

pub use cache::{HunkCache, HunkCacheStats, Hunks};
pub use client::VcsClient;
pub use error::{GitTreeError, Result};
pub use hunk::{parse_unified_diff, translate_position, translate_range, Hunk};
pub use translator::{GitTreeTranslator, Translated, TranslationContext};
