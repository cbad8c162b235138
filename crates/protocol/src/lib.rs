//! # Codenav Protocol
//!
//! Plain data shared by the translation layer and the resolution engine:
//! positions and ranges, uploads and their locations, SCIP occurrences,
//! monikers, and the resumable pagination [`Cursor`].
//!
//! ## Coordinates
//!
//! Every [`Position`] is zero-indexed (line and character). Diff hunks use
//! one-indexed lines; conversion happens only inside the translator.

mod codec;
mod cursor;
mod moniker;
mod scip;
mod types;

pub use codec::{decode_cursor, encode_cursor};
pub use cursor::{Cursor, CursorVisibleUpload, Phase};
pub use moniker::{
    parse_symbol, symbols_to_monikers, MonikerData, PackageInformation, ParsedSymbol,
    QualifiedMoniker,
};
pub use scip::{
    find_occurrences_with_equal_range, sort_occurrences, Document, Occurrence, SymbolRole,
};
pub use types::{
    CodeIntelligenceRange, Diagnostic, Location, Position, Range, RepoCommit, RepositoryCommit,
    Upload, UploadLocation,
};
