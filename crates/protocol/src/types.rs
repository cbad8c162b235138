use serde::{Deserialize, Serialize};

/// Zero-indexed position in a text document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open span between two positions. Ordered by start, then end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Shorthand for `Range::new(Position::new(..), Position::new(..))`
    pub fn from_coords(
        start_line: u32,
        start_character: u32,
        end_line: u32,
        end_character: u32,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_character),
            end: Position::new(end_line, end_character),
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Key of the commit existence cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryCommit {
    pub repository_id: i64,
    pub commit: String,
}

impl RepositoryCommit {
    pub fn new(repository_id: i64, commit: impl Into<String>) -> Self {
        Self {
            repository_id,
            commit: commit.into(),
        }
    }
}

/// Repository name + commit as understood by the version control backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCommit {
    pub repo: String,
    pub commit: String,
}

/// A processed index ("dump") of one repository root at one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub id: i64,
    pub repository_id: i64,
    pub repository_name: String,
    pub commit: String,
    /// Directory the index was built from, relative to the repository root.
    /// Empty or ends with `/`.
    pub root: String,
    pub indexer: String,
}

/// A location inside one upload, in that upload's own coordinate space.
/// `path` is relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub upload_id: i64,
    pub path: String,
    pub range: Range,
}

impl Location {
    pub fn new(upload_id: i64, path: impl Into<String>, range: Range) -> Self {
        Self {
            upload_id,
            path: path.into(),
            range,
        }
    }
}

/// A location adjusted to the commit a request was made against.
///
/// When the range could not be translated `target_commit` is the upload's
/// commit and `target_range` the range as indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLocation {
    pub upload: Upload,
    /// Repository-relative path
    pub path: String,
    pub target_commit: String,
    pub target_range: Range,
}

/// A compiler or linter message attached to a document of an upload.
/// `path` is relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub path: String,
    /// LSP severity: 1 error, 2 warning, 3 information, 4 hint
    pub severity: i32,
    pub code: String,
    pub message: String,
    pub source: String,
    pub range: Range,
}

/// Everything an index knows about one range of a document, in the
/// upload's own coordinates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeIntelligenceRange {
    pub range: Range,
    pub definitions: Vec<Location>,
    pub references: Vec<Location>,
    pub implementations: Vec<Location>,
    pub hover_text: String,
}
