//! Diff hunks and the line translation algorithm built on them.

use crate::error::{GitTreeError, Result};
use codenav_protocol::{Position, Range};
use once_cell::sync::Lazy;
use regex::Regex;

static HUNK_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid hunk header regex")
});

/// One contiguous region of a two-commit diff of a single file.
///
/// Line numbers are one-indexed as in unified diff headers. For a side with
/// zero lines, the start line names the line *before* the empty region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub orig_start_line: u32,
    pub orig_lines: u32,
    pub new_start_line: u32,
    pub new_lines: u32,
    /// Literal delta lines, each prefixed with ` `, `+` or `-`
    pub body: String,
}

impl Hunk {
    pub fn new(
        orig_start_line: u32,
        orig_lines: u32,
        new_start_line: u32,
        new_lines: u32,
        body: impl Into<String>,
    ) -> Self {
        Self {
            orig_start_line,
            orig_lines,
            new_start_line,
            new_lines,
            body: body.into(),
        }
    }

    /// First original line affected by this hunk
    fn orig_first_line(&self) -> i64 {
        if self.orig_lines == 0 {
            i64::from(self.orig_start_line) + 1
        } else {
            i64::from(self.orig_start_line)
        }
    }

    fn orig_end(&self) -> i64 {
        exclusive_end(self.orig_start_line, self.orig_lines)
    }

    fn new_end(&self) -> i64 {
        exclusive_end(self.new_start_line, self.new_lines)
    }
}

fn exclusive_end(start: u32, lines: u32) -> i64 {
    if lines == 0 {
        i64::from(start) + 1
    } else {
        i64::from(start) + i64::from(lines)
    }
}

/// Parse the hunks of a single-file unified diff (`git diff -- <path>` output).
///
/// File headers (`diff --git`, `index`, `---`, `+++`) are skipped. Hunks are
/// returned in the order they appear, which git guarantees is ascending by
/// original start line.
pub fn parse_unified_diff(diff: &str) -> Result<Vec<Hunk>> {
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut current: Option<Hunk> = None;

    for line in diff.lines() {
        if let Some(caps) = HUNK_HEADER.captures(line) {
            if let Some(done) = current.take() {
                hunks.push(done);
            }
            let num = |idx: usize, default: u32| -> Result<u32> {
                match caps.get(idx) {
                    Some(m) => m
                        .as_str()
                        .parse()
                        .map_err(|_| GitTreeError::InvalidDiff(format!("bad hunk header: {line}"))),
                    None => Ok(default),
                }
            };
            current = Some(Hunk::new(
                num(1, 0)?,
                num(2, 1)?,
                num(3, 0)?,
                num(4, 1)?,
                String::new(),
            ));
            continue;
        }

        if line.starts_with("diff --git") {
            if let Some(done) = current.take() {
                hunks.push(done);
            }
            continue;
        }
        let Some(hunk) = current.as_mut() else {
            continue;
        };
        if line.starts_with(' ')
            || line.starts_with('+')
            || line.starts_with('-')
            || line.starts_with('\\')
            || line.is_empty()
        {
            hunk.body.push_str(line);
            hunk.body.push('\n');
        }
    }

    if let Some(done) = current {
        hunks.push(done);
    }
    Ok(hunks)
}

/// The last hunk affecting lines at or before `line` (one-indexed)
fn find_hunk(hunks: &[Hunk], line: i64) -> Option<&Hunk> {
    let idx = hunks.partition_point(|hunk| hunk.orig_first_line() <= line);
    idx.checked_sub(1).map(|i| &hunks[i])
}

/// Translate a zero-indexed position from the original side of `hunks` to the new side.
///
/// Returns `Ok(None)` when the line itself was added or removed and so has no
/// precise counterpart.
pub fn translate_position(hunks: &[Hunk], position: Position) -> Result<Option<Position>> {
    let line = i64::from(position.line) + 1;

    let Some(hunk) = find_hunk(hunks, line) else {
        return Ok(Some(position));
    };

    // Past the hunk: shift by the difference in extents
    if line >= hunk.orig_end() {
        let target_line = line + (hunk.new_end() - hunk.orig_end());
        return Ok(Some(Position::new(
            to_zero_indexed(target_line, hunk)?,
            position.character,
        )));
    }

    // Each offset advances only on lines that exist in its own side of the diff
    let mut source_offset = i64::from(hunk.orig_start_line);
    let mut target_offset = i64::from(hunk.new_start_line);
    for delta_line in hunk.body.lines() {
        if delta_line.starts_with('\\') {
            continue;
        }
        let is_added = delta_line.starts_with('+');
        let is_removed = delta_line.starts_with('-');

        if !is_added {
            source_offset += 1;
        }
        if source_offset - 1 == line {
            if is_added || is_removed {
                return Ok(None);
            }
            let target_line = to_zero_indexed(target_offset, hunk)?;
            return Ok(Some(Position::new(target_line, position.character)));
        }
        if !is_removed {
            target_offset += 1;
        }
    }

    log::error!(
        "hunk @@ -{},{} +{},{} @@ ended before reaching line {line}",
        hunk.orig_start_line,
        hunk.orig_lines,
        hunk.new_start_line,
        hunk.new_lines
    );
    Err(GitTreeError::MalformedHunk(format!(
        "hunk starting at original line {} has too few lines to reach line {line}",
        hunk.orig_start_line
    )))
}

/// Translate both ends of `range`; fails if either end fails
pub fn translate_range(hunks: &[Hunk], range: Range) -> Result<Option<Range>> {
    let Some(start) = translate_position(hunks, range.start)? else {
        return Ok(None);
    };
    let Some(end) = translate_position(hunks, range.end)? else {
        return Ok(None);
    };
    Ok(Some(Range::new(start, end)))
}

fn to_zero_indexed(line: i64, hunk: &Hunk) -> Result<u32> {
    u32::try_from(line - 1).map_err(|_| {
        GitTreeError::MalformedHunk(format!(
            "hunk starting at original line {} maps to line {line}",
            hunk.orig_start_line
        ))
    })
}
