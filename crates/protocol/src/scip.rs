use crate::types::Range;
use serde::{Deserialize, Serialize};

/// Bit flags describing the role a symbol plays at an occurrence (SCIP `SymbolRole`)
pub struct SymbolRole;

impl SymbolRole {
    pub const DEFINITION: i32 = 0x1;
    pub const IMPORT: i32 = 0x2;
    pub const WRITE_ACCESS: i32 = 0x4;
    pub const READ_ACCESS: i32 = 0x8;
    pub const GENERATED: i32 = 0x10;
    pub const TEST: i32 = 0x20;
    pub const FORWARD_DEFINITION: i32 = 0x40;
}

/// One symbol occurrence inside an indexed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub symbol: String,
    pub range: Range,
    #[serde(default)]
    pub symbol_roles: i32,
}

impl Occurrence {
    pub fn new(symbol: impl Into<String>, range: Range, symbol_roles: i32) -> Self {
        Self {
            symbol: symbol.into(),
            range,
            symbol_roles,
        }
    }

    pub fn has_role(&self, role: i32) -> bool {
        self.symbol_roles & role != 0
    }

    pub fn is_definition(&self) -> bool {
        self.has_role(SymbolRole::DEFINITION)
    }
}

/// An indexed document; `path` is relative to the upload root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    pub occurrences: Vec<Occurrence>,
}

impl Document {
    /// Build a document whose occurrences are sorted by range, which the lookup helpers rely on
    pub fn new(path: impl Into<String>, mut occurrences: Vec<Occurrence>) -> Self {
        sort_occurrences(&mut occurrences);
        Self {
            path: path.into(),
            occurrences,
        }
    }
}

pub fn sort_occurrences(occurrences: &mut [Occurrence]) {
    occurrences.sort_by(|a, b| a.range.cmp(&b.range));
}

/// Return every occurrence whose range equals `range`.
///
/// `occurrences` must be sorted by start position. Indexers may emit several
/// occurrences at one identical range (e.g. a definition and a reference), so
/// all ties are collected.
pub fn find_occurrences_with_equal_range(
    occurrences: &[Occurrence],
    range: Range,
) -> Vec<Occurrence> {
    let Ok(idx) = occurrences.binary_search_by(|occ| occ.range.start.cmp(&range.start)) else {
        return Vec::new();
    };

    let mut lo = idx;
    while lo > 0 && occurrences[lo - 1].range.start == range.start {
        lo -= 1;
    }
    let mut hi = idx + 1;
    while hi < occurrences.len() && occurrences[hi].range.start == range.start {
        hi += 1;
    }

    occurrences[lo..hi]
        .iter()
        .filter(|occ| occ.range == range)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn occ(symbol: &str, range: Range) -> Occurrence {
        Occurrence::new(symbol, range, 0)
    }

    #[test]
    fn equal_range_lookup_collects_ties() {
        let target = Range::from_coords(4, 2, 4, 7);
        let document = Document::new(
            "a.go",
            vec![
                occ("a", Range::from_coords(1, 0, 1, 3)),
                occ("def", target),
                occ("c", Range::from_coords(4, 2, 4, 9)),
                occ("ref", target),
                occ("d", Range::from_coords(9, 0, 9, 1)),
            ],
        );

        let found = find_occurrences_with_equal_range(&document.occurrences, target);
        let mut symbols: Vec<_> = found.iter().map(|o| o.symbol.as_str()).collect();
        symbols.sort();
        assert_eq!(symbols, vec!["def", "ref"]);
    }

    #[test]
    fn equal_range_lookup_misses_cleanly() {
        let document = Document::new("a.go", vec![occ("a", Range::from_coords(1, 0, 1, 3))]);
        let wider = Range::from_coords(1, 0, 1, 4);
        assert!(find_occurrences_with_equal_range(&document.occurrences, wider).is_empty());
        let earlier = Range::from_coords(0, 0, 0, 1);
        assert!(find_occurrences_with_equal_range(&document.occurrences, earlier).is_empty());
        assert!(find_occurrences_with_equal_range(&[], Range::default()).is_empty());
    }

    #[test]
    fn role_bits() {
        let o = Occurrence::new("s", Range::default(), SymbolRole::DEFINITION | SymbolRole::TEST);
        assert!(o.is_definition());
        assert!(o.has_role(SymbolRole::TEST));
        assert!(!o.has_role(SymbolRole::IMPORT));
    }
}
