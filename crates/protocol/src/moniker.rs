//! Monikers: scheme + package + identifier tuples correlating one symbol across indexes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonikerData {
    /// `import`, `export`, `local`, or empty for SCIP-derived monikers
    #[serde(default)]
    pub kind: String,
    pub scheme: String,
    pub identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageInformation {
    pub manager: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedMoniker {
    pub moniker: MonikerData,
    pub package: PackageInformation,
}

/// The header fields of a SCIP symbol string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSymbol {
    pub scheme: String,
    pub package: Option<PackageInformation>,
    pub descriptors: String,
}

/// Parse the `<scheme> <manager> <name> <version> <descriptors>` header of a SCIP symbol.
///
/// Header fields are space separated; a literal space inside a field is written
/// as two spaces and `.` stands for an empty field. A symbol without a package
/// name has no package. Local symbols (`local N`) and malformed strings yield `None`.
pub fn parse_symbol(symbol: &str) -> Option<ParsedSymbol> {
    if symbol.starts_with("local ") {
        return None;
    }

    let mut rest = symbol;
    let mut fields = Vec::with_capacity(4);
    for _ in 0..4 {
        let (field, tail) = take_field(rest)?;
        fields.push(field);
        rest = tail;
    }
    if rest.is_empty() {
        return None;
    }

    let mut fields = fields.into_iter();
    let scheme = fields.next()?;
    if scheme.is_empty() {
        return None;
    }
    let manager = fields.next()?;
    let name = fields.next()?;
    let version = fields.next()?;

    let package = if name.is_empty() {
        None
    } else {
        Some(PackageInformation { manager, name, version })
    };

    Some(ParsedSymbol {
        scheme,
        package,
        descriptors: rest.to_string(),
    })
}

fn take_field(input: &str) -> Option<(String, &str)> {
    let mut field = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch != ' ' {
            field.push(ch);
            continue;
        }
        if matches!(chars.peek(), Some((_, ' '))) {
            chars.next();
            field.push(' ');
            continue;
        }
        let field = if field == "." { String::new() } else { field };
        return Some((field, &input[idx + 1..]));
    }
    None
}

/// Convert SCIP symbol names into qualified monikers.
///
/// Unparseable and package-less symbols are dropped; duplicates are removed
/// while preserving first-seen order.
pub fn symbols_to_monikers(symbol_names: &[String]) -> Vec<QualifiedMoniker> {
    let mut seen = HashSet::new();
    let mut monikers = Vec::new();
    for symbol_name in symbol_names {
        let Some(parsed) = parse_symbol(symbol_name) else {
            continue;
        };
        let Some(package) = parsed.package else {
            continue;
        };
        let moniker = QualifiedMoniker {
            moniker: MonikerData {
                kind: "export".to_string(),
                scheme: parsed.scheme,
                identifier: symbol_name.clone(),
            },
            package,
        };
        if seen.insert(moniker.clone()) {
            monikers.push(moniker);
        }
    }
    monikers
}
