//! Textual extraction of cell/range references and volatile function calls
//! from formula source. A proper tokenizer would be more robust, but a
//! regex-based scan is the pragmatic middle ground for the core's Non-goal
//! of not owning a formula-language parser.

use once_cell::sync::Lazy;
use regex::Regex;
use tabulon_common::{parse_cell_ref, parse_range_ref, CellKey, CellRange};

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$?[A-Za-z]{1,3}\$?[0-9]+:\$?[A-Za-z]{1,3}\$?[0-9]+").unwrap()
});

static CELL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$?[A-Za-z]{1,3}\$?[0-9]+").unwrap());

static VOLATILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(NOW|TODAY|RAND|RANDBETWEEN|OFFSET|INDIRECT|INFO|CELL)\s*\(").unwrap()
});

/// One reference found in formula source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRef {
    Single(CellKey),
    Range(CellRange),
}

/// Extract every range and single-cell reference from `formula`. Single
/// references that fall inside an already-matched range span are not
/// double-counted.
pub fn extract_references(formula: &str) -> Vec<ParsedRef> {
    let mut refs = Vec::new();
    let mut covered: Vec<(usize, usize)> = Vec::new();

    for m in RANGE_RE.find_iter(formula) {
        if let Ok(range) = parse_range_ref(m.as_str()) {
            covered.push((m.start(), m.end()));
            refs.push(ParsedRef::Range(range));
        }
    }

    for m in CELL_RE.find_iter(formula) {
        let (start, end) = (m.start(), m.end());
        if covered.iter().any(|&(cs, ce)| start >= cs && end <= ce) {
            continue;
        }
        if let Ok(key) = parse_cell_ref(m.as_str()) {
            refs.push(ParsedRef::Single(key));
        }
    }

    refs
}

/// Does `formula` call a recognized volatile function? Matching is
/// case-insensitive and requires the `(` delimiter so e.g. `CELLS` or
/// `NOWHERE` are not confused with `CELL(` / `NOW(`.
pub fn is_volatile_formula(formula: &str) -> bool {
    VOLATILE_RE.is_match(formula)
}
