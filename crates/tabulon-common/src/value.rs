//! Cell values and declared value-kinds.
//!
//! `spec.md` §3 closes the raw-value space at six variants: null, number,
//! boolean, string, formatted-text, and error tag. The teacher's
//! `LiteralValue` additionally carries `Int`/`Array`/`Date`/`DateTime`/
//! `Time`/`Duration`/`Pending` variants and an Excel-serial date system —
//! none of those have a counterpart here, since the core has no date/time
//! concept and no array-formula evaluation. Dropping them also drops the
//! `chrono` dependency entirely (recorded in `DESIGN.md`).

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::ErrorTag;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One formatting run over a `FormattedText` string. `format` is opaque to
/// the core — it is whatever payload a host attaches (bold/italic/color/...).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub start: usize,
    pub end: usize,
    pub format: serde_json::Value,
}

impl TextRun {
    pub fn new(start: usize, end: usize, format: serde_json::Value) -> Self {
        Self { start, end, format }
    }
}

/// A text string plus an ordered, non-overlapping sequence of formatting
/// runs. Runs may leave gaps (unformatted regions) but, after
/// normalization, must not overlap.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedText {
    pub text: String,
    pub runs: Vec<TextRun>,
}

impl FormattedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            runs: Vec::new(),
        }
    }

    /// Sort runs by start and reject any that overlap. Gaps are allowed.
    pub fn normalize(mut self) -> Result<Self, ValueError> {
        self.runs.sort_by_key(|r| r.start);
        for pair in self.runs.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(ValueError::OverlappingRuns {
                    first_end: pair[0].end,
                    second_start: pair[1].start,
                });
            }
        }
        for run in &self.runs {
            if run.start >= run.end || run.end > self.text.len() {
                return Err(ValueError::RunOutOfBounds {
                    start: run.start,
                    end: run.end,
                    len: self.text.len(),
                });
            }
        }
        Ok(self)
    }
}

/// Errors surfaced while building or normalizing a [`CellValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    OverlappingRuns { first_end: usize, second_start: usize },
    RunOutOfBounds { start: usize, end: usize, len: usize },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::OverlappingRuns { first_end, second_start } => write!(
                f,
                "formatting runs overlap: run ending at {first_end} starts again at {second_start}"
            ),
            ValueError::RunOutOfBounds { start, end, len } => {
                write!(f, "run [{start}, {end}) out of bounds for text of length {len}")
            }
        }
    }
}

impl std::error::Error for ValueError {}

/// The raw value held in a cell record, per `spec.md` §3.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Number(f64),
    Boolean(bool),
    Text(String),
    FormattedText(FormattedText),
    Error(ErrorTag),
}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CellValue::Null => state.write_u8(0),
            CellValue::Number(n) => n.to_bits().hash(state),
            CellValue::Boolean(b) => b.hash(state),
            CellValue::Text(s) => s.hash(state),
            CellValue::FormattedText(ft) => ft.text.hash(state),
            CellValue::Error(e) => e.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::FormattedText(ft) => write!(f, "{}", ft.text),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

impl CellValue {
    /// The cell is empty iff its value is null — callers must additionally
    /// check the cell record's formula/format/borders/comment fields per
    /// `spec.md` §3's emptiness predicate; this only covers the value half.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            CellValue::Null => ValueKind::Null,
            CellValue::Number(_) => ValueKind::Number,
            CellValue::Boolean(_) => ValueKind::Boolean,
            CellValue::Text(_) => ValueKind::String,
            CellValue::FormattedText(_) => ValueKind::FormattedText,
            CellValue::Error(_) => ValueKind::Error,
        }
    }
}

/// The declared value-kind carried alongside a cell's raw value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Number,
    Boolean,
    String,
    FormattedText,
    Error,
}
