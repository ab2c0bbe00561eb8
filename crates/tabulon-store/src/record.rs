//! Cell records and row/column metadata.

use tabulon_common::{CellValue, ValueKind};

/// The opaque, host-owned payloads a record may carry alongside its value.
/// The core never inspects their contents — only whether they're present,
/// which determines emptiness per the data model's emptiness predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellPayloads {
    pub format: Option<serde_json::Value>,
    pub borders: Option<serde_json::Value>,
    pub comment: Option<String>,
}

impl CellPayloads {
    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.borders.is_none() && self.comment.is_none()
    }
}

/// Everything stored for one non-empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub value: CellValue,
    pub kind: ValueKind,
    pub formula: Option<String>,
    pub last_result: Option<CellValue>,
    pub payloads: CellPayloads,
    pub dirty: bool,
}

impl CellRecord {
    pub fn new(value: CellValue) -> Self {
        let kind = value.kind();
        Self {
            value,
            kind,
            formula: None,
            last_result: None,
            payloads: CellPayloads::default(),
            dirty: false,
        }
    }

    /// A record is empty iff its value is null and it carries no formula,
    /// format, borders, or comment. Empty records are never stored.
    pub fn is_empty(&self) -> bool {
        self.value.is_null()
            && self.formula.is_none()
            && self.payloads.is_empty()
    }
}

/// Per-row metadata. Absent entries resolve to `RowInfo::default()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowInfo {
    pub height: f64,
    pub hidden: bool,
    pub custom_height: bool,
}

impl RowInfo {
    pub const DEFAULT_HEIGHT: f64 = 20.0;

    /// An entry equal to the default with no flags set is not worth
    /// persisting — `is_default` lets callers evict it.
    pub fn is_default(&self) -> bool {
        !self.hidden && !self.custom_height && self.height == Self::DEFAULT_HEIGHT
    }
}

impl Default for RowInfo {
    fn default() -> Self {
        Self {
            height: Self::DEFAULT_HEIGHT,
            hidden: false,
            custom_height: false,
        }
    }
}

/// Per-column metadata. Absent entries resolve to `ColInfo::default()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColInfo {
    pub width: f64,
    pub hidden: bool,
    pub custom_width: bool,
}

impl ColInfo {
    pub const DEFAULT_WIDTH: f64 = 64.0;

    pub fn is_default(&self) -> bool {
        !self.hidden && !self.custom_width && self.width == Self::DEFAULT_WIDTH
    }
}

impl Default for ColInfo {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            hidden: false,
            custom_width: false,
        }
    }
}
