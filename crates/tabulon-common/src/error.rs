//! Excel-style error tags.
//!
//! `spec.md` closes the error space at exactly seven tags. Unlike the
//! teacher's `ExcelErrorKind`, there is no `#N/IMPL`, `#SPILL!`, `#CALC!`,
//! `#CIRC!`, or cancellation tag here — those are formula-language or
//! host-UI concerns the core doesn't surface as a stored cell value.

use std::fmt;

/// One of the seven error values a cell can hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorTag {
    Null,
    Ref,
    Name,
    Value,
    Div0,
    Na,
    Num,
}

impl ErrorTag {
    /// Canonical Excel spelling, e.g. `#DIV/0!`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorTag::Null => "#NULL!",
            ErrorTag::Ref => "#REF!",
            ErrorTag::Name => "#NAME?",
            ErrorTag::Value => "#VALUE!",
            ErrorTag::Div0 => "#DIV/0!",
            ErrorTag::Na => "#N/A",
            ErrorTag::Num => "#NUM!",
        }
    }

    /// Parse a canonical spelling back into a tag. Returns `None` for any
    /// string that isn't one of the seven exact spellings.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "#NULL!" => ErrorTag::Null,
            "#REF!" => ErrorTag::Ref,
            "#NAME?" => ErrorTag::Name,
            "#VALUE!" => ErrorTag::Value,
            "#DIV/0!" => ErrorTag::Div0,
            "#N/A" => ErrorTag::Na,
            "#NUM!" => ErrorTag::Num,
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorTag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorTag::parse(s).ok_or(())
    }
}
