use tabulon_common::CellKey;
use thiserror::Error;

/// `setDeps` fails this way when adding the requested precedent edges would
/// create a cycle. Every key on `path` is added to the circular set
/// regardless; the caller decides how to surface `#REF!`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("circular reference through {path:?}")]
pub struct CircularError {
    pub path: Vec<CellKey>,
}
