use thiserror::Error;

/// Errors from structural operations. Read operations never fail —
/// out-of-range reads resolve to "empty"/default per the data model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid argument at row {row:?}, col {col:?}: {reason}")]
    InvalidArgument {
        row: Option<u32>,
        col: Option<u32>,
        reason: String,
    },
}

impl StoreError {
    pub fn invalid(row: Option<u32>, col: Option<u32>, reason: impl Into<String>) -> Self {
        StoreError::InvalidArgument {
            row,
            col,
            reason: reason.into(),
        }
    }
}
