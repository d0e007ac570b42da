//! Error types for the diff crate.

/// Errors that can occur while computing a patch.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// An entry list was not in ascending path order.
    #[error("entries not sorted: {first:?} is listed before {second:?}")]
    Unsorted { first: String, second: String },

    /// An entry list contained the same path twice.
    #[error("duplicate entry path: {0}")]
    DuplicatePath(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
