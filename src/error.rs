use thiserror::Error;

/// Errors reported before any sorting work starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SortError {
    #[error("cannot sort an empty sequence")]
    EmptyInput,

    #[error("sequence of {len} symbols exceeds the supported maximum of {max}")]
    TooLong { len: usize, max: usize },

    #[error("invalid collation: {0}")]
    InvalidCollation(String),

    #[error("collation covers {found} symbols but the text alphabet has {expected}")]
    CollationWidth { expected: usize, found: usize },
}
