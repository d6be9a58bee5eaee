use thiserror::Error;

/// Errors raised by the index builder and the query engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Two input records share a location; no index is produced.
    #[error("duplicate record location {location:?} (records {first} and {second})")]
    DuplicateKey {
        location: String,
        first: usize,
        second: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
