use thiserror::Error;

/// Errors surfaced by document store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key in '{collection}': {field} = {value}")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    #[error("expected a JSON object document, got {0}")]
    NotADocument(&'static str),

    #[error("unsupported database endpoint '{0}'")]
    UnsupportedEndpoint(String),

    #[error("document store is closed")]
    Closed,

    #[error("failed to (de)serialize document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
