use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllowlistError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),
    #[error("Invalid hash: {0}")]
    InvalidHash(String),
    #[error("Invalid entry at line {line}: {source}")]
    InvalidEntry {
        line: usize,
        #[source]
        source: Box<AllowlistError>,
    },
    #[error("Duplicate address {address} at line {line} (first seen at line {first_line})")]
    DuplicateEntry {
        address: String,
        first_line: usize,
        line: usize,
    },
    #[error("Duplicate address {address} at position {position} (first seen at position {first_position})")]
    DuplicateAddress {
        address: String,
        first_position: usize,
        position: usize,
    },
    #[error("Allowlist is empty")]
    EmptyAllowlist,
    #[error("Leaf index {index} is out of bounds for tree with {leaves} leaves")]
    LeafIndexOutOfBounds { index: usize, leaves: usize },
    #[error("Address {0} is not in the allowlist")]
    EntryNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Rendered artifact is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, AllowlistError>;
