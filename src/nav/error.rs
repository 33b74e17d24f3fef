use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported character for key mapping: {0:?}")]
    UnsupportedKey(char),

    #[error("Invalid excluded keys {value:?}: {reason}")]
    InvalidExcludedKeys { value: String, reason: String },

    #[error("No tab group found")]
    NoTabGroup,

    #[error("Node not found: {0}")]
    MissingNode(String),

    #[error("{0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, NavError>;
