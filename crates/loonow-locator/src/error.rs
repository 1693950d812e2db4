use thiserror::Error;

use loonow_core::CoreError;

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("invalid facility data: {0}")]
    Core(#[from] CoreError),

    #[error("invalid search: {0}")]
    InvalidQuery(String),

    #[error("facility source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read facility directory {path}: {source}")]
    DirectoryIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse facility directory: {0}")]
    DirectoryParse(#[from] serde_yaml::Error),

    #[error("facility directory validation failed: {0}")]
    Validation(String),
}
