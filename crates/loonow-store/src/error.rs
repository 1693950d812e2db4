use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode persisted state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode persisted state: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("persisted state version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
