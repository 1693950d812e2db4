//! Durable storage for [`PersistedState`].
//!
//! The encoded form is a pretty-printed JSON envelope:
//!
//! ```json
//! {
//!   "state": { "savedFacilities": [], "achievements": [], "unitSystem": "Miles", ... },
//!   "version": 0
//! }
//! ```
//!
//! Decoding an encoded record and encoding it again reproduces the same bytes.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::state::PersistedState;

pub const STATE_VERSION: u32 = 0;

#[derive(Serialize, Deserialize)]
struct Envelope {
    state: PersistedState,
    version: u32,
}

/// # Errors
///
/// Returns [`PersistError::Encode`] if serialization fails.
pub fn encode(state: &PersistedState) -> Result<Vec<u8>, PersistError> {
    let envelope = Envelope {
        state: state.clone(),
        version: STATE_VERSION,
    };
    serde_json::to_vec_pretty(&envelope).map_err(PersistError::Encode)
}

/// # Errors
///
/// Returns [`PersistError::Decode`] for malformed input and
/// [`PersistError::UnsupportedVersion`] for a record written by a newer version.
pub fn decode(bytes: &[u8]) -> Result<PersistedState, PersistError> {
    let envelope: Envelope = serde_json::from_slice(bytes).map_err(PersistError::Decode)?;
    if envelope.version > STATE_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: envelope.version,
            supported: STATE_VERSION,
        });
    }
    Ok(envelope.state)
}

/// Where the persisted subset lives between runs.
pub trait StateRepository: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when stored data exists but cannot be read.
    fn load(&self) -> Result<Option<PersistedState>, PersistError>;

    /// # Errors
    ///
    /// Returns [`PersistError`] when the state cannot be written.
    fn save(&self, state: &PersistedState) -> Result<(), PersistError>;
}

/// JSON file on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl StateRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<PersistedState>, PersistError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => decode(&bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        let bytes = encode(state)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &bytes).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "persisted state");
        Ok(())
    }
}

/// Keeps the encoded bytes in memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    bytes: Mutex<Option<Vec<u8>>>,
    saves: Mutex<usize>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated with an encoded record, as if from an earlier run.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Encode`] if serialization fails.
    pub fn with_state(state: &PersistedState) -> Result<Self, PersistError> {
        let repository = Self::new();
        *repository.bytes.lock().unwrap_or_else(PoisonError::into_inner) = Some(encode(state)?);
        Ok(repository)
    }

    /// The most recently saved bytes.
    #[must_use]
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateRepository for MemoryRepository {
    fn load(&self) -> Result<Option<PersistedState>, PersistError> {
        self.bytes().as_deref().map(decode).transpose()
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        let bytes = encode(state)?;
        *self.bytes.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes);
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}
