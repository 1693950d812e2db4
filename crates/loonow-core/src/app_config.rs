use std::path::PathBuf;

use crate::location::Coordinate;

/// Upper bound on candidates requested per facility refresh.
pub const MAX_SEARCH_COUNT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// File holding the persisted subset of application state.
    pub state_path: PathBuf,
    /// Optional YAML facility directory; replaces synthesis when set.
    pub directory_path: Option<PathBuf>,
    /// Candidates requested per facility refresh.
    pub search_count: usize,
    /// Search radius in the active unit system.
    pub search_radius: f64,
    /// Position used when the device location is unavailable.
    pub fallback_location: Coordinate,
    pub event_capacity: usize,
    /// Fixed RNG seed for reproducible synthesis.
    pub synthesis_seed: Option<u64>,
}
