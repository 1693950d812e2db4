//! Domain model shared by every `loonow` crate: facilities, coordinates,
//! unit-tagged distances, achievements, preferences, and env configuration.

pub mod achievements;
pub mod app_config;
pub mod config;
pub mod facility;
pub mod location;
pub mod preferences;

pub use achievements::{reconcile_with_seed, seed_achievements, Achievement, AchievementId};
pub use app_config::{AppConfig, Environment, MAX_SEARCH_COUNT};
pub use config::{load_app_config, load_app_config_from_env};
pub use facility::{sort_by_distance, Facility, FacilityAttributes};
pub use location::{round_to_hundredths, Coordinate, Distance, UnitSystem, KM_PER_MILE};
pub use preferences::Appearance;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("facility id must be non-empty")]
    EmptyId,

    #[error("coordinate ({latitude}, {longitude}) is not a finite number pair")]
    NonFiniteCoordinate { latitude: f64, longitude: f64 },

    #[error("coordinate ({latitude}, {longitude}) is outside the valid latitude/longitude range")]
    CoordinateOutOfRange { latitude: f64, longitude: f64 },

    #[error("rating {0} is outside 1.0..=5.0")]
    RatingOutOfRange(f64),

    #[error("unknown unit system: {0}")]
    UnknownUnitSystem(String),

    #[error("unknown appearance: {0}")]
    UnknownAppearance(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
