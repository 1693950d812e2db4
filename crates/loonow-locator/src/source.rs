//! Pluggable facility data sources.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;

use loonow_core::{sort_by_distance, Coordinate, Facility, UnitSystem, MAX_SEARCH_COUNT};

use crate::distance::distance_between;
use crate::error::LocatorError;
use crate::synthesize::synthesize;

/// One facility lookup around an origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchQuery {
    pub origin: Coordinate,
    /// Upper bound on results.
    pub count: usize,
    /// Radius in `unit`.
    pub max_distance: f64,
    pub unit: UnitSystem,
}

impl SearchQuery {
    /// # Errors
    ///
    /// Returns [`LocatorError`] for a non-finite origin, a radius that is
    /// not a positive finite number, or a count above [`MAX_SEARCH_COUNT`].
    pub fn validate(&self) -> Result<(), LocatorError> {
        self.origin.ensure_finite()?;
        if self.count > MAX_SEARCH_COUNT {
            return Err(LocatorError::InvalidQuery(format!(
                "count must be at most {MAX_SEARCH_COUNT}, got {}",
                self.count
            )));
        }
        if !self.max_distance.is_finite() || self.max_distance <= 0.0 {
            return Err(LocatorError::InvalidQuery(format!(
                "radius must be a positive number, got {}",
                self.max_distance
            )));
        }
        Ok(())
    }
}

/// Anything that can list facilities near an origin.
///
/// Implementations return at most `query.count` facilities, every one with a
/// distance in `query.unit` no greater than `query.max_distance`, sorted
/// ascending by distance.
pub trait FacilitySource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns [`LocatorError`] when the query is malformed or the backing
    /// data cannot be read.
    fn nearby(&self, query: &SearchQuery) -> Result<Vec<Facility>, LocatorError>;
}

/// Origins are matched to four decimal places (about 11 m).
const ORIGIN_PRECISION: f64 = 1e4;

enum Seeding {
    /// One generator advanced by every query.
    Shared(Mutex<StdRng>),
    /// A fresh generator per query, derived from the rounded origin.
    ByOrigin(u64),
}

/// Random facilities around the origin, standing in for a directory service.
pub struct SyntheticSource {
    seeding: Seeding,
}

impl SyntheticSource {
    /// Seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seeding: Seeding::Shared(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// Reproducible sequence of results for a given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeding: Seeding::Shared(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// The same origin and `salt` always yield the same facilities, ids
    /// included, so ids listed by one process stay valid in the next.
    #[must_use]
    pub fn anchored(salt: u64) -> Self {
        Self {
            seeding: Seeding::ByOrigin(salt),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn origin_seed(origin: Coordinate, salt: u64) -> u64 {
    let lat = ((origin.latitude * ORIGIN_PRECISION).round() as i64).cast_unsigned();
    let lon = ((origin.longitude * ORIGIN_PRECISION).round() as i64).cast_unsigned();
    salt ^ lat.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ lon.wrapping_mul(0xC2B2_AE3D_27D4_EB4F).rotate_left(31)
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FacilitySource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn nearby(&self, query: &SearchQuery) -> Result<Vec<Facility>, LocatorError> {
        query.validate()?;
        match &self.seeding {
            Seeding::Shared(rng) => {
                let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                synthesize(
                    &mut *rng,
                    query.origin,
                    query.count,
                    query.max_distance,
                    query.unit,
                )
            }
            Seeding::ByOrigin(salt) => {
                let mut rng = StdRng::seed_from_u64(origin_seed(query.origin, *salt));
                synthesize(
                    &mut rng,
                    query.origin,
                    query.count,
                    query.max_distance,
                    query.unit,
                )
            }
        }
    }
}

/// A known facility list filtered and ranked against each query.
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    facilities: Vec<Facility>,
}

impl FixedSource {
    #[must_use]
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self { facilities }
    }

    #[must_use]
    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }
}

impl FacilitySource for FixedSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn nearby(&self, query: &SearchQuery) -> Result<Vec<Facility>, LocatorError> {
        query.validate()?;
        let mut ranked: Vec<Facility> = self
            .facilities
            .iter()
            .map(|f| {
                f.with_distance(Some(distance_between(
                    query.origin,
                    f.coordinate(),
                    query.unit,
                )))
            })
            .filter(|f| {
                f.distance()
                    .is_some_and(|d| d.value <= query.max_distance)
            })
            .collect();
        sort_by_distance(&mut ranked);
        ranked.truncate(query.count);
        Ok(ranked)
    }
}
