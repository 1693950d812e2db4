//! Random candidate generation around an origin.
//!
//! Offsets are drawn in a square box of half-width `max_distance`; the
//! longitude span widens with latitude so the box stays roughly square on
//! the ground. Corners of the box fall outside the radius and are dropped,
//! so fewer than `count` facilities may come back.

use rand::seq::IndexedRandom;
use rand::Rng;

use loonow_core::{
    sort_by_distance, Coordinate, Facility, FacilityAttributes, UnitSystem, MAX_SEARCH_COUNT,
};

use crate::distance::distance_between;
use crate::error::LocatorError;

const NAMES: &[&str] = &[
    "Central Park Restroom",
    "City Mall Facilities",
    "Downtown Public Toilet",
    "Green Park Restroom",
    "Train Station Facilities",
    "Bus Terminal Restroom",
    "Library Toilet",
    "Museum Facilities",
    "Coffee Shop Restroom",
    "Gas Station Toilet",
    "Fast Food Restroom",
    "Hotel Lobby Facilities",
    "Beach Public Toilet",
    "Shopping Center Restroom",
    "Hospital Visitor Facilities",
];

const STREETS: &[&str] = &[
    "Main St",
    "Broadway",
    "Park Ave",
    "Oak Lane",
    "Maple Rd",
    "Washington Blvd",
    "Lincoln Ave",
    "Market St",
    "River Rd",
    "Highland Ave",
    "Center St",
    "Church St",
    "Lake Dr",
    "Pine St",
    "Cedar Ln",
];

/// Keeps the longitude span bounded near the poles.
const MIN_LONGITUDE_SCALE: f64 = 0.01;

/// Generate up to `count` facilities within `max_distance` (in `unit`) of
/// `origin`, sorted by ascending distance.
///
/// # Errors
///
/// Returns [`LocatorError::Core`] for a non-finite origin and
/// [`LocatorError::InvalidQuery`] for a non-positive or non-finite radius or
/// a `count` above [`MAX_SEARCH_COUNT`].
pub fn synthesize<R: Rng + ?Sized>(
    rng: &mut R,
    origin: Coordinate,
    count: usize,
    max_distance: f64,
    unit: UnitSystem,
) -> Result<Vec<Facility>, LocatorError> {
    origin.ensure_finite()?;
    if !max_distance.is_finite() || max_distance <= 0.0 {
        return Err(LocatorError::InvalidQuery(format!(
            "radius must be a positive number, got {max_distance}"
        )));
    }
    if count > MAX_SEARCH_COUNT {
        return Err(LocatorError::InvalidQuery(format!(
            "count must be at most {MAX_SEARCH_COUNT}, got {count}"
        )));
    }

    let units_per_degree = unit.earth_radius().to_radians();
    let lat_span = max_distance / units_per_degree;
    let lon_scale = origin.latitude.to_radians().cos().abs().max(MIN_LONGITUDE_SCALE);
    let lon_span = max_distance / (units_per_degree * lon_scale);

    let mut facilities = Vec::with_capacity(count);
    for _ in 0..count {
        let candidate = Coordinate::new(
            (origin.latitude + rng.random_range(-1.0..=1.0) * lat_span).clamp(-90.0, 90.0),
            wrap_longitude(origin.longitude + rng.random_range(-1.0..=1.0) * lon_span),
        )?;

        let distance = distance_between(origin, candidate, unit);
        if distance.value.is_nan() || distance.value > max_distance {
            continue;
        }

        let facility = random_facility(rng, candidate)?.with_distance(Some(distance));
        facilities.push(facility);
    }

    tracing::debug!(
        requested = count,
        accepted = facilities.len(),
        max_distance,
        %unit,
        "synthesized facilities"
    );

    sort_by_distance(&mut facilities);
    Ok(facilities)
}

fn wrap_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

fn random_facility<R: Rng + ?Sized>(
    rng: &mut R,
    coordinate: Coordinate,
) -> Result<Facility, LocatorError> {
    let id = uuid::Builder::from_random_bytes(rng.random()).into_uuid();
    let name = NAMES.choose(rng).copied().unwrap_or("Public Restroom");
    let street = STREETS.choose(rng).copied().unwrap_or("Main St");
    let street_number: u32 = rng.random_range(1..=1000);
    let rating_tenths: u8 = rng.random_range(10..=50);

    let attributes = FacilityAttributes {
        rating: Some(f64::from(rating_tenths) / 10.0),
        is_free: rng.random_bool(0.7),
        is_accessible: rng.random_bool(0.8),
        has_changing_table: rng.random_bool(0.5),
    };

    Facility::new(
        id.to_string(),
        name,
        format!("{street_number} {street}"),
        coordinate,
        attributes,
    )
    .map_err(LocatorError::from)
}
