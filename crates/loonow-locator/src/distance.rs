//! Haversine great-circle distance.

use loonow_core::{round_to_hundredths, Coordinate, Distance, UnitSystem};

/// Great-circle distance between two points in decimal degrees, in `unit`,
/// rounded to two decimal places.
///
/// Inputs are not range-checked; callers that need strict latitude and
/// longitude bounds validate upstream with [`Coordinate::validate_range`].
#[must_use]
pub fn haversine(
    origin_lat: f64,
    origin_lon: f64,
    target_lat: f64,
    target_lon: f64,
    unit: UnitSystem,
) -> f64 {
    let d_lat = (target_lat - origin_lat).to_radians();
    let d_lon = (target_lon - origin_lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + origin_lat.to_radians().cos() * target_lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    round_to_hundredths(unit.earth_radius() * c)
}

/// [`haversine`] over [`Coordinate`]s, tagged with its unit.
#[must_use]
pub fn distance_between(origin: Coordinate, target: Coordinate, unit: UnitSystem) -> Distance {
    Distance::new(
        haversine(
            origin.latitude,
            origin.longitude,
            target.latitude,
            target.longitude,
            unit,
        ),
        unit,
    )
}
