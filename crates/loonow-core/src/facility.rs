//! The restroom point of interest and its visit metadata.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::{Coordinate, Distance, UnitSystem};
use crate::CoreError;

const MIN_RATING: f64 = 1.0;
const MAX_RATING: f64 = 5.0;

/// Display attributes fixed when a facility is first produced by a source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FacilityAttributes {
    /// Average user rating in `1.0..=5.0`, if any.
    pub rating: Option<f64>,
    pub is_free: bool,
    pub is_accessible: bool,
    pub has_changing_table: bool,
}

/// A restroom location.
///
/// Position and attributes are immutable once built. `distance` is derived
/// from the current origin and unit system; `last_visited` and `visit_count`
/// change only through [`Facility::visited_at`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FacilityRecord")]
pub struct Facility {
    id: String,
    name: String,
    address: String,
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<Distance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
    is_free: bool,
    is_accessible: bool,
    has_changing_table: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_visited: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visit_count: Option<u32>,
}

impl Facility {
    /// Build a facility with no distance and no visit history.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyId`] for a blank id,
    /// [`CoreError::NonFiniteCoordinate`] for NaN/infinite coordinates, and
    /// [`CoreError::RatingOutOfRange`] for a rating outside `1.0..=5.0`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        coordinate: Coordinate,
        attributes: FacilityAttributes,
    ) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::EmptyId);
        }
        coordinate.ensure_finite()?;
        if let Some(rating) = attributes.rating {
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(CoreError::RatingOutOfRange(rating));
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            address: address.into(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            distance: None,
            rating: attributes.rating,
            is_free: attributes.is_free,
            is_accessible: attributes.is_accessible,
            has_changing_table: attributes.has_changing_table,
            last_visited: None,
            visit_count: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    #[must_use]
    pub fn distance(&self) -> Option<Distance> {
        self.distance
    }

    #[must_use]
    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    #[must_use]
    pub fn attributes(&self) -> FacilityAttributes {
        FacilityAttributes {
            rating: self.rating,
            is_free: self.is_free,
            is_accessible: self.is_accessible,
            has_changing_table: self.has_changing_table,
        }
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.is_free
    }

    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.is_accessible
    }

    #[must_use]
    pub fn has_changing_table(&self) -> bool {
        self.has_changing_table
    }

    #[must_use]
    pub fn last_visited(&self) -> Option<DateTime<Utc>> {
        self.last_visited
    }

    #[must_use]
    pub fn visit_count(&self) -> Option<u32> {
        self.visit_count
    }

    /// `true` once at least one visit has been recorded.
    #[must_use]
    pub fn has_been_visited(&self) -> bool {
        self.visit_count.is_some_and(|count| count > 0)
    }

    /// Copy with a new derived distance.
    #[must_use]
    pub fn with_distance(&self, distance: Option<Distance>) -> Self {
        Self {
            distance,
            ..self.clone()
        }
    }

    /// Copy with the distance re-expressed in `unit`. Facilities without a
    /// distance are returned unchanged.
    #[must_use]
    pub fn converted_to(&self, unit: UnitSystem) -> Self {
        self.with_distance(self.distance.map(|d| d.to_unit(unit)))
    }

    /// Copy recording one more visit at `now`.
    #[must_use]
    pub fn visited_at(&self, now: DateTime<Utc>) -> Self {
        Self {
            visit_count: Some(self.visit_count.unwrap_or(0).saturating_add(1)),
            last_visited: Some(now),
            ..self.clone()
        }
    }

    /// Copy carrying over the visit history of `previous` when it is the same
    /// facility (same id). A different facility leaves this one unchanged.
    #[must_use]
    pub fn with_visits_from(&self, previous: &Facility) -> Self {
        if previous.id != self.id {
            return self.clone();
        }
        Self {
            last_visited: previous.last_visited,
            visit_count: previous.visit_count,
            ..self.clone()
        }
    }

    /// Address line with the current distance appended, e.g.
    /// `"12 Main St, 0.40 mi away"`.
    #[must_use]
    pub fn display_address(&self) -> String {
        match self.distance {
            Some(distance) => format!("{}, {distance} away", self.address),
            None => self.address.clone(),
        }
    }
}

/// Deserialization shape; every decoded facility goes through [`Facility::new`]
/// validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FacilityRecord {
    id: String,
    name: String,
    address: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    distance: Option<Distance>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    is_free: bool,
    #[serde(default)]
    is_accessible: bool,
    #[serde(default)]
    has_changing_table: bool,
    #[serde(default)]
    last_visited: Option<DateTime<Utc>>,
    #[serde(default)]
    visit_count: Option<u32>,
}

impl TryFrom<FacilityRecord> for Facility {
    type Error = CoreError;

    fn try_from(record: FacilityRecord) -> Result<Self, Self::Error> {
        let mut facility = Facility::new(
            record.id,
            record.name,
            record.address,
            Coordinate {
                latitude: record.latitude,
                longitude: record.longitude,
            },
            FacilityAttributes {
                rating: record.rating,
                is_free: record.is_free,
                is_accessible: record.is_accessible,
                has_changing_table: record.has_changing_table,
            },
        )?;
        facility.distance = record.distance;
        facility.last_visited = record.last_visited;
        facility.visit_count = record.visit_count;
        Ok(facility)
    }
}

/// Order by ascending distance; facilities without a distance sort last.
fn compare_by_distance(a: &Facility, b: &Facility) -> Ordering {
    match (a.distance, b.distance) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by ascending distance with undefined distances last.
pub fn sort_by_distance(facilities: &mut [Facility]) {
    facilities.sort_by(compare_by_distance);
}

#[cfg(test)]
#[path = "facility_test.rs"]
mod tests;
