//! Coordinates and unit-tagged distances.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Fixed conversion ratio between the two unit systems.
pub const KM_PER_MILE: f64 = 1.609_34;

const EARTH_RADIUS_MILES: f64 = 3_958.8;
const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Round to two decimal places, the precision every displayed distance uses.
#[must_use]
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting NaN and infinite components.
    ///
    /// Range is not checked here; see [`Coordinate::validate_range`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonFiniteCoordinate`] if either component is not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.ensure_finite()?;
        Ok(coordinate)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::NonFiniteCoordinate`] if either component is not finite.
    pub fn ensure_finite(&self) -> Result<(), CoreError> {
        if self.latitude.is_finite() && self.longitude.is_finite() {
            Ok(())
        } else {
            Err(CoreError::NonFiniteCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Strict check for callers that need |lat| <= 90 and |lon| <= 180.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonFiniteCoordinate`] or
    /// [`CoreError::CoordinateOutOfRange`].
    pub fn validate_range(&self) -> Result<(), CoreError> {
        self.ensure_finite()?;
        if self.latitude.abs() > 90.0 || self.longitude.abs() > 180.0 {
            return Err(CoreError::CoordinateOutOfRange {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    Miles,
    Kilometers,
}

impl UnitSystem {
    /// Mean Earth radius expressed in this unit.
    #[must_use]
    pub fn earth_radius(self) -> f64 {
        match self {
            UnitSystem::Miles => EARTH_RADIUS_MILES,
            UnitSystem::Kilometers => EARTH_RADIUS_KM,
        }
    }

    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            UnitSystem::Miles => "mi",
            UnitSystem::Kilometers => "km",
        }
    }

    /// The other unit system; the settings panel flips between the two.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Miles => UnitSystem::Kilometers,
            UnitSystem::Kilometers => UnitSystem::Miles,
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitSystem::Miles => write!(f, "Miles"),
            UnitSystem::Kilometers => write!(f, "Kilometers"),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "miles" | "mile" | "mi" => Ok(UnitSystem::Miles),
            "kilometers" | "kilometres" | "kilometer" | "km" => Ok(UnitSystem::Kilometers),
            _ => Err(CoreError::UnknownUnitSystem(s.to_string())),
        }
    }
}

/// A distance tagged with the unit it was computed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub value: f64,
    pub unit: UnitSystem,
}

impl Distance {
    /// Rounds `value` to two decimal places.
    #[must_use]
    pub fn new(value: f64, unit: UnitSystem) -> Self {
        Self {
            value: round_to_hundredths(value),
            unit,
        }
    }

    /// Convert to `unit` with the fixed mile/kilometer ratio, rounding to two
    /// decimal places. Converting to the unit already held is a no-op.
    #[must_use]
    pub fn to_unit(self, unit: UnitSystem) -> Self {
        let value = match (self.unit, unit) {
            (UnitSystem::Miles, UnitSystem::Kilometers) => self.value * KM_PER_MILE,
            (UnitSystem::Kilometers, UnitSystem::Miles) => self.value / KM_PER_MILE,
            _ => return self,
        };
        Self::new(value, unit)
    }

    /// Order two distances, converting `other` into this distance's unit
    /// first when the units differ.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        let other = if other.unit == self.unit {
            *other
        } else {
            other.to_unit(self.unit)
        };
        self.value.total_cmp(&other.value)
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.value, self.unit.abbreviation())
    }
}
