//! YAML facility directory, an offline stand-in for a directory service.
//!
//! ```yaml
//! facilities:
//!   - id: grand-central-lower
//!     name: Grand Central Lower Level
//!     address: 89 E 42nd St
//!     latitude: 40.7527
//!     longitude: -73.9772
//!     rating: 4.6
//!     is_free: true
//!     is_accessible: true
//!     has_changing_table: true
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use loonow_core::{Coordinate, Facility, FacilityAttributes};

use crate::error::LocatorError;
use crate::source::{FacilitySource, FixedSource, SearchQuery};

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<f64>,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub is_accessible: bool,
    #[serde(default)]
    pub has_changing_table: bool,
}

#[derive(Debug, Deserialize)]
pub struct FacilityDirectory {
    pub facilities: Vec<DirectoryEntry>,
}

/// Load and validate a facility directory from a YAML file.
///
/// # Errors
///
/// Returns `LocatorError` if the file cannot be read, parsed, or fails validation.
pub fn load_directory(path: &Path) -> Result<FacilityDirectory, LocatorError> {
    let content = std::fs::read_to_string(path).map_err(|e| LocatorError::DirectoryIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_directory(&content)
}

fn parse_directory(content: &str) -> Result<FacilityDirectory, LocatorError> {
    let directory: FacilityDirectory = serde_yaml::from_str(content)?;
    validate_directory(&directory)?;
    Ok(directory)
}

fn validate_directory(directory: &FacilityDirectory) -> Result<(), LocatorError> {
    let mut seen_ids = HashSet::new();

    for entry in &directory.facilities {
        if entry.name.trim().is_empty() {
            return Err(LocatorError::Validation(format!(
                "facility '{}' has an empty name",
                entry.id
            )));
        }

        Coordinate {
            latitude: entry.latitude,
            longitude: entry.longitude,
        }
        .validate_range()
        .map_err(|e| LocatorError::Validation(format!("facility '{}': {e}", entry.id)))?;

        if !seen_ids.insert(entry.id.as_str()) {
            return Err(LocatorError::Validation(format!(
                "duplicate facility id: '{}'",
                entry.id
            )));
        }
    }

    Ok(())
}

impl FacilityDirectory {
    /// Convert every entry into a validated [`Facility`].
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::Core`] when an entry fails facility validation
    /// (empty id, rating out of range).
    pub fn into_facilities(self) -> Result<Vec<Facility>, LocatorError> {
        self.facilities
            .into_iter()
            .map(|entry| {
                Facility::new(
                    entry.id,
                    entry.name,
                    entry.address,
                    Coordinate {
                        latitude: entry.latitude,
                        longitude: entry.longitude,
                    },
                    FacilityAttributes {
                        rating: entry.rating,
                        is_free: entry.is_free,
                        is_accessible: entry.is_accessible,
                        has_changing_table: entry.has_changing_table,
                    },
                )
                .map_err(LocatorError::from)
            })
            .collect()
    }
}

/// Serves facilities from a loaded directory file.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    inner: FixedSource,
}

impl DirectorySource {
    /// # Errors
    ///
    /// Returns `LocatorError` if the directory cannot be loaded or validated.
    pub fn open(path: &Path) -> Result<Self, LocatorError> {
        let facilities = load_directory(path)?.into_facilities()?;
        tracing::info!(
            path = %path.display(),
            count = facilities.len(),
            "loaded facility directory"
        );
        Ok(Self {
            inner: FixedSource::new(facilities),
        })
    }
}

impl FacilitySource for DirectorySource {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn nearby(&self, query: &SearchQuery) -> Result<Vec<Facility>, LocatorError> {
        self.inner.nearby(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r"
facilities:
  - id: bryant-park
    name: Bryant Park Restroom
    address: 42nd St & 6th Ave
    latitude: 40.7536
    longitude: -73.9832
    rating: 4.8
    is_free: true
    is_accessible: true
  - id: penn-station
    name: Penn Station Facilities
    address: 8th Ave & 31st St
    latitude: 40.7506
    longitude: -73.9935
";

    #[test]
    fn parses_valid_directory() {
        let directory = parse_directory(VALID).unwrap();
        assert_eq!(directory.facilities.len(), 2);
        let facilities = directory.into_facilities().unwrap();
        assert_eq!(facilities[0].rating(), Some(4.8));
        assert!(facilities[0].is_free());
        assert!(!facilities[1].has_changing_table());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = r"
facilities:
  - { id: a, name: A, address: x, latitude: 1.0, longitude: 1.0 }
  - { id: a, name: B, address: y, latitude: 2.0, longitude: 2.0 }
";
        let err = parse_directory(yaml).unwrap_err();
        assert!(matches!(err, LocatorError::Validation(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let yaml = r"
facilities:
  - { id: a, name: A, address: x, latitude: 95.0, longitude: 1.0 }
";
        assert!(matches!(
            parse_directory(yaml),
            Err(LocatorError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_name() {
        let yaml = r"
facilities:
  - { id: a, name: ' ', address: x, latitude: 1.0, longitude: 1.0 }
";
        assert!(matches!(
            parse_directory(yaml),
            Err(LocatorError::Validation(_))
        ));
    }

    #[test]
    fn rating_out_of_range_fails_conversion() {
        let yaml = r"
facilities:
  - { id: a, name: A, address: x, latitude: 1.0, longitude: 1.0, rating: 9.0 }
";
        let directory = parse_directory(yaml).unwrap();
        assert!(matches!(
            directory.into_facilities(),
            Err(LocatorError::Core(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_directory(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, LocatorError::DirectoryIo { .. }));
    }
}
