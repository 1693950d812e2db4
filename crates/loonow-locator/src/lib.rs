//! Facility lookup around an origin.
//!
//! Great-circle distance math, random candidate synthesis, and the
//! [`FacilitySource`] seam the store refreshes through. The synthetic source
//! stands in for a real restroom directory; [`FixedSource`] and
//! [`DirectorySource`] serve a known list for tests and offline use.

pub mod directory;
pub mod distance;
pub mod error;
pub mod source;
pub mod synthesize;

pub use directory::{load_directory, DirectorySource, FacilityDirectory};
pub use distance::{distance_between, haversine};
pub use error::LocatorError;
pub use source::{FacilitySource, FixedSource, SearchQuery, SyntheticSource};
pub use synthesize::synthesize;
