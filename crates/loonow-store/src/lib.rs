//! Application state for the restroom finder.
//!
//! [`FacilityStore`] is the single mutable aggregate: it refreshes the
//! facility list through a [`loonow_locator::FacilitySource`], records
//! visits, runs the achievement [`rules`], persists the durable subset
//! through a [`StateRepository`], and broadcasts an [`AppState`] snapshot
//! after every committed change.

pub mod error;
pub mod persist;
pub mod rules;
pub mod state;
pub mod store;

pub use error::PersistError;
pub use persist::{decode, encode, JsonFileRepository, MemoryRepository, StateRepository};
pub use rules::VisitEvent;
pub use state::{AppState, PersistedState};
pub use store::{FacilityStore, RefreshTicket, StoreSettings};
