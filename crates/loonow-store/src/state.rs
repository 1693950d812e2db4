use serde::{Deserialize, Serialize};

use loonow_core::{
    reconcile_with_seed, seed_achievements, Achievement, Appearance, Coordinate, Facility,
    UnitSystem,
};

/// A complete, immutable view of application state.
///
/// Subscribers receive one of these per committed change.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Ascending by distance; facilities without a distance last.
    pub facilities: Vec<Facility>,
    /// Insertion order, unique by id.
    pub saved_facilities: Vec<Facility>,
    /// Always the seed ids, in seed order.
    pub achievements: Vec<Achievement>,
    pub current_location: Option<Coordinate>,
    pub selected_facility: Option<Facility>,
    pub unit_system: UnitSystem,
    pub notifications_enabled: bool,
    pub appearance: Appearance,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            facilities: Vec::new(),
            saved_facilities: Vec::new(),
            achievements: seed_achievements(),
            current_location: None,
            selected_facility: None,
            unit_system: UnitSystem::default(),
            notifications_enabled: true,
            appearance: Appearance::default(),
            is_loading: false,
            error: None,
        }
    }
}

impl AppState {
    /// Cold-start state: the persisted subset restored, everything else default.
    #[must_use]
    pub fn from_persisted(persisted: PersistedState) -> Self {
        let mut saved_facilities: Vec<Facility> = Vec::with_capacity(persisted.saved_facilities.len());
        for facility in persisted.saved_facilities {
            if !saved_facilities.iter().any(|f| f.id() == facility.id()) {
                saved_facilities.push(facility);
            }
        }

        Self {
            saved_facilities,
            achievements: reconcile_with_seed(&persisted.achievements),
            unit_system: persisted.unit_system,
            notifications_enabled: persisted.notifications_enabled,
            appearance: persisted.appearance,
            ..Self::default()
        }
    }

    /// The subset that survives restarts.
    #[must_use]
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            saved_facilities: self.saved_facilities.clone(),
            achievements: self.achievements.clone(),
            unit_system: self.unit_system,
            notifications_enabled: self.notifications_enabled,
            appearance: self.appearance,
        }
    }

    #[must_use]
    pub fn facility(&self, id: &str) -> Option<&Facility> {
        self.facilities.iter().find(|f| f.id() == id)
    }

    #[must_use]
    pub fn is_saved(&self, id: &str) -> bool {
        self.saved_facilities.iter().any(|f| f.id() == id)
    }

    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }
}

/// Durable preferences and progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub saved_facilities: Vec<Facility>,
    pub achievements: Vec<Achievement>,
    pub unit_system: UnitSystem,
    pub notifications_enabled: bool,
    pub appearance: Appearance,
}

impl Default for PersistedState {
    fn default() -> Self {
        AppState::default().persisted()
    }
}
