//! The application state store.
//!
//! One [`FacilityStore`] is created at startup and handed to every
//! collaborator. All mutations run under a single lock: each one clones the
//! current [`AppState`], applies its change, swaps the whole snapshot in, and
//! then broadcasts it. Readers holding an older `Arc<AppState>` are never
//! affected, and no reader can observe half of an operation.
//!
//! Operations never return errors. Recoverable failures land in
//! [`AppState::error`]; persistence failures are logged and dropped because
//! in-memory state is authoritative.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use loonow_core::{sort_by_distance, AppConfig, Appearance, Coordinate, Facility, UnitSystem};
use loonow_locator::{distance_between, FacilitySource, LocatorError, SearchQuery};

use crate::error::PersistError;
use crate::persist::StateRepository;
use crate::rules::{self, VisitEvent};
use crate::state::AppState;

/// Refresh sizing and observer channel capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSettings {
    pub search_count: usize,
    /// Radius in whatever unit system is active when the refresh starts.
    pub search_radius: f64,
    pub event_capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            search_count: 15,
            search_radius: 10.0,
            event_capacity: 64,
        }
    }
}

impl StoreSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            search_count: config.search_count,
            search_radius: config.search_radius,
            event_capacity: config.event_capacity,
        }
    }
}

/// Handle for one in-flight refresh, returned by [`FacilityStore::begin_refresh`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub query: SearchQuery,
}

struct Inner {
    state: Arc<AppState>,
    /// Generation handed to the most recent `begin_refresh`.
    issued: u64,
    /// Generation of the most recent refresh whose result was applied.
    committed: u64,
    /// Generation of the refresh that last recorded `current_location`.
    located: u64,
}

struct Shared {
    inner: Mutex<Inner>,
    source: Arc<dyn FacilitySource>,
    repository: Arc<dyn StateRepository>,
    events: broadcast::Sender<Arc<AppState>>,
    settings: StoreSettings,
}

/// Cloneable handle to the shared application state.
#[derive(Clone)]
pub struct FacilityStore {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for FacilityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilityStore")
            .field("source", &self.shared.source.name())
            .field("settings", &self.shared.settings)
            .finish_non_exhaustive()
    }
}

impl FacilityStore {
    /// A store starting from default state, ignoring anything persisted.
    #[must_use]
    pub fn new(
        source: Arc<dyn FacilitySource>,
        repository: Arc<dyn StateRepository>,
        settings: StoreSettings,
    ) -> Self {
        Self::with_state(source, repository, settings, AppState::default())
    }

    /// Cold start: restore the persisted subset from `repository`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if stored state exists but cannot be read.
    pub fn open(
        source: Arc<dyn FacilitySource>,
        repository: Arc<dyn StateRepository>,
        settings: StoreSettings,
    ) -> Result<Self, PersistError> {
        let state = match repository.load()? {
            Some(persisted) => {
                tracing::debug!(
                    saved = persisted.saved_facilities.len(),
                    unit = %persisted.unit_system,
                    "restored persisted state"
                );
                AppState::from_persisted(persisted)
            }
            None => AppState::default(),
        };
        Ok(Self::with_state(source, repository, settings, state))
    }

    fn with_state(
        source: Arc<dyn FacilitySource>,
        repository: Arc<dyn StateRepository>,
        settings: StoreSettings,
        state: AppState,
    ) -> Self {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: Arc::new(state),
                    issued: 0,
                    committed: 0,
                    located: 0,
                }),
                source,
                repository,
                events,
                settings,
            }),
        }
    }

    /// The current state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.lock().state)
    }

    /// Receive one snapshot per committed change from now on.
    ///
    /// The channel holds `event_capacity` snapshots. A receiver that falls
    /// further behind gets `RecvError::Lagged` and skips the oldest ones;
    /// [`snapshot`](Self::snapshot) always returns the latest state.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AppState>> {
        self.shared.events.subscribe()
    }

    #[must_use]
    pub fn settings(&self) -> StoreSettings {
        self.shared.settings
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` to a copy of the current state and commit it.
    ///
    /// Nothing is committed, persisted, or broadcast when the copy comes back
    /// equal to the current state.
    fn commit<F>(&self, operation: &'static str, change: F) -> bool
    where
        F: FnOnce(&mut Inner, &mut AppState),
    {
        let mut inner = self.lock();
        let mut next = AppState::clone(&inner.state);
        change(&mut inner, &mut next);
        if next == *inner.state {
            tracing::trace!(operation, "no state change");
            return false;
        }
        self.install(&mut inner, operation, next);
        true
    }

    fn install(&self, inner: &mut Inner, operation: &'static str, next: AppState) {
        let persisted_changed = next.persisted() != inner.state.persisted();
        let next = Arc::new(next);
        inner.state = Arc::clone(&next);

        if persisted_changed {
            if let Err(e) = self.shared.repository.save(&next.persisted()) {
                tracing::warn!(operation, error = %e, "failed to persist state");
            }
        }

        // Err only means nobody is subscribed.
        let _ = self.shared.events.send(next);
        tracing::trace!(operation, "state committed");
    }

    /// Record the device position and refresh facilities around it.
    pub fn set_current_location(&self, location: Coordinate) {
        if let Err(e) = location.ensure_finite() {
            self.set_error(Some(format!("Location unavailable: {e}")));
            return;
        }
        self.refresh_with("set_current_location", location, true);
    }

    /// Replace the facility list with results around `origin`.
    ///
    /// On failure the previous list stays and `error` describes the problem.
    pub fn refresh_facilities(&self, origin: Coordinate) {
        self.refresh_with("refresh_facilities", origin, false);
    }

    /// Look up facilities without holding the lock, then apply the result
    /// in one commit unless a newer refresh has already been applied.
    fn refresh_with(&self, operation: &'static str, origin: Coordinate, locate: bool) {
        let (generation, query) = {
            let mut inner = self.lock();
            inner.issued += 1;
            (
                inner.issued,
                self.query_for(origin, inner.state.unit_system),
            )
        };

        let result = self.shared.source.nearby(&query);

        self.commit(operation, |inner, state| {
            if locate && generation > inner.located {
                inner.located = generation;
                state.current_location = Some(origin);
            }
            if generation <= inner.committed {
                tracing::debug!(
                    generation,
                    committed = inner.committed,
                    "discarding stale refresh result"
                );
                return;
            }
            inner.committed = generation;
            apply_refresh(state, origin, result);
            state.is_loading = inner.committed < inner.issued;
        });
    }

    fn query_for(&self, origin: Coordinate, unit: UnitSystem) -> SearchQuery {
        SearchQuery {
            origin,
            count: self.shared.settings.search_count,
            max_distance: self.shared.settings.search_radius,
            unit,
        }
    }

    /// Start a refresh whose lookup runs elsewhere. Sets `is_loading` and
    /// clears `error`.
    #[must_use]
    pub fn begin_refresh(&self, origin: Coordinate) -> RefreshTicket {
        let mut inner = self.lock();
        inner.issued += 1;
        let ticket = RefreshTicket {
            generation: inner.issued,
            query: self.query_for(origin, inner.state.unit_system),
        };
        let mut next = AppState::clone(&inner.state);
        next.is_loading = true;
        next.error = None;
        if next != *inner.state {
            self.install(&mut inner, "begin_refresh", next);
        }
        tracing::debug!(generation = ticket.generation, origin = %origin, "refresh started");
        ticket
    }

    /// Apply the result of a refresh started with [`begin_refresh`].
    ///
    /// Results from a request older than the last applied one are discarded.
    /// Returns whether the result was applied.
    ///
    /// [`begin_refresh`]: FacilityStore::begin_refresh
    pub fn complete_refresh(
        &self,
        ticket: RefreshTicket,
        result: Result<Vec<Facility>, LocatorError>,
    ) -> bool {
        let mut inner = self.lock();
        if ticket.generation <= inner.committed {
            tracing::debug!(
                generation = ticket.generation,
                committed = inner.committed,
                "discarding stale refresh result"
            );
            return false;
        }
        inner.committed = ticket.generation;

        let mut next = AppState::clone(&inner.state);
        apply_refresh(&mut next, ticket.query.origin, result);
        next.is_loading = inner.committed < inner.issued;
        self.install(&mut inner, "complete_refresh", next);
        true
    }

    /// Refresh around `origin` with the lookup on a blocking task.
    ///
    /// Returns whether this refresh's result was applied; `false` means a
    /// newer refresh finished first.
    pub async fn refresh_facilities_async(&self, origin: Coordinate) -> bool {
        let ticket = self.begin_refresh(origin);
        let source = Arc::clone(&self.shared.source);
        let query = ticket.query;
        let result = match tokio::task::spawn_blocking(move || source.nearby(&query)).await {
            Ok(result) => result,
            Err(e) => Err(LocatorError::Unavailable(format!("lookup task failed: {e}"))),
        };
        self.complete_refresh(ticket, result)
    }

    /// Add `facility` to the saved list unless one with the same id is there.
    pub fn save_facility(&self, facility: &Facility) {
        self.commit("save_facility", |_, state| {
            if !state.is_saved(facility.id()) {
                state.saved_facilities.push(facility.clone());
            }
        });
    }

    pub fn remove_saved_facility(&self, id: &str) {
        self.commit("remove_saved_facility", |_, state| {
            state.saved_facilities.retain(|f| f.id() != id);
        });
    }

    pub fn clear_saved_facilities(&self) {
        self.commit("clear_saved_facilities", |_, state| {
            state.saved_facilities.clear();
        });
    }

    /// Record an untimed visit now.
    pub fn visit_facility(&self, id: &str) {
        self.record_visit(&VisitEvent::new(id), Utc::now());
    }

    /// Record a visit now with the travel time it took to arrive.
    pub fn visit_facility_timed(&self, id: &str, elapsed: Duration) {
        self.record_visit(&VisitEvent::timed(id, elapsed), Utc::now());
    }

    /// Record a visit at `now`, then evaluate achievements against the
    /// updated list. Facilities and achievements change in one commit.
    /// Unknown ids are ignored.
    pub fn record_visit(&self, event: &VisitEvent, now: DateTime<Utc>) {
        self.commit("visit_facility", |_, state| {
            let Some(index) = state
                .facilities
                .iter()
                .position(|f| f.id() == event.facility_id)
            else {
                tracing::debug!(facility_id = %event.facility_id, "visit ignored: unknown facility");
                return;
            };

            let visited = state.facilities[index].visited_at(now);
            state.facilities[index] = visited.clone();
            for saved in &mut state.saved_facilities {
                if saved.id() == visited.id() {
                    *saved = visited.clone();
                }
            }
            if let Some(selected) = &mut state.selected_facility {
                if selected.id() == visited.id() {
                    *selected = visited.clone();
                }
            }

            let achievements = rules::evaluate(&state.achievements, &state.facilities, event, now);
            for id in rules::newly_unlocked(&state.achievements, &achievements) {
                tracing::info!(achievement = %id, "achievement unlocked");
            }
            state.achievements = achievements;

            tracing::info!(
                facility_id = %visited.id(),
                visit_count = visited.visit_count().unwrap_or(0),
                "visit recorded"
            );
        });
    }

    /// Switch unit systems, converting every displayed distance.
    pub fn set_unit_system(&self, unit: UnitSystem) {
        self.commit("set_unit_system", |_, state| {
            if state.unit_system == unit {
                return;
            }
            state.unit_system = unit;
            for facility in &mut state.facilities {
                *facility = facility.converted_to(unit);
            }
            for facility in &mut state.saved_facilities {
                *facility = facility.converted_to(unit);
            }
            if let Some(selected) = &mut state.selected_facility {
                *selected = selected.converted_to(unit);
            }
        });
    }

    pub fn set_selected_facility(&self, facility: Option<Facility>) {
        self.commit("set_selected_facility", |_, state| {
            state.selected_facility = facility;
        });
    }

    pub fn set_notifications_enabled(&self, enabled: bool) {
        self.commit("set_notifications_enabled", |_, state| {
            state.notifications_enabled = enabled;
        });
    }

    pub fn set_appearance(&self, appearance: Appearance) {
        self.commit("set_appearance", |_, state| {
            state.appearance = appearance;
        });
    }

    /// Re-lock every achievement.
    pub fn reset_achievements(&self) {
        self.commit("reset_achievements", |_, state| {
            state.achievements = rules::reset();
        });
    }

    pub fn set_error(&self, error: Option<String>) {
        self.commit("set_error", |_, state| {
            state.error = error;
        });
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.commit("set_loading", |_, state| {
            state.is_loading = is_loading;
        });
    }

    /// Report that no device position could be obtained. Facilities keep
    /// their last known values.
    pub fn report_location_unavailable(&self, reason: &str) {
        tracing::warn!(reason, "location unavailable");
        self.commit("report_location_unavailable", |_, state| {
            state.error = Some(format!("Location unavailable: {reason}"));
            state.is_loading = false;
        });
    }
}

/// Merge a lookup result into `state`.
///
/// Saved facilities get distances from `origin` and are added when the
/// lookup did not return them. Candidates already known by id keep their
/// visit history.
fn apply_refresh(
    state: &mut AppState,
    origin: Coordinate,
    result: Result<Vec<Facility>, LocatorError>,
) {
    let candidates = match result {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "facility refresh failed");
            state.error = Some(format!("Failed to fetch facilities: {e}"));
            return;
        }
    };

    let unit = state.unit_system;
    let saved: Vec<Facility> = state
        .saved_facilities
        .iter()
        .map(|f| f.with_distance(Some(distance_between(origin, f.coordinate(), unit))))
        .collect();

    let mut combined: Vec<Facility> = Vec::with_capacity(candidates.len() + saved.len());
    for candidate in candidates {
        if combined.iter().any(|f| f.id() == candidate.id()) {
            continue;
        }
        let known = saved
            .iter()
            .chain(state.facilities.iter())
            .find(|f| f.id() == candidate.id());
        let candidate = match known {
            Some(previous) => candidate.with_visits_from(previous),
            None => candidate,
        };
        combined.push(candidate.converted_to(unit));
    }
    for facility in &saved {
        if !combined.iter().any(|f| f.id() == facility.id()) {
            combined.push(facility.clone());
        }
    }
    sort_by_distance(&mut combined);

    tracing::debug!(
        origin = %origin,
        count = combined.len(),
        saved = saved.len(),
        "facilities refreshed"
    );

    state.facilities = combined;
    state.saved_facilities = saved;
    state.error = None;
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
