use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use loonow_core::{AchievementId, Coordinate, UnitSystem};
use loonow_locator::{DirectorySource, SyntheticSource};
use loonow_store::{
    decode, encode, FacilityStore, JsonFileRepository, MemoryRepository, StoreSettings, VisitEvent,
};

fn directory_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/facilities.yaml")
}

fn midtown() -> Coordinate {
    Coordinate::new(40.7540, -73.9840).unwrap()
}

fn open_store(repository: Arc<dyn loonow_store::StateRepository>) -> FacilityStore {
    let source = Arc::new(DirectorySource::open(&directory_path()).unwrap());
    FacilityStore::open(source, repository, StoreSettings::default()).unwrap()
}

fn unlocked(store: &FacilityStore, id: AchievementId) -> bool {
    store
        .snapshot()
        .achievements
        .iter()
        .any(|a| a.id == id && a.unlocked)
}

fn temp_state_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("loonow-visits-{}", uuid::Uuid::new_v4()))
        .join("state.json")
}

#[test]
fn nearest_directory_facility_comes_first() {
    let store = open_store(Arc::new(MemoryRepository::new()));
    store.set_current_location(midtown());

    let state = store.snapshot();
    assert_eq!(state.facilities.len(), 6);
    assert_eq!(state.facilities[0].id(), "bryant-park");
    assert!(state
        .facilities
        .windows(2)
        .all(|w| w[0].distance().unwrap().value <= w[1].distance().unwrap().value));
}

#[test]
fn visiting_a_high_rated_facility_unlocks_first_plush_and_golden_throne() {
    let store = open_store(Arc::new(MemoryRepository::new()));
    store.set_current_location(midtown());

    store.visit_facility("bryant-park");

    assert!(unlocked(&store, AchievementId::FirstPlush));
    assert!(unlocked(&store, AchievementId::GoldenThrone));
    assert!(!unlocked(&store, AchievementId::SpeedyPeeper));
    assert!(!unlocked(&store, AchievementId::Marathon));
}

#[test]
fn low_rated_facility_does_not_unlock_golden_throne() {
    let store = open_store(Arc::new(MemoryRepository::new()));
    store.set_current_location(midtown());
    store.visit_facility("penn-station");
    assert!(!unlocked(&store, AchievementId::GoldenThrone));
}

#[test]
fn marathon_counts_distinct_facilities_in_the_trailing_week() {
    let store = open_store(Arc::new(MemoryRepository::new()));
    store.set_current_location(midtown());
    let start = Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap();

    for day in 0..3 {
        store.record_visit(&VisitEvent::new("union-square"), start + TimeDelta::days(day));
    }
    let marathon = |store: &FacilityStore| {
        store
            .snapshot()
            .achievements
            .iter()
            .find(|a| a.id == AchievementId::Marathon)
            .cloned()
            .unwrap()
    };
    assert_eq!(marathon(&store).progress, Some(1));

    store.record_visit(&VisitEvent::new("nypl-main"), start + TimeDelta::days(3));
    store.record_visit(&VisitEvent::new("battery-park"), start + TimeDelta::days(4));
    let done = marathon(&store);
    assert_eq!(done.progress, Some(3));
    assert!(done.unlocked);

    // Outside the window the count would drop; progress must not.
    store.record_visit(&VisitEvent::new("penn-station"), start + TimeDelta::days(30));
    let later = marathon(&store);
    assert_eq!(later.progress, Some(3));
    assert!(later.unlocked);
}

#[test]
fn state_survives_a_restart() {
    let path = temp_state_path();
    {
        let store = open_store(Arc::new(JsonFileRepository::new(&path)));
        store.set_current_location(midtown());
        let bryant = store.snapshot().facility("bryant-park").unwrap().clone();
        store.save_facility(&bryant);
        store.visit_facility("bryant-park");
        store.set_unit_system(UnitSystem::Kilometers);
    }

    let store = open_store(Arc::new(JsonFileRepository::new(&path)));
    let restored = store.snapshot();
    assert!(restored.facilities.is_empty());
    assert!(restored.current_location.is_none());
    assert_eq!(restored.unit_system, UnitSystem::Kilometers);
    assert_eq!(restored.saved_facilities.len(), 1);
    assert_eq!(restored.saved_facilities[0].visit_count(), Some(1));
    assert!(unlocked(&store, AchievementId::GoldenThrone));

    store.set_current_location(midtown());
    let refreshed = store.snapshot();
    let bryant = refreshed.facility("bryant-park").unwrap();
    assert_eq!(bryant.visit_count(), Some(1));
    assert_eq!(bryant.distance().unwrap().unit, UnitSystem::Kilometers);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(encode(&decode(&bytes).unwrap()).unwrap(), bytes);

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn observers_see_every_committed_change_once() {
    let store = open_store(Arc::new(MemoryRepository::new()));
    let mut rx = store.subscribe();

    store.set_current_location(midtown());
    store.visit_facility("grand-central-lower");
    store.visit_facility("no-such-facility");
    store.set_unit_system(UnitSystem::Miles);

    let mut seen = Vec::new();
    while let Ok(state) = rx.try_recv() {
        seen.push(state);
    }
    assert_eq!(seen.len(), 2);
    let visited = seen[1].facility("grand-central-lower").unwrap();
    assert_eq!(visited.visit_count(), Some(1));
    assert!(seen[1]
        .achievements
        .iter()
        .any(|a| a.id == AchievementId::FirstPlush && a.unlocked));
}

#[test]
fn synthesized_ids_stay_valid_across_runs_at_the_same_location() {
    let repository = Arc::new(MemoryRepository::new());
    let origin = Coordinate::new(40.0, -74.0).unwrap();
    let run = || {
        let store = FacilityStore::open(
            Arc::new(SyntheticSource::anchored(0)),
            repository.clone(),
            StoreSettings::default(),
        )
        .unwrap();
        store.set_current_location(origin);
        store
    };

    let listed = run().snapshot().facilities[0].clone();

    let second = run();
    let found = second.snapshot().facility(listed.id()).cloned().unwrap();
    second.save_facility(&found);
    drop(second);

    let third = run();
    third.visit_facility(listed.id());
    let state = third.snapshot();
    assert_eq!(state.facility(listed.id()).unwrap().visit_count(), Some(1));
    assert!(state.is_saved(listed.id()));
    assert_eq!(state.saved_facilities[0].visit_count(), Some(1));
    assert!(unlocked(&third, AchievementId::FirstPlush));
}
