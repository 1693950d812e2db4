use chrono::TimeZone;

use super::*;

fn coordinate() -> Coordinate {
    Coordinate::new(40.0, -74.0).unwrap()
}

fn facility(id: &str, distance: Option<f64>) -> Facility {
    Facility::new(
        id,
        "Library Toilet",
        "12 Main St",
        coordinate(),
        FacilityAttributes {
            rating: Some(4.2),
            is_free: true,
            is_accessible: true,
            has_changing_table: false,
        },
    )
    .unwrap()
    .with_distance(distance.map(|d| Distance::new(d, UnitSystem::Miles)))
}

#[test]
fn new_rejects_empty_id() {
    let err = Facility::new("  ", "x", "y", coordinate(), FacilityAttributes::default())
        .unwrap_err();
    assert_eq!(err, CoreError::EmptyId);
}

#[test]
fn new_rejects_non_finite_coordinate() {
    let bad = Coordinate {
        latitude: f64::NAN,
        longitude: 0.0,
    };
    let err = Facility::new("a", "x", "y", bad, FacilityAttributes::default()).unwrap_err();
    assert!(matches!(err, CoreError::NonFiniteCoordinate { .. }));
}

#[test]
fn new_rejects_rating_outside_bounds() {
    let attributes = FacilityAttributes {
        rating: Some(5.5),
        ..FacilityAttributes::default()
    };
    let err = Facility::new("a", "x", "y", coordinate(), attributes).unwrap_err();
    assert_eq!(err, CoreError::RatingOutOfRange(5.5));
}

#[test]
fn new_facility_has_no_visit_history() {
    let f = facility("a", None);
    assert!(f.visit_count().is_none());
    assert!(f.last_visited().is_none());
    assert!(!f.has_been_visited());
}

#[test]
fn visited_at_increments_count_and_stamps_time() {
    let first = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap();

    let once = facility("a", Some(1.0)).visited_at(first);
    let twice = once.visited_at(second);

    assert_eq!(once.visit_count(), Some(1));
    assert_eq!(twice.visit_count(), Some(2));
    assert_eq!(twice.last_visited(), Some(second));
    assert_eq!(twice.coordinate(), once.coordinate());
}

#[test]
fn with_visits_from_only_copies_matching_id() {
    let at = Utc.with_ymd_and_hms(2026, 4, 1, 7, 0, 0).unwrap();
    let visited = facility("a", Some(1.0)).visited_at(at);
    let fresh = facility("a", Some(2.0));
    let other = facility("b", Some(2.0));

    let carried = fresh.with_visits_from(&visited);
    assert_eq!(carried.visit_count(), Some(1));
    assert_eq!(carried.last_visited(), Some(at));
    assert_eq!(carried.distance(), fresh.distance());

    assert!(other.with_visits_from(&visited).visit_count().is_none());
}

#[test]
fn converted_to_leaves_missing_distance_alone() {
    let f = facility("a", None).converted_to(UnitSystem::Kilometers);
    assert!(f.distance().is_none());
}

#[test]
fn sort_by_distance_places_undefined_last() {
    let mut list = vec![
        facility("none", None),
        facility("far", Some(3.2)),
        facility("near", Some(0.4)),
    ];
    sort_by_distance(&mut list);
    let ids: Vec<&str> = list.iter().map(Facility::id).collect();
    assert_eq!(ids, ["near", "far", "none"]);
}

#[test]
fn display_address_appends_distance() {
    assert_eq!(
        facility("a", Some(0.4)).display_address(),
        "12 Main St, 0.40 mi away"
    );
    assert_eq!(facility("a", None).display_address(), "12 Main St");
}

#[test]
fn json_uses_camel_case_and_omits_absent_fields() {
    let json = serde_json::to_string(&facility("a", None)).unwrap();
    assert!(json.contains("\"isFree\":true"));
    assert!(json.contains("\"hasChangingTable\":false"));
    assert!(!json.contains("distance"));
    assert!(!json.contains("visitCount"));
}

#[test]
fn deserialization_validates_like_new() {
    let json = r#"{"id":"","name":"x","address":"y","latitude":1.0,"longitude":2.0,
        "isFree":true,"isAccessible":false,"hasChangingTable":false}"#;
    assert!(serde_json::from_str::<Facility>(json).is_err());
}

#[test]
fn serialization_round_trip_is_byte_stable() {
    let visited = facility("a", Some(1.25))
        .visited_at(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap());
    let encoded = serde_json::to_string(&visited).unwrap();
    let decoded: Facility = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, visited);
    assert_eq!(serde_json::to_string(&decoded).unwrap(), encoded);
}
