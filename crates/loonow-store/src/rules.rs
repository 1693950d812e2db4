//! Achievement rules evaluated after every visit.
//!
//! Each rule computes a candidate progress value from the visit and the
//! facility list, then [`Achievement::advanced_to`] applies it. Progress only
//! ever rises and an unlocked achievement stays unlocked; only [`reset`]
//! returns the table to its seed state.
//!
//! | Achievement    | Candidate progress                                          |
//! |----------------|-------------------------------------------------------------|
//! | First Plush    | 1 on any visit                                              |
//! | Speedy Peeper  | 1 when the visit reports a travel time under 3 minutes      |
//! | Marathon       | facilities whose last visit is within the trailing 7 days   |
//! | Halfway There  | facilities visited at least once                            |
//! | Golden Throne  | 1 when the visited facility is rated 4.5 or higher          |

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use loonow_core::{seed_achievements, Achievement, AchievementId, Facility};

pub const MARATHON_WINDOW_DAYS: i64 = 7;
pub const SPEEDY_PEEPER_LIMIT: Duration = Duration::from_secs(3 * 60);
pub const GOLDEN_THRONE_MIN_RATING: f64 = 4.5;

/// A single visit to a facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitEvent {
    pub facility_id: String,
    /// Travel time from starting navigation to arrival, when the caller
    /// timed it. Speedy Peeper only considers timed visits.
    pub elapsed: Option<Duration>,
}

impl VisitEvent {
    #[must_use]
    pub fn new(facility_id: impl Into<String>) -> Self {
        Self {
            facility_id: facility_id.into(),
            elapsed: None,
        }
    }

    #[must_use]
    pub fn timed(facility_id: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            facility_id: facility_id.into(),
            elapsed: Some(elapsed),
        }
    }
}

/// Evaluate every rule against `facilities`, which must already include the
/// visit being reported.
///
/// Returns a new table; the input is never modified. If the visited facility
/// is not in `facilities` the table comes back unchanged.
#[must_use]
pub fn evaluate(
    achievements: &[Achievement],
    facilities: &[Facility],
    event: &VisitEvent,
    now: DateTime<Utc>,
) -> Vec<Achievement> {
    let Some(visited) = facilities.iter().find(|f| f.id() == event.facility_id) else {
        return achievements.to_vec();
    };

    achievements
        .iter()
        .map(|achievement| match achievement.id {
            AchievementId::FirstPlush => achievement.advanced_to(1),
            AchievementId::SpeedyPeeper => {
                if event.elapsed.is_some_and(|e| e < SPEEDY_PEEPER_LIMIT) {
                    achievement.advanced_to(1)
                } else {
                    achievement.clone()
                }
            }
            AchievementId::Marathon => achievement.advanced_to(recent_visit_count(facilities, now)),
            AchievementId::HalfwayThere => {
                achievement.advanced_to(saturating_u32(
                    facilities.iter().filter(|f| f.has_been_visited()).count(),
                ))
            }
            AchievementId::GoldenThrone => {
                let golden = visited.has_been_visited()
                    && visited
                        .rating()
                        .is_some_and(|rating| rating >= GOLDEN_THRONE_MIN_RATING);
                if golden {
                    achievement.advanced_to(1)
                } else {
                    achievement.clone()
                }
            }
        })
        .collect()
}

/// Distinct facilities last visited within the trailing window ending at `now`.
fn recent_visit_count(facilities: &[Facility], now: DateTime<Utc>) -> u32 {
    let cutoff = now - TimeDelta::days(MARATHON_WINDOW_DAYS);
    saturating_u32(
        facilities
            .iter()
            .filter(|f| f.last_visited().is_some_and(|at| at >= cutoff))
            .count(),
    )
}

fn saturating_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Ids that are unlocked in `after` but were locked in `before`.
#[must_use]
pub fn newly_unlocked(before: &[Achievement], after: &[Achievement]) -> Vec<AchievementId> {
    after
        .iter()
        .filter(|a| a.unlocked)
        .filter(|a| !before.iter().any(|b| b.id == a.id && b.unlocked))
        .map(|a| a.id)
        .collect()
}

/// The seed table, fully re-locked.
#[must_use]
pub fn reset() -> Vec<Achievement> {
    seed_achievements()
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod tests;
