use serde::{Deserialize, Serialize};

/// The closed set of achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstPlush,
    SpeedyPeeper,
    Marathon,
    HalfwayThere,
    GoldenThrone,
}

impl AchievementId {
    /// Every id in seed order.
    pub const ALL: [AchievementId; 5] = [
        AchievementId::FirstPlush,
        AchievementId::SpeedyPeeper,
        AchievementId::Marathon,
        AchievementId::HalfwayThere,
        AchievementId::GoldenThrone,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AchievementId::FirstPlush => "first_plush",
            AchievementId::SpeedyPeeper => "speedy_peeper",
            AchievementId::Marathon => "marathon",
            AchievementId::HalfwayThere => "halfway_there",
            AchievementId::GoldenThrone => "golden_throne",
        }
    }
}

impl std::fmt::Display for AchievementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gamification badge and its unlock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
    /// Icon name resolved by the presentation layer.
    pub icon: String,
    pub unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<u32>,
}

impl Achievement {
    /// Copy whose progress is raised to `computed` if that is higher, unlocking
    /// once progress reaches the goal (a missing goal counts as 1).
    ///
    /// Never lowers progress and never re-locks.
    #[must_use]
    pub fn advanced_to(&self, computed: u32) -> Self {
        let progress = self.progress.unwrap_or(0).max(computed);
        let goal = self.goal.unwrap_or(1);
        Self {
            progress: Some(progress),
            unlocked: self.unlocked || progress >= goal,
            ..self.clone()
        }
    }

    /// Fraction of the goal reached, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn progress_ratio(&self) -> f64 {
        if self.unlocked {
            return 1.0;
        }
        let goal = self.goal.unwrap_or(1).max(1);
        (f64::from(self.progress.unwrap_or(0)) / f64::from(goal)).min(1.0)
    }
}

struct SeedEntry {
    id: AchievementId,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    goal: u32,
}

const SEED: [SeedEntry; 5] = [
    SeedEntry {
        id: AchievementId::FirstPlush,
        title: "First Plush",
        description: "Visit your first toilet",
        icon: "smile",
        goal: 1,
    },
    SeedEntry {
        id: AchievementId::SpeedyPeeper,
        title: "Speedy Peeper",
        description: "Get to the toilet in under 3 minutes",
        icon: "zap",
        goal: 1,
    },
    SeedEntry {
        id: AchievementId::Marathon,
        title: "Marathon",
        description: "Use 3 toilets in 7 days",
        icon: "flag",
        goal: 3,
    },
    SeedEntry {
        id: AchievementId::HalfwayThere,
        title: "Halfway There",
        description: "Find 50 toilets",
        icon: "lock",
        goal: 50,
    },
    SeedEntry {
        id: AchievementId::GoldenThrone,
        title: "Golden Throne",
        description: "Visit a 5-star rated toilet",
        icon: "crown",
        goal: 1,
    },
];

/// The seed definition table, all locked with zero progress.
#[must_use]
pub fn seed_achievements() -> Vec<Achievement> {
    SEED.iter()
        .map(|entry| Achievement {
            id: entry.id,
            title: entry.title.to_string(),
            description: entry.description.to_string(),
            icon: entry.icon.to_string(),
            unlocked: false,
            progress: Some(0),
            goal: Some(entry.goal),
        })
        .collect()
}

/// Align a persisted achievement list with the seed table.
///
/// Output has exactly one entry per seed id, in seed order. Unlock state and
/// progress come from the persisted entry when present; display metadata and
/// goal always come from the seed.
#[must_use]
pub fn reconcile_with_seed(persisted: &[Achievement]) -> Vec<Achievement> {
    seed_achievements()
        .into_iter()
        .map(|seed| match persisted.iter().find(|a| a.id == seed.id) {
            Some(stored) => Achievement {
                unlocked: stored.unlocked,
                progress: stored.progress.or(seed.progress),
                ..seed
            },
            None => seed,
        })
        .collect()
}
