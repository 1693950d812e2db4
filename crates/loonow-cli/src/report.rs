//! Plain-text rendering of store snapshots for the CLI.

use loonow_core::{Achievement, Facility};
use loonow_store::AppState;

const NAME_WIDTH: usize = 26;

pub(crate) fn print_facilities(facilities: &[Facility]) {
    if facilities.is_empty() {
        println!("no facilities found");
        return;
    }
    println!(
        "{:<38}{:<28}{:>10}  {:<7}FLAGS",
        "ID", "NAME", "DISTANCE", "RATING"
    );
    for facility in facilities {
        println!("{}", facility_row(facility));
    }
}

fn facility_row(facility: &Facility) -> String {
    let distance = facility
        .distance()
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    let rating = facility
        .rating()
        .map_or_else(|| "-".to_string(), |r| format!("{r:.1}"));
    format!(
        "{:<38}{:<28}{:>10}  {:<7}{}",
        facility.id(),
        truncate(facility.name(), NAME_WIDTH),
        distance,
        rating,
        flags(facility)
    )
}

fn flags(facility: &Facility) -> String {
    let mut flags = Vec::new();
    if facility.is_free() {
        flags.push("free");
    }
    if facility.is_accessible() {
        flags.push("accessible");
    }
    if facility.has_changing_table() {
        flags.push("changing-table");
    }
    if facility.has_been_visited() {
        flags.push("visited");
    }
    flags.join(",")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}

pub(crate) fn print_achievements(state: &AppState) {
    println!(
        "{}/{} achievements unlocked",
        state.unlocked_count(),
        state.achievements.len()
    );
    for achievement in &state.achievements {
        println!("{}", achievement_row(achievement));
    }
}

fn achievement_row(achievement: &Achievement) -> String {
    let mark = if achievement.unlocked { "x" } else { " " };
    let progress = match achievement.goal {
        Some(goal) => format!("{}/{goal}", achievement.progress.unwrap_or(0)),
        None => "-".to_string(),
    };
    format!(
        "[{mark}] {:<15}{:>7}  {}",
        achievement.title, progress, achievement.description
    )
}

pub(crate) fn print_settings(state: &AppState) {
    println!("units: {}", state.unit_system);
    println!(
        "notifications: {}",
        if state.notifications_enabled { "on" } else { "off" }
    );
    println!("appearance: {}", state.appearance);
    println!("saved facilities: {}", state.saved_facilities.len());
}
