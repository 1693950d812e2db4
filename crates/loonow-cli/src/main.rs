mod report;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use loonow_core::{AppConfig, Appearance, Coordinate, UnitSystem};
use loonow_locator::{DirectorySource, FacilitySource, SyntheticSource};
use loonow_store::{rules, FacilityStore, JsonFileRepository, StoreSettings};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "loonow")]
#[command(about = "Find nearby restrooms, keep favorites, and track visits")]
struct Cli {
    /// Current latitude; the configured fallback is used when omitted
    #[arg(long, global = true, allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Current longitude; the configured fallback is used when omitted
    #[arg(long, global = true, allow_negative_numbers = true)]
    lon: Option<f64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List facilities near the current location
    Nearby,
    /// Save a facility from the nearby list
    Save { id: String },
    /// Remove a saved facility
    Unsave { id: String },
    /// List saved facilities
    Saved,
    /// Remove every saved facility
    ClearSaved,
    /// Record a visit to a nearby facility
    Visit {
        id: String,
        /// Seconds it took to get there
        #[arg(long)]
        elapsed_secs: Option<u64>,
    },
    /// Show achievement progress
    Achievements,
    /// Lock every achievement again
    ResetAchievements,
    /// Switch between miles and kilometers
    Units { unit: UnitSystem },
    /// Turn notifications on or off
    Notifications {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Set the color scheme (system, light, dark)
    Appearance { appearance: Appearance },
    /// Show current preferences
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = loonow_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let store = open_store(&config)?;
    let command = cli.command.unwrap_or(Commands::Nearby);

    match command {
        Commands::Nearby => {
            let origin = resolve_origin(&store, &config, cli.lat, cli.lon)?;
            refresh(&store, origin).await;
            report::print_facilities(&store.snapshot().facilities);
        }
        Commands::Save { id } => {
            let origin = resolve_origin(&store, &config, cli.lat, cli.lon)?;
            refresh(&store, origin).await;
            let snapshot = store.snapshot();
            let facility = snapshot
                .facility(&id)
                .with_context(|| format!("no nearby facility with id {id}"))?;
            store.save_facility(facility);
            println!("saved {}", facility.name());
        }
        Commands::Unsave { id } => {
            store.remove_saved_facility(&id);
            println!("removed {id}");
        }
        Commands::Saved => report::print_facilities(&store.snapshot().saved_facilities),
        Commands::ClearSaved => {
            store.clear_saved_facilities();
            println!("cleared saved facilities");
        }
        Commands::Visit { id, elapsed_secs } => {
            let origin = resolve_origin(&store, &config, cli.lat, cli.lon)?;
            refresh(&store, origin).await;
            run_visit(&store, &id, elapsed_secs.map(Duration::from_secs))?;
        }
        Commands::Achievements => report::print_achievements(&store.snapshot()),
        Commands::ResetAchievements => {
            store.reset_achievements();
            println!("achievements reset");
        }
        Commands::Units { unit } => {
            store.set_unit_system(unit);
            println!("units: {unit}");
        }
        Commands::Notifications { enabled } => {
            store.set_notifications_enabled(enabled);
            println!("notifications: {}", if enabled { "on" } else { "off" });
        }
        Commands::Appearance { appearance } => {
            store.set_appearance(appearance);
            println!("appearance: {appearance}");
        }
        Commands::Settings => report::print_settings(&store.snapshot()),
    }

    Ok(())
}

fn open_store(config: &AppConfig) -> anyhow::Result<FacilityStore> {
    let source = build_source(config)?;
    tracing::debug!(
        source = source.name(),
        state_path = %config.state_path.display(),
        "opening store"
    );
    let repository = Arc::new(JsonFileRepository::new(&config.state_path));
    let store = FacilityStore::open(source, repository, StoreSettings::from_app_config(config))
        .with_context(|| format!("failed to read {}", config.state_path.display()))?;
    Ok(store)
}

/// Synthesis is anchored to the origin so ids printed by `nearby` can be
/// passed to `save` or `visit` in a later run.
fn build_source(config: &AppConfig) -> anyhow::Result<Arc<dyn FacilitySource>> {
    let source: Arc<dyn FacilitySource> = match &config.directory_path {
        Some(path) => Arc::new(DirectorySource::open(path)?),
        None => Arc::new(SyntheticSource::anchored(
            config.synthesis_seed.unwrap_or_default(),
        )),
    };
    Ok(source)
}

/// Both flags, or neither and fall back to the configured location.
fn resolve_origin(
    store: &FacilityStore,
    config: &AppConfig,
    lat: Option<f64>,
    lon: Option<f64>,
) -> anyhow::Result<Coordinate> {
    match (lat, lon) {
        (Some(latitude), Some(longitude)) => {
            let origin = Coordinate::new(latitude, longitude)?;
            origin.validate_range()?;
            Ok(origin)
        }
        (None, None) => {
            store.report_location_unavailable("no --lat/--lon given");
            tracing::warn!(fallback = %config.fallback_location, "using fallback location");
            Ok(config.fallback_location)
        }
        _ => anyhow::bail!("--lat and --lon must be given together"),
    }
}

async fn refresh(store: &FacilityStore, origin: Coordinate) {
    if !store.refresh_facilities_async(origin).await {
        tracing::debug!(origin = %origin, "refresh superseded");
    }
    if let Some(error) = &store.snapshot().error {
        eprintln!("warning: {error}");
    }
}

fn run_visit(store: &FacilityStore, id: &str, elapsed: Option<Duration>) -> anyhow::Result<()> {
    let before = store.snapshot();
    if before.facility(id).is_none() {
        anyhow::bail!("no nearby facility with id {id}");
    }
    match elapsed {
        Some(elapsed) => store.visit_facility_timed(id, elapsed),
        None => store.visit_facility(id),
    }

    let after = store.snapshot();
    let count = after
        .facility(id)
        .and_then(loonow_core::Facility::visit_count)
        .unwrap_or(0);
    println!("visit recorded ({count} total)");
    for unlocked in rules::newly_unlocked(&before.achievements, &after.achievements) {
        if let Some(achievement) = after.achievements.iter().find(|a| a.id == unlocked) {
            println!("unlocked: {} - {}", achievement.title, achievement.description);
        }
    }
    Ok(())
}
