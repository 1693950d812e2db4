use crate::app_config::{AppConfig, Environment, MAX_SEARCH_COUNT};
use crate::location::Coordinate;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn invalid(var: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.into(),
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; the lookup is injected so tests can drive it
/// from a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number"))
        }
    };

    let env = parse_environment(&or_default("LOONOW_ENV", "development"))?;
    let log_level = or_default("LOONOW_LOG_LEVEL", "info");
    let state_path = PathBuf::from(or_default("LOONOW_STATE_PATH", "./data/loonow-state.json"));
    let directory_path = lookup("LOONOW_DIRECTORY_PATH")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from);

    let search_count = parse_usize("LOONOW_SEARCH_COUNT", "15")?;
    if search_count == 0 {
        return Err(invalid("LOONOW_SEARCH_COUNT", "must be at least 1"));
    }
    if search_count > MAX_SEARCH_COUNT {
        return Err(invalid(
            "LOONOW_SEARCH_COUNT",
            format!("must be at most {MAX_SEARCH_COUNT}"),
        ));
    }

    let search_radius = parse_f64("LOONOW_SEARCH_RADIUS", "10")?;
    if search_radius <= 0.0 {
        return Err(invalid("LOONOW_SEARCH_RADIUS", "must be greater than zero"));
    }

    let fallback_latitude = parse_f64("LOONOW_FALLBACK_LATITUDE", "40.7128")?;
    let fallback_longitude = parse_f64("LOONOW_FALLBACK_LONGITUDE", "-74.0060")?;
    let fallback_location = Coordinate {
        latitude: fallback_latitude,
        longitude: fallback_longitude,
    };
    fallback_location
        .validate_range()
        .map_err(|e| invalid("LOONOW_FALLBACK_LATITUDE", e.to_string()))?;

    let event_capacity = parse_usize("LOONOW_EVENT_CAPACITY", "64")?;
    if event_capacity == 0 {
        return Err(invalid("LOONOW_EVENT_CAPACITY", "must be at least 1"));
    }

    let synthesis_seed = match lookup("LOONOW_SYNTHESIS_SEED") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| invalid("LOONOW_SYNTHESIS_SEED", e.to_string()))?,
        ),
        Err(_) => None,
    };

    Ok(AppConfig {
        env,
        log_level,
        state_path,
        directory_path,
        search_count,
        search_radius,
        fallback_location,
        event_capacity,
        synthesis_seed,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(invalid(
            "LOONOW_ENV",
            format!("unknown environment '{other}'; expected development, test, or production"),
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
