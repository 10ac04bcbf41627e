use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// local-development configuration.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("DATADEBAT_ENV", "development"))?;
    let log_level = or_default("DATADEBAT_LOG_LEVEL", "info");

    let es_url = or_default("DATADEBAT_ES_URL", "http://localhost:9200");
    if !es_url.starts_with("http://") && !es_url.starts_with("https://") {
        return Err(invalid(
            "DATADEBAT_ES_URL",
            format!("expected an http(s) URL, got '{es_url}'"),
        ));
    }
    let es_index = or_default("DATADEBAT_ES_INDEX", "debats_assemblee_nationale");

    let raw_dir = PathBuf::from(or_default("DATADEBAT_RAW_DIR", "./data/raw"));
    let transformed_dir = PathBuf::from(or_default(
        "DATADEBAT_TRANSFORMED_DIR",
        "./data/transformed",
    ));
    let report_path = PathBuf::from(or_default(
        "DATADEBAT_REPORT_PATH",
        "batch_load_report.json",
    ));

    let max_workers = parse_positive("DATADEBAT_MAX_WORKERS", "3")?;
    let batch_size = parse_positive("DATADEBAT_BATCH_SIZE", "500")?;
    let request_timeout_secs = parse_u64("DATADEBAT_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("DATADEBAT_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("DATADEBAT_RETRY_BACKOFF_BASE_MS", "1000")?;
    let user_agent = or_default("DATADEBAT_USER_AGENT", "datadebat/0.1 (debate-archive-etl)");

    let download_base_url = or_default(
        "DATADEBAT_DOWNLOAD_BASE_URL",
        "https://echanges.dila.gouv.fr/OPENDATA/Debats/AN",
    );
    let download_workers = parse_positive("DATADEBAT_DOWNLOAD_WORKERS", "5")?;

    Ok(AppConfig {
        env,
        log_level,
        es_url,
        es_index,
        raw_dir,
        transformed_dir,
        report_path,
        max_workers,
        batch_size,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        user_agent,
        download_base_url,
        download_workers,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DATADEBAT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
