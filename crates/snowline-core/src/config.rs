use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable carries an unparseable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a variable carries an unparseable value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let servers_path = PathBuf::from(or_default("SNOWLINE_SERVERS_PATH", "./config/servers.yaml"));
    let cache_dir = PathBuf::from(or_default("SNOWLINE_CACHE_DIR", "./cache"));
    let log_level = or_default("SNOWLINE_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("SNOWLINE_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("SNOWLINE_USER_AGENT", "snowline/0.1 (snow-report-survey)");
    let max_retries = parse_u32("SNOWLINE_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("SNOWLINE_RETRY_BACKOFF_BASE_MS", "1000")?;
    let max_concurrent_reports = parse_usize("SNOWLINE_MAX_CONCURRENT_REPORTS", "1")?;

    Ok(AppConfig {
        servers_path,
        cache_dir,
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        max_concurrent_reports,
    })
}
