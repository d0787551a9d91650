use crate::app_config::AppConfig;
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
/// Every integration credential is optional: a missing or blank credential
/// disables that integration rather than failing startup.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
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

    let database_url = optional("DATABASE_URL");
    let log_level = or_default("TRENDSAGE_LOG_LEVEL", "info");
    let competitors_path = PathBuf::from(or_default(
        "TRENDSAGE_COMPETITORS_PATH",
        "./config/competitors.yaml",
    ));
    let output_dir = PathBuf::from(or_default("TRENDSAGE_OUTPUT_DIR", "./output"));
    let user_agent = or_default("TRENDSAGE_USER_AGENT", "trendsage/0.1 (market-insights)");

    let twitter_bearer_token = optional("TWITTER_BEARER_TOKEN");
    let news_api_key = optional("NEWS_API_KEY").or_else(|| optional("GOOGLE_NEWS_API_KEY"));
    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_model = or_default("OPENAI_MODEL", "gpt-3.5-turbo");
    let openai_base_url = or_default("OPENAI_BASE_URL", "https://api.openai.com/v1");
    let openai_timeout_secs = parse_u64("OPENAI_TIMEOUT_SECS", "30")?;

    let source_timeout_secs = parse_u64("TRENDSAGE_SOURCE_TIMEOUT_SECS", "10")?;
    let inter_competitor_delay_ms = parse_u64("TRENDSAGE_INTER_COMPETITOR_DELAY_MS", "2000")?;
    let max_attempts = parse_u32("TRENDSAGE_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRENDSAGE_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let backoff_step_secs = parse_u64("TRENDSAGE_BACKOFF_STEP_SECS", "5")?;
    let run_timeout_secs = parse_u64("TRENDSAGE_RUN_TIMEOUT_SECS", "600")?;
    let schedule_cron = or_default("TRENDSAGE_SCHEDULE_CRON", "0 0 9 * * *");

    let db_max_connections = parse_u32("TRENDSAGE_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("TRENDSAGE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("TRENDSAGE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        log_level,
        competitors_path,
        output_dir,
        user_agent,
        twitter_bearer_token,
        news_api_key,
        openai_api_key,
        openai_model,
        openai_base_url,
        openai_timeout_secs,
        source_timeout_secs,
        inter_competitor_delay_ms,
        max_attempts,
        backoff_step_secs,
        run_timeout_secs,
        schedule_cron,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
