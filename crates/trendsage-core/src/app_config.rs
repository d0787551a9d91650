use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    /// Postgres connection string. When absent, insights go to JSON files in `output_dir`.
    pub database_url: Option<String>,
    pub log_level: String,
    pub competitors_path: PathBuf,
    pub output_dir: PathBuf,
    pub user_agent: String,
    pub twitter_bearer_token: Option<String>,
    pub news_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_timeout_secs: u64,
    pub source_timeout_secs: u64,
    pub inter_competitor_delay_ms: u64,
    pub max_attempts: u32,
    pub backoff_step_secs: u64,
    pub run_timeout_secs: u64,
    pub schedule_cron: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    #[must_use]
    pub fn openai_timeout(&self) -> Duration {
        Duration::from_secs(self.openai_timeout_secs)
    }

    #[must_use]
    pub fn inter_competitor_delay(&self) -> Duration {
        Duration::from_millis(self.inter_competitor_delay_ms)
    }

    #[must_use]
    pub fn backoff_step(&self) -> Duration {
        Duration::from_secs(self.backoff_step_secs)
    }

    #[must_use]
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("log_level", &self.log_level)
            .field("competitors_path", &self.competitors_path)
            .field("output_dir", &self.output_dir)
            .field("user_agent", &self.user_agent)
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "news_api_key",
                &self.news_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_timeout_secs", &self.openai_timeout_secs)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("inter_competitor_delay_ms", &self.inter_competitor_delay_ms)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_step_secs", &self.backoff_step_secs)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field("schedule_cron", &self.schedule_cron)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
