//! Shared domain types and configuration for TrendSage.

pub mod app_config;
pub mod competitors;
pub mod config;
pub mod insight;
pub mod observation;

use thiserror::Error;

pub use app_config::AppConfig;
pub use competitors::{
    default_roster, load_competitors, load_roster, validate_competitors, Competitor, CompetitorsFile,
};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use insight::{CompetitorInsight, InsightProvenance, InsightRecord, Trend};
pub use observation::{Observation, ObservationSet, SourceKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read competitors file {path}: {source}")]
    CompetitorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse competitors file: {0}")]
    CompetitorsFileParse(#[from] serde_yaml::Error),

    #[error("competitor config validation failed: {0}")]
    Validation(String),
}
