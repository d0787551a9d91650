use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A tracked competitor.
///
/// Each source picks the identifier it needs: the social source searches by
/// `handle`, the quote source by `symbol`, and the news source by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub handle: String,
    pub symbol: String,
    #[serde(default)]
    pub website: Option<String>,
}

impl Competitor {
    #[must_use]
    pub fn new(name: &str, handle: &str, symbol: &str, website: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            handle: handle.to_string(),
            symbol: symbol.to_string(),
            website: website.map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompetitorsFile {
    pub competitors: Vec<Competitor>,
}

/// The roster used when no competitors file is present.
#[must_use]
pub fn default_roster() -> Vec<Competitor> {
    vec![
        Competitor::new("Apple", "apple", "AAPL", Some("https://apple.com")),
        Competitor::new("Google", "google", "GOOGL", Some("https://google.com")),
        Competitor::new(
            "Microsoft",
            "microsoft",
            "MSFT",
            Some("https://microsoft.com"),
        ),
    ]
}

/// Load and validate the competitor roster from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_competitors(path: &Path) -> Result<Vec<Competitor>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CompetitorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_competitors(&content)
}

/// Load the roster from `path`, or return [`default_roster`] when the file does not exist.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or validated.
pub fn load_roster(path: &Path) -> Result<Vec<Competitor>, ConfigError> {
    match load_competitors(path) {
        Err(ConfigError::CompetitorsFileIo { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            Ok(default_roster())
        }
        other => other,
    }
}

fn parse_competitors(content: &str) -> Result<Vec<Competitor>, ConfigError> {
    let file: CompetitorsFile = serde_yaml::from_str(content)?;
    validate_competitors(&file.competitors)?;
    Ok(file.competitors)
}

/// Validate a roster: non-empty, required fields present, unique names and handles.
///
/// # Errors
///
/// Returns `ConfigError::Validation` describing the first problem found.
pub fn validate_competitors(competitors: &[Competitor]) -> Result<(), ConfigError> {
    if competitors.is_empty() {
        return Err(ConfigError::Validation(
            "competitor roster must not be empty".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    let mut seen_handles = HashSet::new();

    for competitor in competitors {
        if competitor.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "competitor name must be non-empty".to_string(),
            ));
        }
        if competitor.handle.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "competitor '{}' has an empty handle",
                competitor.name
            )));
        }
        if competitor.symbol.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "competitor '{}' has an empty symbol",
                competitor.name
            )));
        }

        if !seen_names.insert(competitor.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate competitor name: '{}'",
                competitor.name
            )));
        }
        if !seen_handles.insert(competitor.handle.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate competitor handle: '{}' (from competitor '{}')",
                competitor.handle, competitor.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "competitors_test.rs"]
mod tests;
