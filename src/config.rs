use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::utils;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HORIZON_WEEKS: u32 = 12;
const DEFAULT_USER_AGENT: &str = "DanceScrape/0.1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub request_timeout_secs: u64,
    /// How many weeks ahead recurring schedules are generated.
    pub horizon_weeks: u32,
    pub max_parallel_fetches: Option<usize>,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            horizon_weeks: DEFAULT_HORIZON_WEEKS,
            max_parallel_fetches: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AppConfig {
    /// Config file from the data directory, then environment overrides.
    pub fn load() -> Self {
        Self::load_from(&utils::config_path(), |key| std::env::var(key).ok())
    }

    /// A file that cannot be read or parsed is ignored, not fatal.
    fn load_from<F>(path: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = read_config(path).unwrap_or_else(|err| {
            warn!("ignoring config file {:?}: {err}", path);
            AppConfig::default()
        });
        config.with_env(lookup)
    }

    fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secs) = lookup("DANCE_SCRAPE_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.request_timeout_secs = secs;
        }
        if let Some(weeks) = lookup("DANCE_SCRAPE_HORIZON_WEEKS").and_then(|s| s.parse().ok()) {
            self.horizon_weeks = weeks;
        }
        if let Some(max) = lookup("DANCE_SCRAPE_MAX_FETCHES").and_then(|s| s.parse().ok()) {
            self.max_parallel_fetches = Some(max);
        }
        if let Some(agent) = lookup("DANCE_SCRAPE_USER_AGENT") {
            self.user_agent = agent;
        }
        self
    }
}

fn read_config(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&contents).map_err(|err| err.to_string())
}
