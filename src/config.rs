//! Client configuration: API endpoint, session record location and optional
//! request timeout. Defaults are overridden by `TASKDESK_*` environment variables and
//! then by explicit CLI arguments. Configuration values are public; do not
//! store secrets here.

use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub state_file: PathBuf,
    /// Per-request timeout. `None` leaves it to the HTTP client.
    pub timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            state_file: default_state_file(),
            timeout: None,
        }
    }
}

impl AppConfig {
    /// Loads defaults and applies environment overrides.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        apply_overrides(&mut config, env_overrides());
        config
    }

    /// Applies explicit overrides on top of the loaded values.
    pub fn apply(&mut self, overrides: Overrides) {
        apply_overrides(self, overrides);
    }

    /// Cookie jar kept beside the session record, e.g. `session.cookies.json`.
    #[must_use]
    pub fn cookie_file(&self) -> PathBuf {
        self.state_file.with_extension("cookies.json")
    }
}

/// Optional values that replace the configured ones when present.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub api_base_url: Option<String>,
    pub state_file: Option<String>,
    pub timeout_seconds: Option<u64>,
}

fn apply_overrides(config: &mut AppConfig, overrides: Overrides) {
    if let Some(value) = overrides.api_base_url.as_deref().and_then(normalize_value) {
        config.api_base_url = value;
    }
    if let Some(value) = overrides.state_file.as_deref().and_then(normalize_value) {
        config.state_file = PathBuf::from(value);
    }
    if let Some(seconds) = overrides.timeout_seconds.filter(|s| *s > 0) {
        config.timeout = Some(Duration::from_secs(seconds));
    }
}

fn env_overrides() -> Overrides {
    Overrides {
        api_base_url: env::var("TASKDESK_API_BASE_URL").ok(),
        state_file: env::var("TASKDESK_STATE_FILE").ok(),
        timeout_seconds: env::var("TASKDESK_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.trim().parse().ok()),
    }
}

fn default_state_file() -> PathBuf {
    env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(".taskdesk")
        .join("session.json")
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
