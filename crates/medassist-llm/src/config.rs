use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no API key configured; set GEMINI_API_KEY or api_key in the config file")]
    MissingApiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub request_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub max_rounds: usize,
}

const CONFIG_FILE_PATH: &str = "config.toml";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly medical front-desk assistant. \
Use the available tools to check the patient's vitals, look up medical information, \
and book appointments. Base your answers on tool results and keep them brief.";

fn medassist_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".medassist")
}

fn medassist_config_json_path() -> PathBuf {
    medassist_dir().join("config.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            model: None,
            system_prompt: None,
            request_timeout_secs: 60,
            tool_timeout_secs: 30,
            max_rounds: 8,
        }
    }
}

impl Config {
    /// Loads `~/.medassist/config.json`, falling back to `./config.toml`,
    /// then applies environment overrides.
    pub fn new() -> Self {
        let mut config = Self::load_from(
            Some(&medassist_config_json_path()),
            Some(Path::new(CONFIG_FILE_PATH)),
        );
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// First readable file wins; unreadable or invalid files are skipped.
    pub fn load_from(json_path: Option<&Path>, toml_path: Option<&Path>) -> Self {
        if let Some(path) = json_path.filter(|path| path.exists()) {
            match std::fs::read_to_string(path)
                .map_err(|error| error.to_string())
                .and_then(|content| {
                    serde_json::from_str::<Config>(&content).map_err(|error| error.to_string())
                }) {
                Ok(config) => return config,
                Err(error) => log::warn!("Ignoring config file {}: {}", path.display(), error),
            }
        }

        if let Some(path) = toml_path.filter(|path| path.exists()) {
            match std::fs::read_to_string(path)
                .map_err(|error| error.to_string())
                .and_then(|content| {
                    toml::from_str::<Config>(&content).map_err(|error| error.to_string())
                }) {
                Ok(config) => return config,
                Err(error) => log::warn!("Ignoring config file {}: {}", path.display(), error),
            }
        }

        Self::default()
    }

    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = env("GEMINI_API_KEY").or_else(|| env("API_KEY")) {
            self.api_key = Some(api_key);
        }
        if let Some(api_base) = env("API_BASE") {
            self.api_base = Some(api_base);
        }
        if let Some(model) = env("MODEL") {
            self.model = Some(model);
        }
        if let Some(value) = env("MEDASSIST_MAX_ROUNDS") {
            parse_env_number("MEDASSIST_MAX_ROUNDS", &value, &mut self.max_rounds);
        }
        if let Some(value) = env("MEDASSIST_REQUEST_TIMEOUT_SECS") {
            parse_env_number(
                "MEDASSIST_REQUEST_TIMEOUT_SECS",
                &value,
                &mut self.request_timeout_secs,
            );
        }
        if let Some(value) = env("MEDASSIST_TOOL_TIMEOUT_SECS") {
            parse_env_number("MEDASSIST_TOOL_TIMEOUT_SECS", &value, &mut self.tool_timeout_secs);
        }
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs.max(1))
    }
}

fn parse_env_number<T: std::str::FromStr>(key: &str, value: &str, target: &mut T) {
    match value.trim().parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => log::warn!("Ignoring {key}={value:?}: not a number"),
    }
}
