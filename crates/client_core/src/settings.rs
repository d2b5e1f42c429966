use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use shared::domain::InputState;
use storage::DEFAULT_ORIGIN;

use crate::DEFAULT_PREDICT_URL;

const SETTINGS_FILE_STEM: &str = "autoscore";
const ENV_PREFIX: &str = "AUTOSCORE";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    /// Falls back to `<local data dir>/autoscore/inputs.sqlite3`.
    pub database_url: Option<String>,
    pub origin: String,
    /// Choices offered by the domain selector, first entry is the default.
    pub domains: Vec<String>,
    pub default_domain: Option<String>,
    pub default_dataset_size: String,
    pub show_errors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PREDICT_URL.to_string(),
            database_url: None,
            origin: DEFAULT_ORIGIN.to_string(),
            domains: ["nlp", "computer_vision", "multimodal", "audio", "reinforcement_learning"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_domain: None,
            default_dataset_size: String::new(),
            show_errors: false,
        }
    }
}

impl Settings {
    /// Defaults, then `autoscore.toml` (or `path`), then `AUTOSCORE__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_sources(path, None)
    }

    pub(crate) fn from_sources(
        path: Option<&Path>,
        env_override: Option<Map<String, String>>,
    ) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(SETTINGS_FILE_STEM).required(false),
        };
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("domains")
            .source(env_override);

        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("failed to parse settings")
    }

    pub fn database_url(&self) -> Result<String> {
        if let Some(url) = self.database_url.as_deref().filter(|v| !v.trim().is_empty()) {
            return Ok(url.to_string());
        }
        let base = dirs::data_local_dir()
            .context("unable to resolve local app data dir; set AUTOSCORE__DATABASE_URL")?;
        let path = base.join("autoscore").join("inputs.sqlite3");
        Ok(format!(
            "sqlite://{}",
            path.to_string_lossy().replace('\\', "/")
        ))
    }

    /// What the form shows before anything was persisted.
    pub fn form_defaults(&self) -> InputState {
        let domain = self
            .default_domain
            .clone()
            .or_else(|| self.domains.first().cloned())
            .unwrap_or_default();
        InputState::new(domain, self.default_dataset_size.clone())
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
