//! Settings structures for answer-desk configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use url::Url;

/// Default answer service endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/search";

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub ui: UiSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (ANSWER_DESK_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("ANSWER_DESK_ENDPOINT") {
            self.service.endpoint = val;
        }
        if let Some(val) = var("ANSWER_DESK_TIMEOUT") {
            if let Ok(secs) = val.parse::<f64>() {
                self.service.request_timeout = Some(secs);
            }
        }
        if let Some(val) = var("ANSWER_DESK_SHOW_DATES") {
            self.ui.show_dates = val.parse().unwrap_or(true);
        }
    }

    /// Check that the settings describe a usable service
    pub fn validate(&self) -> Result<()> {
        self.service.validate()
    }
}

/// Answer service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// URL the query is POSTed to
    pub endpoint: String,
    /// Request timeout in seconds (none = wait indefinitely)
    pub request_timeout: Option<f64>,
    /// User agent sent with each request
    pub user_agent: String,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: None,
            user_agent: format!("answer-desk/{}", crate::VERSION),
            extra_headers: HashMap::new(),
        }
    }
}

impl ServiceSettings {
    /// Reject endpoints that are not absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint)?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("unsupported endpoint scheme: {}", url.scheme());
        }
        if let Some(timeout) = self.request_timeout {
            if !(timeout.is_finite() && timeout > 0.0) {
                bail!("request_timeout must be a positive number of seconds");
            }
        }
        Ok(())
    }
}

/// Terminal presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Show source publication dates when present
    pub show_dates: bool,
    /// Show the link host next to each source title
    pub show_hosts: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_dates: true,
            show_hosts: true,
        }
    }
}
