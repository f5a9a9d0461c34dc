//! Coordinator configuration.
//!
//! A `PwaConfig` is supplied once at construction and never changes. Native
//! callers load it with [`PwaConfig::load`]; browser callers deserialize it
//! from a plain options object.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::lifecycle::UPDATE_PROMPT_MESSAGE;

/// Config file picked up from the working directory when no path is given.
pub const CONFIG_FILE: &str = "pwa.config.json";

/// Prefix for environment overrides (`PWA_URL`, `PWA_SCOPE`, ...).
pub const ENV_PREFIX: &str = "PWA_";

/// Whether to probe the worker script before registering it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreflightPolicy {
    /// Register directly and let the platform reject a bad script.
    #[default]
    Skip,
    /// Issue a HEAD request first and check status and content type.
    Validate,
}

/// Service worker location and coordination settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PwaConfig {
    /// Worker script URL, relative to the page (default `./sw.js`).
    pub url: String,

    /// Subtree the worker controls (default `./`).
    pub scope: String,

    /// Preflight policy (default: skip).
    pub preflight: PreflightPolicy,

    /// Text of the update confirmation.
    pub update_message: String,
}

impl Default for PwaConfig {
    fn default() -> Self {
        Self {
            url: "./sw.js".to_string(),
            scope: "./".to_string(),
            preflight: PreflightPolicy::Skip,
            update_message: UPDATE_PROMPT_MESSAGE.to_string(),
        }
    }
}

impl PwaConfig {
    /// Creates a config for the given script URL and scope.
    pub fn new(url: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scope: scope.into(),
            ..Self::default()
        }
    }

    /// Sets the preflight policy.
    #[must_use]
    pub fn with_preflight(mut self, preflight: PreflightPolicy) -> Self {
        self.preflight = preflight;
        self
    }

    /// Sets the update confirmation text.
    #[must_use]
    pub fn with_update_message(mut self, message: impl Into<String>) -> Self {
        self.update_message = message.into();
        self
    }

    /// Load configuration from multiple sources.
    /// Priority: environment variables > config file > defaults
    ///
    /// Without an explicit `path`, `pwa.config.json` in the working directory
    /// is used when it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` for unreadable or mistyped sources and
    /// `ConfigError::InvalidValue` when the merged result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = path.map(Path::to_path_buf).or_else(|| {
            let default_path = Path::new(CONFIG_FILE);
            default_path.exists().then(|| default_path.to_path_buf())
        });

        if let Some(path) = config_file {
            tracing::debug!("Loading PWA config from {}", path.display());
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that url and scope are usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "url".to_string(),
                reason: "service worker URL cannot be empty".to_string(),
            });
        }

        if self.scope.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scope".to_string(),
                reason: "scope cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}
