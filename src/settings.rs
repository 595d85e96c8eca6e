//! Layered settings.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. an optional config file (TOML, YAML or JSON, picked by extension)
//! 3. `MESHGRAPH_*` environment variables, `__` separating nested keys
//!    (`MESHGRAPH_PROMETHEUS__URL`, `MESHGRAPH_THRESHOLDS__ERROR`)
//!
//! Command-line flags are applied on top by the binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use meshgraph_adapters::prometheus::{Auth, PrometheusSource};
use meshgraph_engine::{DashboardLinks, DurationMerge, Palette, ProjectorConfig, Thresholds};
use serde::Deserialize;

/// Error threshold used when none (or zero) is configured.
pub const DEFAULT_ERROR_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    None,
    Basic,
    Token,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrometheusSettings {
    pub url: String,
    pub auth_method: AuthMethod,
    pub username: String,
    pub password: String,
    pub token: String,
    pub timeout_secs: u64,
}

impl Default for PrometheusSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9090".to_string(),
            auth_method: AuthMethod::None,
            username: String::new(),
            password: String::new(),
            token: String::new(),
            timeout_secs: 10,
        }
    }
}

impl PrometheusSettings {
    /// Build a Prometheus sample source from these settings.
    pub fn source(&self) -> PrometheusSource {
        let auth = match self.auth_method {
            AuthMethod::None => Auth::None,
            AuthMethod::Basic => Auth::Basic {
                username: self.username.clone(),
                password: self.password.clone(),
            },
            AuthMethod::Token => Auth::Token(self.token.clone()),
        };
        PrometheusSource::builder()
            .endpoint(&self.url)
            .auth(auth)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }
}

/// All settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub prometheus: PrometheusSettings,
    pub thresholds: Thresholds,
    pub dashboards: DashboardLinks,
    pub palette: Palette,
    pub duration_merge: DurationMerge,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prometheus: PrometheusSettings::default(),
            thresholds: Thresholds::default(),
            dashboards: DashboardLinks::default(),
            palette: Palette::default(),
            duration_merge: DurationMerge::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, Environment::with_prefix("MESHGRAPH"))
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()
            .context("Failed to load settings")?;

        config
            .try_deserialize()
            .context("Failed to parse settings")
    }

    /// Thresholds and colors for the projector.
    ///
    /// A zero error threshold would flag all traffic as critical, so it falls
    /// back to the default.
    pub fn projector_config(&self) -> ProjectorConfig {
        let mut thresholds = self.thresholds;
        if thresholds.error == 0.0 {
            thresholds.error = DEFAULT_ERROR_THRESHOLD;
        }
        ProjectorConfig {
            thresholds,
            palette: self.palette.clone(),
        }
    }
}
