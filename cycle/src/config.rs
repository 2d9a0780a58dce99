use crate::analytics::AnalyticsConfig;
use config::{Config, ConfigError, Environment, File};
use cycle_api::endpoints::periods::DEFAULT_PAGE_SIZE;
use cycle_auth::Settings;
use serde::Deserialize;
use std::path::Path;

/// Upper bound for the configurable phase lengths, well beyond any real cycle.
const MAX_PHASE_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PeriodsConfig {
    /// Page size when walking the full history.
    pub page_size: u32,
}

impl Default for PeriodsConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Application configuration
///
/// ```toml
/// [auth]
/// server_url = "http://localhost:5000"
///
/// [analytics]
/// luteal_phase_days = 14
/// fertile_window_days = 6
///
/// [periods]
/// page_size = 10
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub auth: Settings,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub periods: PeriodsConfig,
}

impl AppConfig {
    /// `config.toml` in the working directory, or `$CYCLE_CONFIG`, then `CYCLE__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CYCLE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::build(File::with_name(&config_path).required(false))
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("CYCLE").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.auth.validate()?;
        if !(0..=MAX_PHASE_DAYS).contains(&self.analytics.luteal_phase_days) {
            return Err(format!(
                "analytics.luteal_phase_days must be between 0 and {}",
                MAX_PHASE_DAYS
            ));
        }
        if !(1..=MAX_PHASE_DAYS).contains(&self.analytics.fertile_window_days) {
            return Err(format!(
                "analytics.fertile_window_days must be between 1 and {}",
                MAX_PHASE_DAYS
            ));
        }
        if self.periods.page_size == 0 {
            return Err("periods.page_size must be at least 1".to_string());
        }
        Ok(())
    }
}
