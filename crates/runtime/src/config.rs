use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Apply pending migrations when the factory starts.
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Either "json" or "pretty".
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    /// Largest accepted options payload, in bytes.
    #[serde(default = "default_max_options_length")]
    pub max_options_length: usize,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            max_options_length: default_max_options_length(),
        }
    }
}

// Default value functions
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_run_migrations() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_max_options_length() -> usize {
    shared::validation::DEFAULT_MAX_OPTIONS_LENGTH
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

const TEST_DEFAULTS: &str = r#"
    [database]
    url = ""
    max_connections = 20
    min_connections = 5
    connect_timeout_secs = 10
    idle_timeout_secs = 600
    run_migrations = true

    [logging]
    level = "info"
    format = "json"

    [preferences]
    max_options_length = 1048576
"#;

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. `.env` file, if present
    /// 2. config/default.toml - base configuration with defaults
    /// 3. config/local.toml - local overrides (optional, not in git)
    /// 4. Environment variables with PREF__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from("config")
    }

    /// Load `default` and the optional `local` file from `dir`, apply `PREF__`
    /// environment overrides, and validate the result.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let dir = dir.as_ref();

        let config = config::Config::builder()
            .add_source(config::File::from(dir.join("default")))
            .add_source(config::File::from(dir.join("local")).required(false))
            .add_source(config::Environment::with_prefix("PREF").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Built entirely from embedded defaults and overrides, without touching
    /// config files or the environment. Validation is skipped.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(TEST_DEFAULTS, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PREF__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.preferences.max_options_length == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "preferences.max_options_length must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(ConfigValidationError::InvalidValue(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            )));
        }

        Ok(())
    }
}
