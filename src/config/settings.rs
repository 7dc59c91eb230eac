use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub gitlab: GitLabConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Instance root, e.g. `https://gitlab.com`.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// Layered config: coded defaults, then an optional `config/<env>.toml`,
    /// then `LABGATE__`-prefixed environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .set_default("gitlab.url", "https://gitlab.com")?
            .set_default("logging.level", "info")?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("LABGATE").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// The private token is deliberately env-only, never read from files.
    pub fn token() -> Result<String> {
        env::var("GITLAB_TOKEN")
            .map_err(|_| anyhow::anyhow!("GITLAB_TOKEN environment variable not set"))
    }
}
