//! Builds an `AppConfig` from config files and the environment.
//! Sources are layered with `figment`: `config/base.toml`, then the environment specific
//! file selected by `APP_ENVIRONMENT`, then `APP_` prefixed environment variables
//! (`__` separates nested keys, e.g. `APP_MARKETING_CONFIG__API_KEY`).
//!
//! The resulting value is built once in `main` and handed to `App::build_from_config`.

mod error;
mod types;

use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tracing::info;

pub use error::{ConfigError, ConfigResult};
pub use types::{AppConfig, Environment, MarketingConfig, MarketingCredentials, NetConfig};

impl AppConfig {
    /// Loads the configuration from the `config` directory inside the current working directory.
    pub fn load() -> ConfigResult<Self> {
        info!("{:<12} - Initializing the configuration", "AppConfig::load");

        let config_dir = std::env::current_dir()?.join("config");
        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()?;

        Self::figment(&config_dir, &environment).extract().map_err(Into::into)
    }

    /// All the configuration sources, in order of increasing priority.
    pub fn figment(config_dir: &Path, environment: &Environment) -> Figment {
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
    }
}
