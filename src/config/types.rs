//! The configuration structs used to build the AppConfig, and their impls.
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult};

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub marketing_config: MarketingConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

/// Settings for the external marketing platform.
/// The secrets are optional here so that a missing value surfaces as a `ConfigError`
/// from `credentials()` instead of a deserialization failure.
#[derive(Deserialize, Clone, Debug)]
pub struct MarketingConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default)]
    pub list_id: Option<String>,
    pub api_revision: String,
    /// Acquisition tag written to every contact's properties.
    pub source: String,
    pub timeout_millis: u64,
}

/// The validated secrets needed to talk to the marketing platform.
#[derive(Clone, Debug)]
pub struct MarketingCredentials {
    pub api_key: SecretString,
    pub list_id: String,
}

// ###################################
// ->   IMPLs
// ###################################
impl MarketingConfig {
    /// Validates that both the API key and the list id are present and not blank.
    pub fn credentials(&self) -> ConfigResult<MarketingCredentials> {
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .cloned()
            .ok_or(ConfigError::MissingApiKey)?;
        let list_id = self
            .list_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingListId)?
            .to_string();

        Ok(MarketingCredentials { api_key, list_id })
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_millis)
    }
}

// ###################################
// ->   TRY FROMs
// ###################################

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail(value)),
        }
    }
}

// ###################################
// ->   TESTS
// ###################################
