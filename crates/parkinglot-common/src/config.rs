//! Application configuration
//!
//! Configuration is layered with figment: compiled-in defaults, then an
//! optional TOML file, then `PARKINGLOT_*` environment variables. The six
//! Firebase values have no defaults and must be supplied; [`AppConfig::load`]
//! refuses to return a config that is missing any of them.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default API server used when none is configured
pub const DEFAULT_API_URL: &str = "https://ideas-parking-lot-server.vercel.app";

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "parkinglot.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Required values were not provided
    #[error("{}", missing_values_message(.fields))]
    MissingValues { fields: Vec<MissingField> },

    /// A value was provided but is not usable
    #[error("Invalid configuration value for '{key}': {details}")]
    InvalidValue { key: String, details: String },

    /// The configuration sources could not be parsed
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },
}

/// A required configuration value that was absent or blank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    /// Field name as the identity provider calls it (e.g. `apiKey`)
    pub name: &'static str,
    /// Environment variable that supplies it
    pub env_var: &'static str,
}

fn missing_values_message(fields: &[MissingField]) -> String {
    let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
    let vars: Vec<&str> = fields.iter().map(|f| f.env_var).collect();
    format!(
        "Missing Firebase configuration: {}. Set {} in the environment or in the [firebase] table of {}.",
        names.join(", "),
        vars.join(", "),
        DEFAULT_CONFIG_FILE
    )
}

/// REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the ideas API server
    pub url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Firebase project settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FirebaseConfig {
    #[serde(deserialize_with = "string_or_scalar")]
    pub api_key: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub auth_domain: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub project_id: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub storage_bucket: String,
    /// Numeric in every Firebase project, so env values arrive as integers
    #[serde(deserialize_with = "string_or_scalar")]
    pub messaging_sender_id: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub app_id: String,
}

/// Accept a string, or a scalar figment parsed out of an env var, as text
fn string_or_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Bool(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Signed(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    })
}

impl FirebaseConfig {
    /// Every required field, in reporting order
    fn fields(&self) -> [(&str, MissingField); 6] {
        [
            (
                self.api_key.as_str(),
                MissingField {
                    name: "apiKey",
                    env_var: "PARKINGLOT_FIREBASE_API_KEY",
                },
            ),
            (
                self.auth_domain.as_str(),
                MissingField {
                    name: "authDomain",
                    env_var: "PARKINGLOT_FIREBASE_AUTH_DOMAIN",
                },
            ),
            (
                self.project_id.as_str(),
                MissingField {
                    name: "projectId",
                    env_var: "PARKINGLOT_FIREBASE_PROJECT_ID",
                },
            ),
            (
                self.storage_bucket.as_str(),
                MissingField {
                    name: "storageBucket",
                    env_var: "PARKINGLOT_FIREBASE_STORAGE_BUCKET",
                },
            ),
            (
                self.messaging_sender_id.as_str(),
                MissingField {
                    name: "messagingSenderId",
                    env_var: "PARKINGLOT_FIREBASE_MESSAGING_SENDER_ID",
                },
            ),
            (
                self.app_id.as_str(),
                MissingField {
                    name: "appId",
                    env_var: "PARKINGLOT_FIREBASE_APP_ID",
                },
            ),
        ]
    }

    /// Required fields that are empty or whitespace
    pub fn missing_fields(&self) -> Vec<MissingField> {
        self.fields()
            .into_iter()
            .filter(|(value, _)| value.trim().is_empty())
            .map(|(_, field)| field)
            .collect()
    }
}

/// Google OAuth client used for provider sign-in (optional)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OAuthSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_client_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_client_secret: Option<String>,
}

/// Auth surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Login entry point that 401 responses redirect to
    pub login_path: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub oauth: OAuthSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl AppConfig {
    /// Load and validate configuration.
    ///
    /// `path` overrides the default `parkinglot.toml` lookup. A missing file is
    /// not an error; missing required values are.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let config = Self::figment(path)
            .extract::<Self>()
            .map_err(|e| ConfigurationError::ParseError {
                details: e.to_string(),
            })?;

        config.validate()?;
        debug!("Configuration loaded, api url {}", config.api.url);
        Ok(config)
    }

    /// Build the layered provider without extracting it
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = match path {
            Some(p) => Toml::file(p),
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };

        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(file)
            .merge(Env::prefixed("PARKINGLOT_API_").map(|k| format!("api.{}", k.as_str()).into()))
            .merge(
                Env::prefixed("PARKINGLOT_FIREBASE_")
                    .map(|k| format!("firebase.{}", k.as_str()).into()),
            )
            .merge(
                Env::prefixed("PARKINGLOT_OAUTH_").map(|k| format!("oauth.{}", k.as_str()).into()),
            )
            .merge(
                Env::prefixed("PARKINGLOT_AUTH_").map(|k| format!("auth.{}", k.as_str()).into()),
            )
    }

    /// Check required values and the API URL
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let missing = self.firebase.missing_fields();
        if !missing.is_empty() {
            return Err(ConfigurationError::MissingValues { fields: missing });
        }

        let url = url::Url::parse(&self.api.url).map_err(|e| ConfigurationError::InvalidValue {
            key: "api.url".to_string(),
            details: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidValue {
                key: "api.url".to_string(),
                details: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                key: "api.timeout_secs".to_string(),
                details: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Google OAuth client id, if provider sign-in is configured
    pub fn google_client_id(&self) -> Option<&str> {
        self.oauth
            .google_client_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// Render an example config file
    pub fn generate_example() -> Result<String, ConfigurationError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigurationError::ParseError {
            details: format!("Failed to serialize config: {e}"),
        })
    }
}
