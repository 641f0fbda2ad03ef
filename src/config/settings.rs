use serde::Deserialize;

use crate::ttl::TtlSpec;

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// ================================
/// Persistence backend
/// ================================
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    #[default]
    Memory,
    File {
        /// invariant: non-empty
        path: String,
    },
}

/// ================================
/// Access token & authorization failures
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_token_key")]
    pub token_key: String,
    /// invariant: starts with '/'
    #[serde(default = "default_login_route")]
    pub login_route: String,
    #[serde(default = "default_auth_message")]
    pub message: String,
    /// ttl for tokens without an `exp` claim
    #[serde(default)]
    pub expires: TtlSpec,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_key: default_token_key(),
            login_route: default_login_route(),
            message: default_auth_message(),
            expires: TtlSpec::Never,
        }
    }
}

fn default_token_key() -> String {
    "access_token".to_string()
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_auth_message() -> String {
    "Your session has expired, please sign in again".to_string()
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    #[serde(default = "LogFormat::from_env")]
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}
