//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings
//! - `security`: API keys, CORS origins, rate limiting
//! - `store`: article store settings

mod security;
mod server;
mod store;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use security::{ApiKeyEntry, DEVELOPMENT_API_KEYS, SecurityConfig};
pub use server::ServerConfig;
pub use store::StoreConfig;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "ARTICLES";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Application environment (development or production)
///
/// Controls security validation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment - relaxed security warnings
    #[default]
    Development,
    /// Production environment - strict security validation
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development or production)
    ///
    /// In production, critical security warnings prevent startup unless
    /// ARTICLES_ALLOW_INSECURE_CONFIG=true.
    #[serde(default)]
    pub environment: Option<Environment>,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Security configuration
    #[serde(default)]
    pub security: SecurityConfig,

    /// Article store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from environment and optional file
    ///
    /// Sources, lowest precedence first: built-in defaults, `config.toml`
    /// in the working directory, `ARTICLES__`-style environment variables
    /// (e.g. `ARTICLES_SERVER__PORT=9090`).
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration using a specific file stem instead of `config`
    pub fn load_from(file_stem: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Whether the service runs in production mode
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == Some(Environment::Production)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn environment_parses_aliases() {
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("Development".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn environment_display() {
        assert_eq!(Environment::Production.to_string(), "production");
    }

    #[test]
    fn default_config_is_development() {
        let config = AppConfig::default();
        assert!(!config.is_production());
        assert!(config.store.seed_demo_articles);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let config = AppConfig::load_from("definitely-not-a-config-file").unwrap();
        assert_eq!(config.security.rate_limit_capacity, 100);
        assert!(config.security.has_api_keys());
    }

    #[test]
    fn load_from_toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
environment = "production"

[server]
port = 9191
log_format = "json"

[security]
allowed_origins = ["https://example.org"]
rate_limit_capacity = 5

[[security.api_keys]]
key = "prod-secret"
role = "admin"

[store]
seed_demo_articles = false
"#
        )
        .unwrap();

        let stem = dir.path().join("articles");
        let config = AppConfig::load_from(stem.to_str().unwrap()).unwrap();

        assert!(config.is_production());
        assert_eq!(config.server.port, 9191);
        assert!(config.server.json_logs());
        assert_eq!(config.security.allowed_origins, vec!["https://example.org"]);
        assert_eq!(config.security.rate_limit_capacity, 5);
        assert_eq!(config.security.api_keys.len(), 1);
        assert_eq!(config.security.count_development_keys(), 0);
        assert!(!config.store.seed_demo_articles);
    }
}
