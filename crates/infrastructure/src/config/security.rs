//! Security configuration: API keys, CORS origins, rate limiting.

use std::net::IpAddr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::default_true;

/// Keys shipped for local development; flagged by the security validator
pub const DEVELOPMENT_API_KEYS: [(&str, &str); 2] = [("admin-key", "admin"), ("user-key-456", "user")];

/// A pre-shared API key and the role it grants
///
/// Example in config.toml:
/// ```toml
/// [[security.api_keys]]
/// key = "change-me"
/// role = "admin"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    /// The pre-shared key value
    #[serde(skip_serializing)]
    pub key: SecretString,

    /// Role granted to callers presenting this key
    pub role: String,
}

impl ApiKeyEntry {
    /// Create an entry from a plaintext key and role name
    #[must_use]
    pub fn new(key: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            key: SecretString::from(key.into()),
            role: role.into(),
        }
    }

    /// Whether this entry is one of the built-in development keys
    #[must_use]
    pub fn is_development_key(&self) -> bool {
        DEVELOPMENT_API_KEYS
            .iter()
            .any(|(key, _)| self.key.expose_secret() == *key)
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Pre-shared API keys and their roles
    #[serde(default = "default_api_keys")]
    pub api_keys: Vec<ApiKeyEntry>,

    /// Origins allowed to make cross-origin requests
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Trusted proxy IP addresses for X-Forwarded-For header validation
    ///
    /// Only IPs in this list are trusted to set X-Forwarded-For headers.
    /// If empty, the direct connection IP is always used.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,

    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub rate_limit_enabled: bool,

    /// Token bucket capacity (maximum burst) per client
    #[serde(default = "default_rate_limit_capacity")]
    pub rate_limit_capacity: u32,

    /// Tokens added to each bucket per minute
    #[serde(default = "default_rate_limit_refill")]
    pub rate_limit_refill_per_minute: u32,

    /// Maximum number of tracked clients before the least recently seen is evicted
    #[serde(default = "default_max_clients")]
    pub rate_limit_max_clients: usize,

    /// Rate limiter cleanup interval in seconds (default: 300 = 5 minutes)
    #[serde(default = "default_cleanup_interval")]
    pub rate_limit_cleanup_interval_secs: u64,

    /// Rate limiter entry max age in seconds before cleanup (default: 600 = 10 minutes)
    #[serde(default = "default_cleanup_max_age")]
    pub rate_limit_cleanup_max_age_secs: u64,
}

fn default_api_keys() -> Vec<ApiKeyEntry> {
    DEVELOPMENT_API_KEYS
        .iter()
        .map(|(key, role)| ApiKeyEntry::new(*key, *role))
        .collect()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "https://myblog.com".to_string(),
    ]
}

const fn default_rate_limit_capacity() -> u32 {
    100
}

const fn default_rate_limit_refill() -> u32 {
    100
}

const fn default_max_clients() -> usize {
    10_000
}

const fn default_cleanup_interval() -> u64 {
    300 // 5 minutes
}

const fn default_cleanup_max_age() -> u64 {
    600 // 10 minutes
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_keys: default_api_keys(),
            allowed_origins: default_allowed_origins(),
            trusted_proxies: Vec::new(),
            rate_limit_enabled: true,
            rate_limit_capacity: default_rate_limit_capacity(),
            rate_limit_refill_per_minute: default_rate_limit_refill(),
            rate_limit_max_clients: default_max_clients(),
            rate_limit_cleanup_interval_secs: default_cleanup_interval(),
            rate_limit_cleanup_max_age_secs: default_cleanup_max_age(),
        }
    }
}

impl SecurityConfig {
    /// Check if the configuration has any API keys configured
    #[must_use]
    pub fn has_api_keys(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Count keys that are still the built-in development keys
    #[must_use]
    pub fn count_development_keys(&self) -> usize {
        self.api_keys
            .iter()
            .filter(|entry| entry.is_development_key())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SecurityConfig::default();
        assert_eq!(config.rate_limit_capacity, 100);
        assert_eq!(config.rate_limit_refill_per_minute, 100);
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(config.rate_limit_enabled);
    }

    #[test]
    fn default_keys_are_flagged_as_development() {
        let config = SecurityConfig::default();
        assert!(config.has_api_keys());
        assert_eq!(config.count_development_keys(), 2);
    }

    #[test]
    fn custom_key_is_not_development() {
        let entry = ApiKeyEntry::new("a-long-random-secret", "admin");
        assert!(!entry.is_development_key());
    }

    #[test]
    fn api_key_is_not_serialized() {
        let entry = ApiKeyEntry::new("super-secret", "user");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(json.contains("user"));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let entry = ApiKeyEntry::new("super-secret", "user");
        assert!(!format!("{entry:?}").contains("super-secret"));
    }

    #[test]
    fn deserializes_key_table() {
        let json = r#"{"api_keys":[{"key":"k1","role":"admin"}]}"#;
        let config: SecurityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_keys.len(), 1);
        assert_eq!(config.api_keys[0].role, "admin");
        assert_eq!(config.api_keys[0].key.expose_secret(), "k1");
        assert_eq!(config.rate_limit_capacity, 100);
    }
}
