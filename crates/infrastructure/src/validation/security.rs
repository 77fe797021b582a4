//! Startup checks for security-relevant configuration
//!
//! Each check inspects the loaded [`AppConfig`] and reports at most one coded
//! finding. In production a critical finding stops the server unless
//! `ARTICLES_ALLOW_INSECURE_CONFIG` is set.

use std::{cmp::Reverse, collections::HashSet};

use secrecy::ExposeSecret;
use tracing::{error, info, warn};

use crate::config::AppConfig;

/// Environment variable that lets a production deployment start despite critical findings
pub const ALLOW_INSECURE_ENV: &str = "ARTICLES_ALLOW_INSECURE_CONFIG";

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WarningSeverity {
    Info,
    Warning,
    Critical,
}

/// A coded configuration finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityWarning {
    /// Stable identifier, `SEC001`..`SEC007`
    pub code: &'static str,
    pub severity: WarningSeverity,
    /// What is wrong and how to fix it
    pub message: String,
}

impl SecurityWarning {
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self.severity, WarningSeverity::Critical)
    }
}

type Check = fn(&AppConfig) -> Option<SecurityWarning>;

const CHECKS: [Check; 7] = [
    development_keys,
    missing_keys,
    duplicate_keys,
    unmatched_origins,
    rate_limit_disabled,
    empty_buckets,
    zero_client_ceiling,
];

/// Runs the startup configuration checks
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityValidator;

impl SecurityValidator {
    /// Run every check; critical findings come first
    #[must_use]
    pub fn validate(config: &AppConfig) -> Vec<SecurityWarning> {
        let mut warnings: Vec<_> = CHECKS.iter().filter_map(|check| check(config)).collect();
        warnings.sort_by_key(|w| Reverse(w.severity));
        warnings
    }

    /// Whether the server must refuse to start with these findings
    #[must_use]
    pub fn should_block_startup(config: &AppConfig, warnings: &[SecurityWarning]) -> bool {
        config.is_production()
            && warnings.iter().any(SecurityWarning::is_critical)
            && !insecure_override()
    }

    /// Emit each finding at the log level matching its severity
    pub fn log_warnings(warnings: &[SecurityWarning]) {
        for w in warnings {
            match w.severity {
                WarningSeverity::Critical => error!(code = w.code, "{}", w.message),
                WarningSeverity::Warning => warn!(code = w.code, "{}", w.message),
                WarningSeverity::Info => info!(code = w.code, "{}", w.message),
            }
        }
    }
}

fn insecure_override() -> bool {
    std::env::var(ALLOW_INSECURE_ENV).is_ok_and(|v| matches!(v.as_str(), "true" | "1"))
}

fn finding(
    code: &'static str,
    severity: WarningSeverity,
    message: impl Into<String>,
) -> SecurityWarning {
    SecurityWarning {
        code,
        severity,
        message: message.into(),
    }
}

fn development_keys(config: &AppConfig) -> Option<SecurityWarning> {
    let count = config.security.count_development_keys();
    let severity = if config.is_production() {
        WarningSeverity::Critical
    } else {
        WarningSeverity::Warning
    };

    (count > 0).then(|| {
        finding(
            "SEC001",
            severity,
            format!("{count} built-in development API key(s) active; replace security.api_keys with generated secrets"),
        )
    })
}

fn missing_keys(config: &AppConfig) -> Option<SecurityWarning> {
    (!config.security.has_api_keys()).then(|| {
        finding(
            "SEC002",
            WarningSeverity::Warning,
            "no API keys configured; every protected route answers 401",
        )
    })
}

fn duplicate_keys(config: &AppConfig) -> Option<SecurityWarning> {
    let mut seen = HashSet::new();
    let duplicated = config
        .security
        .api_keys
        .iter()
        .any(|entry| !seen.insert(entry.key.expose_secret()));

    duplicated.then(|| {
        finding(
            "SEC003",
            WarningSeverity::Warning,
            "an API key is listed more than once; only the first entry's role is used",
        )
    })
}

fn unmatched_origins(config: &AppConfig) -> Option<SecurityWarning> {
    let unmatched: Vec<&str> = config
        .security
        .allowed_origins
        .iter()
        .map(String::as_str)
        .filter(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        .collect();

    (!unmatched.is_empty()).then(|| {
        finding(
            "SEC004",
            WarningSeverity::Warning,
            format!("allowed origins without an http(s) scheme never match a browser Origin: {unmatched:?}"),
        )
    })
}

fn rate_limit_disabled(config: &AppConfig) -> Option<SecurityWarning> {
    let severity = if config.is_production() {
        WarningSeverity::Warning
    } else {
        WarningSeverity::Info
    };

    (!config.security.rate_limit_enabled)
        .then(|| finding("SEC005", severity, "rate limiting is disabled"))
}

fn empty_buckets(config: &AppConfig) -> Option<SecurityWarning> {
    let security = &config.security;
    let empty = security.rate_limit_capacity == 0 || security.rate_limit_refill_per_minute == 0;

    (security.rate_limit_enabled && empty).then(|| {
        finding(
            "SEC006",
            WarningSeverity::Critical,
            "rate limit capacity or refill rate is zero; every request would be rejected",
        )
    })
}

fn zero_client_ceiling(config: &AppConfig) -> Option<SecurityWarning> {
    let security = &config.security;

    (security.rate_limit_enabled && security.rate_limit_max_clients == 0).then(|| {
        finding(
            "SEC007",
            WarningSeverity::Critical,
            "rate_limit_max_clients is zero; no client could be tracked",
        )
    })
}
