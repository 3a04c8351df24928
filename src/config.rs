//! # Router Configuration
//!
//! [`RouterConfig`] names the private URL scheme, the two reserved hosts and the
//! reporting policy. Values come from, in increasing priority:
//!
//! 1. built-in defaults (`app://app/...`, `app://extension/...`)
//! 2. a TOML file loaded with [`RouterConfig::load`]
//! 3. `PROTOROUTER_*` environment variables applied by [`RouterConfig::apply_env`]
//!
//! ## Environment Variables
//!
//! | Variable | Field |
//! |---|---|
//! | `PROTOROUTER_SCHEME` | `scheme` |
//! | `PROTOROUTER_INTERNAL_HOST` | `internal_host` |
//! | `PROTOROUTER_EXTENSION_HOST` | `extension_host` |
//! | `PROTOROUTER_PENDING_POLICY` | `reporting.pending_policy` (`buffer` / `drop`) |
//! | `PROTOROUTER_PENDING_CAPACITY` | `reporting.pending_capacity` |
//! | `PROTOROUTER_BROADCAST_NOT_MATCHED` | `reporting.broadcast_not_matched` |
//!
//! Unparseable values are ignored with a warning.
//!
//! ## File format
//!
//! ```toml
//! scheme = "lens"
//! internal_host = "app"
//! extension_host = "extension"
//!
//! [reporting]
//! pending_policy = "buffer"
//! pending_capacity = 128
//! broadcast_not_matched = true
//! ```

use crate::reporter::{PendingPolicy, ReportingConfig};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// RFC 3986 scheme syntax
static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*$").expect("scheme regex should be valid"));

/// Routing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// URL scheme handled by the router, without `://`
    pub scheme: String,
    /// Host addressing the application's own handlers
    pub internal_host: String,
    /// Host addressing plugin handlers; the first path segment names the plugin
    pub extension_host: String,
    /// Outcome delivery settings
    pub reporting: ReportingConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            scheme: "app".to_string(),
            internal_host: "app".to_string(),
            extension_host: "extension".to_string(),
            reporting: ReportingConfig::default(),
        }
    }
}

/// Invalid router configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Scheme is empty or not RFC 3986 syntax
    InvalidScheme(String),
    /// A reserved host is empty or contains a character that cannot appear in a host
    InvalidHost { field: &'static str, value: String },
    /// Internal and extension host are the same (case-insensitive)
    DuplicateHost(String),
    /// `pending_capacity` is zero while the policy is `buffer`
    ZeroPendingCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidScheme(s) => write!(f, "invalid scheme '{}'", s),
            ConfigError::InvalidHost { field, value } => {
                write!(f, "invalid {}: '{}'", field, value)
            }
            ConfigError::DuplicateHost(h) => {
                write!(f, "internal_host and extension_host are both '{}'", h)
            }
            ConfigError::ZeroPendingCapacity => {
                write!(f, "pending_capacity must be positive when pending_policy is buffer")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl RouterConfig {
    /// Defaults overridden by `PROTOROUTER_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Read a TOML file. Missing keys take their default value.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read router config: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse router config: {}", path.display()))
    }

    /// Parse TOML text
    ///
    /// # Errors
    ///
    /// Returns the TOML deserialisation error.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Override fields from `PROTOROUTER_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Override fields from any key/value source using the `PROTOROUTER_*` names
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PROTOROUTER_SCHEME") {
            self.scheme = v.trim().to_string();
        }
        if let Some(v) = lookup("PROTOROUTER_INTERNAL_HOST") {
            self.internal_host = v.trim().to_string();
        }
        if let Some(v) = lookup("PROTOROUTER_EXTENSION_HOST") {
            self.extension_host = v.trim().to_string();
        }
        if let Some(v) = lookup("PROTOROUTER_PENDING_POLICY") {
            match PendingPolicy::parse(&v) {
                Some(policy) => self.reporting.pending_policy = policy,
                None => warn!(value = %v, "Ignoring invalid PROTOROUTER_PENDING_POLICY"),
            }
        }
        if let Some(v) = lookup("PROTOROUTER_PENDING_CAPACITY") {
            match v.trim().parse::<usize>() {
                Ok(capacity) => self.reporting.pending_capacity = capacity,
                Err(_) => warn!(value = %v, "Ignoring invalid PROTOROUTER_PENDING_CAPACITY"),
            }
        }
        if let Some(v) = lookup("PROTOROUTER_BROADCAST_NOT_MATCHED") {
            match parse_bool(&v) {
                Some(flag) => self.reporting.broadcast_not_matched = flag,
                None => warn!(value = %v, "Ignoring invalid PROTOROUTER_BROADCAST_NOT_MATCHED"),
            }
        }
    }

    /// Check the configuration before building a router
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SCHEME.is_match(&self.scheme) {
            return Err(ConfigError::InvalidScheme(self.scheme.clone()));
        }
        check_host("internal_host", &self.internal_host)?;
        check_host("extension_host", &self.extension_host)?;
        if self.internal_host.eq_ignore_ascii_case(&self.extension_host) {
            return Err(ConfigError::DuplicateHost(self.internal_host.clone()));
        }
        if self.reporting.pending_policy == PendingPolicy::Buffer
            && self.reporting.pending_capacity == 0
        {
            return Err(ConfigError::ZeroPendingCapacity);
        }
        Ok(())
    }
}

fn check_host(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let bad = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@' | ':'));
    if bad {
        return Err(ConfigError::InvalidHost {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.scheme, "app");
        assert_eq!(config.internal_host, "app");
        assert_eq!(config.extension_host, "extension");
        assert_eq!(config.reporting.pending_policy, PendingPolicy::Buffer);
        assert_eq!(config.reporting.pending_capacity, 64);
        assert!(!config.reporting.broadcast_not_matched);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut config = RouterConfig::default();
        config.apply_overrides(lookup(&[
            ("PROTOROUTER_SCHEME", "lens"),
            ("PROTOROUTER_EXTENSION_HOST", "ext"),
            ("PROTOROUTER_PENDING_POLICY", "DROP"),
            ("PROTOROUTER_PENDING_CAPACITY", "8"),
            ("PROTOROUTER_BROADCAST_NOT_MATCHED", "yes"),
        ]));
        assert_eq!(config.scheme, "lens");
        assert_eq!(config.internal_host, "app");
        assert_eq!(config.extension_host, "ext");
        assert_eq!(config.reporting.pending_policy, PendingPolicy::Drop);
        assert_eq!(config.reporting.pending_capacity, 8);
        assert!(config.reporting.broadcast_not_matched);
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = RouterConfig::default();
        config.apply_overrides(lookup(&[
            ("PROTOROUTER_PENDING_POLICY", "sometimes"),
            ("PROTOROUTER_PENDING_CAPACITY", "-1"),
            ("PROTOROUTER_BROADCAST_NOT_MATCHED", "maybe"),
        ]));
        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = RouterConfig::from_toml(
            r#"
            scheme = "lens"

            [reporting]
            broadcast_not_matched = true
            "#,
        )
        .unwrap();
        assert_eq!(config.scheme, "lens");
        assert_eq!(config.internal_host, "app");
        assert_eq!(config.reporting.pending_capacity, 64);
        assert!(config.reporting.broadcast_not_matched);
    }

    #[test]
    fn test_from_toml_rejects_unknown_policy() {
        assert!(RouterConfig::from_toml("[reporting]\npending_policy = \"later\"").is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scheme = \"lens\"\ninternal_host = \"main\"").unwrap();
        let config = RouterConfig::load(file.path()).unwrap();
        assert_eq!(config.scheme, "lens");
        assert_eq!(config.internal_host, "main");
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = RouterConfig::load(Path::new("/nonexistent/protorouter.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read router config"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_scheme = RouterConfig {
            scheme: "1app".to_string(),
            ..RouterConfig::default()
        };
        assert_eq!(
            bad_scheme.validate(),
            Err(ConfigError::InvalidScheme("1app".to_string()))
        );

        let empty_host = RouterConfig {
            internal_host: String::new(),
            ..RouterConfig::default()
        };
        assert!(matches!(
            empty_host.validate(),
            Err(ConfigError::InvalidHost {
                field: "internal_host",
                ..
            })
        ));

        let same_hosts = RouterConfig {
            extension_host: "APP".to_string(),
            ..RouterConfig::default()
        };
        assert!(matches!(
            same_hosts.validate(),
            Err(ConfigError::DuplicateHost(_))
        ));

        let mut zero = RouterConfig::default();
        zero.reporting.pending_capacity = 0;
        assert_eq!(zero.validate(), Err(ConfigError::ZeroPendingCapacity));
        zero.reporting.pending_policy = PendingPolicy::Drop;
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}
