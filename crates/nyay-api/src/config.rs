//! # Service Configuration
//!
//! [`AppConfig`] is assembled in two layers:
//!
//! 1. An optional YAML file named by `NYAY_CONFIG`.
//! 2. Environment overrides: `PORT`, `AUTH_TOKEN`, `NYAY_STAGE_POLICY`,
//!    `NYAY_RATE_LIMIT`, `NYAY_METRICS_ENABLED`, `DATABASE_URL`.
//!
//! Anything unset falls back to [`AppConfig::default`]. A value that is set
//! but malformed is an error, never silently ignored.
//!
//! ```yaml
//! port: 8080
//! stage_policy: adjacent   # or: any
//! rate_limit:
//!   max_requests: 1000
//!   window_secs: 60
//! metrics_enabled: true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use nyay_state::MovePolicy;

use crate::middleware::rate_limit::RateLimitConfig;

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`FileConfig`].
    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment variable held an unusable value.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration.
///
/// Custom `Debug` redacts the auth token and the database URL (which may
/// embed a password).
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. `None` disables authentication.
    pub auth_token: Option<String>,
    /// Which explicit stage writes `PATCH /stage` accepts.
    pub stage_policy: MovePolicy,
    /// Per-client request budget.
    pub rate_limit: RateLimitConfig,
    /// Maximum accepted request body, in bytes.
    pub body_limit_bytes: usize,
    /// Install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,
    /// Postgres connection string. `None` runs in-memory only.
    pub database_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("stage_policy", &self.stage_policy)
            .field("rate_limit", &self.rate_limit)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .field("metrics_enabled", &self.metrics_enabled)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            stage_policy: MovePolicy::default(),
            rate_limit: RateLimitConfig::default(),
            body_limit_bytes: 64 * 1024,
            metrics_enabled: true,
            database_url: None,
        }
    }
}

/// On-disk shape of the YAML config. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub auth_token: Option<String>,
    pub stage_policy: Option<MovePolicy>,
    pub rate_limit: Option<RateLimitConfig>,
    pub body_limit_bytes: Option<usize>,
    pub metrics_enabled: Option<bool>,
    pub database_url: Option<String>,
}

impl AppConfig {
    /// Load from `NYAY_CONFIG` (if set) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("NYAY_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults overlaid with the YAML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::default();
        config.merge(file);
        Ok(config)
    }

    fn merge(&mut self, file: FileConfig) {
        if let Some(port) = file.port {
            self.port = port;
        }
        if file.auth_token.is_some() {
            self.auth_token = file.auth_token;
        }
        if let Some(policy) = file.stage_policy {
            self.stage_policy = policy;
        }
        if let Some(rate_limit) = file.rate_limit {
            self.rate_limit = rate_limit;
        }
        if let Some(limit) = file.body_limit_bytes {
            self.body_limit_bytes = limit;
        }
        if let Some(enabled) = file.metrics_enabled {
            self.metrics_enabled = enabled;
        }
        if file.database_url.is_some() {
            self.database_url = file.database_url;
        }
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PORT") {
            self.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = get("AUTH_TOKEN") {
            self.auth_token = Some(v);
        }
        if let Some(v) = get("NYAY_STAGE_POLICY") {
            self.stage_policy = v.parse().map_err(|e: nyay_core::ValidationError| {
                ConfigError::InvalidValue {
                    key: "NYAY_STAGE_POLICY",
                    value: v.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(v) = get("NYAY_RATE_LIMIT") {
            self.rate_limit.max_requests = parse_env("NYAY_RATE_LIMIT", &v)?;
        }
        if let Some(v) = get("NYAY_METRICS_ENABLED") {
            self.metrics_enabled = parse_bool("NYAY_METRICS_ENABLED", &v)?;
        }
        if let Some(v) = get("DATABASE_URL") {
            self.database_url = Some(v);
        }
        Ok(())
    }
}

fn parse_env<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert_eq!(config.stage_policy, MovePolicy::Adjacent);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            auth_token: Some("super-secret".to_string()),
            database_url: Some("postgres://u:pw@db/nyay".to_string()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("pw@db"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port: 9090\nstage_policy: any\nrate_limit:\n  max_requests: 5\n  window_secs: 10\nmetrics_enabled: false"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.stage_policy, MovePolicy::Any);
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 10);
        assert!(!config.metrics_enabled);
        assert_eq!(config.body_limit_bytes, AppConfig::default().body_limit_bytes);
    }

    #[test]
    fn unknown_yaml_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prot: 9090").unwrap();
        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::from_file(Path::new("/nonexistent/nyay.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn env_overrides_file() {
        let mut config = AppConfig {
            port: 9090,
            ..AppConfig::default()
        };
        config
            .apply_env(env(&[
                ("PORT", "7070"),
                ("AUTH_TOKEN", "tok"),
                ("NYAY_STAGE_POLICY", "ANY"),
                ("NYAY_RATE_LIMIT", "42"),
                ("NYAY_METRICS_ENABLED", "false"),
            ]))
            .unwrap();
        assert_eq!(config.port, 7070);
        assert_eq!(config.auth_token.as_deref(), Some("tok"));
        assert_eq!(config.stage_policy, MovePolicy::Any);
        assert_eq!(config.rate_limit.max_requests, 42);
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("AUTH_TOKEN", ""), ("PORT", " ")])).unwrap();
        assert!(config.auth_token.is_none());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn malformed_env_values_are_errors() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));

        let err = config
            .apply_env(env(&[("NYAY_STAGE_POLICY", "strict")]))
            .unwrap_err();
        assert!(err.to_string().contains("NYAY_STAGE_POLICY"));
    }
}
