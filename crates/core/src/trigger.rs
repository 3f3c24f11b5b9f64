//! Raw trigger configuration as handed over by the host, plus the ordered
//! lookup every scaler uses to read dual-sourced fields.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ScalerError;

/// Per-request deadline when the host does not supply one.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_millis(3000);

/// Suffix of metadata keys that name an environment variable instead of
/// carrying the value itself (e.g. `passwordFromEnv = "ES_PASSWORD"`).
pub const FROM_ENV_SUFFIX: &str = "FromEnv";

/// Where a configuration value may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Secret-bearing parameters from the host's authentication reference.
    AuthParams,
    /// Plain trigger metadata.
    TriggerMetadata,
}

const AUTH_THEN_META: [ConfigSource; 2] =
    [ConfigSource::AuthParams, ConfigSource::TriggerMetadata];

/// The configuration a scaler is constructed from. Immutable once built.
#[derive(Clone)]
pub struct ScalerConfig {
    pub trigger_metadata: HashMap<String, String>,
    pub auth_params: HashMap<String, String>,
    /// Environment variable name -> value, resolved by the host.
    pub resolved_env: HashMap<String, String>,
    /// Deadline applied to every round trip the scaler makes.
    pub global_http_timeout: Duration,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            trigger_metadata: HashMap::new(),
            auth_params: HashMap::new(),
            resolved_env: HashMap::new(),
            global_http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ScalerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.trigger_metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_auth(mut self, key: &str, value: &str) -> Self {
        self.auth_params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.resolved_env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.global_http_timeout = timeout;
        self
    }

    fn source(&self, source: ConfigSource) -> &HashMap<String, String> {
        match source {
            ConfigSource::AuthParams => &self.auth_params,
            ConfigSource::TriggerMetadata => &self.trigger_metadata,
        }
    }

    /// Read `key` from a single source, trimmed. Blank values count as absent.
    pub fn get(&self, source: ConfigSource, key: &str) -> Option<&str> {
        self.get_raw(source, key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Read `key` byte for byte. Only an empty value counts as absent.
    ///
    /// Credentials go through here: surrounding whitespace is part of a secret.
    pub fn get_raw(&self, source: ConfigSource, key: &str) -> Option<&str> {
        self.source(source)
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Return the first non-blank value for `key`, trying `order` left to right.
    pub fn lookup(&self, key: &str, order: &[ConfigSource]) -> Option<&str> {
        order.iter().find_map(|source| self.get(*source, key))
    }

    /// Untrimmed counterpart of [`lookup`](Self::lookup).
    pub fn lookup_raw(&self, key: &str, order: &[ConfigSource]) -> Option<&str> {
        order.iter().find_map(|source| self.get_raw(*source, key))
    }

    /// Auth parameters win over trigger metadata.
    pub fn from_auth_or_meta(&self, key: &str) -> Option<&str> {
        self.lookup(key, &AUTH_THEN_META)
    }

    /// Auth parameters win over trigger metadata; the value is not trimmed.
    pub fn raw_from_auth_or_meta(&self, key: &str) -> Option<&str> {
        self.lookup_raw(key, &AUTH_THEN_META)
    }

    /// Like [`from_auth_or_meta`](Self::from_auth_or_meta) but a missing value
    /// is a configuration error naming `key`.
    pub fn require_from_auth_or_meta(&self, key: &str) -> Result<&str, ScalerError> {
        self.from_auth_or_meta(key)
            .ok_or_else(|| ScalerError::missing(key))
    }

    /// Follow an indirection: trigger metadata `key` names an environment
    /// variable, whose resolved value is returned.
    pub fn from_env_reference(&self, key: &str) -> Option<&str> {
        let var = self.get(ConfigSource::TriggerMetadata, key)?;
        self.resolved_env
            .get(var)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

// Auth parameter values are secrets; only their keys are printed.
impl fmt::Debug for ScalerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut auth_keys: Vec<&String> = self.auth_params.keys().collect();
        auth_keys.sort();
        let mut env_keys: Vec<&String> = self.resolved_env.keys().collect();
        env_keys.sort();
        f.debug_struct("ScalerConfig")
            .field("trigger_metadata", &self.trigger_metadata)
            .field("auth_params", &auth_keys)
            .field("resolved_env", &env_keys)
            .field("global_http_timeout", &self.global_http_timeout)
            .finish()
    }
}

// ── Trigger file ──────────────────────────────────────────────

/// On-disk trigger definition used by the worker binary.
///
/// ```toml
/// [metadata]
/// addresses = "http://localhost:9200"
/// index = "orders"
/// passwordFromEnv = "ES_PASSWORD"
///
/// [auth]
/// username = "elastic"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerFile {
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub auth: HashMap<String, String>,
}

impl TriggerFile {
    pub fn parse(text: &str) -> Result<Self, ScalerError> {
        toml::from_str(text).map_err(|e| ScalerError::config("trigger file", e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ScalerError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScalerError::config("trigger file", format!("{}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Build a [`ScalerConfig`], resolving every `*FromEnv` reference through
    /// `env`. Unset variables are simply left out of the resolved map.
    pub fn into_scaler_config<F>(self, env: F, timeout: Duration) -> ScalerConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut resolved_env = HashMap::new();
        for (key, var) in &self.metadata {
            if !key.ends_with(FROM_ENV_SUFFIX) {
                continue;
            }
            match env(var) {
                Some(value) => {
                    resolved_env.insert(var.clone(), value);
                }
                None => tracing::warn!(key = %key, var = %var, "referenced env var is not set"),
            }
        }

        ScalerConfig {
            trigger_metadata: self.metadata,
            auth_params: self.auth,
            resolved_env,
            global_http_timeout: timeout,
        }
    }
}
