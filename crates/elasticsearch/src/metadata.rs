//! Trigger configuration for the Elasticsearch scaler.
//!
//! Everything is validated here, before any network I/O. A scaler is never
//! built from a partially valid configuration.

use std::fmt;

use esscale_core::text::{parse_bool, split_and_trim};
use esscale_core::trigger::ConfigSource;
use esscale_core::{ScalerConfig, ScalerError};

use crate::path::JsonPath;
use crate::query::parse_parameter;

const DEFAULT_UNSAFE_SSL: bool = false;

/// Validated scaler settings.
#[derive(Clone)]
pub struct ElasticsearchMetadata {
    /// Cluster endpoints, in configured order. Never empty.
    pub addresses: Vec<String>,
    /// Skip TLS certificate validation.
    pub unsafe_ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Target indexes, split on `;`. Never empty.
    pub indexes: Vec<String>,
    pub search_template_name: String,
    /// `key:value` tokens, split on `;`. Every non-empty token is well formed.
    pub parameters: Vec<String>,
    pub value_location: JsonPath,
    pub target_value: i64,
}

impl ElasticsearchMetadata {
    pub fn parse(config: &ScalerConfig) -> Result<Self, ScalerError> {
        let addresses = split_and_trim(config.require_from_auth_or_meta("addresses")?, ',');
        if addresses.iter().any(String::is_empty) {
            return Err(ScalerError::config("addresses", "empty address in list"));
        }

        let unsafe_ssl = match config.get(ConfigSource::TriggerMetadata, "unsafeSsl") {
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                ScalerError::config("unsafeSsl", format!("'{raw}' is not a boolean"))
            })?,
            None => DEFAULT_UNSAFE_SSL,
        };

        let username = config.raw_from_auth_or_meta("username").map(str::to_string);
        let password = config
            .get_raw(ConfigSource::AuthParams, "password")
            .or_else(|| config.from_env_reference("passwordFromEnv"))
            .map(str::to_string);

        let index = config
            .from_auth_or_meta("index")
            .or_else(|| config.from_auth_or_meta("indexes"))
            .ok_or_else(|| ScalerError::missing("index"))?;
        let indexes = split_and_trim(index, ';');
        if indexes.iter().all(String::is_empty) {
            return Err(ScalerError::missing("index"));
        }

        let search_template_name = config
            .require_from_auth_or_meta("searchTemplateName")?
            .to_string();

        let parameters = match config.get(ConfigSource::TriggerMetadata, "parameters") {
            Some(raw) => split_and_trim(raw, ';'),
            None => Vec::new(),
        };
        for token in parameters.iter().filter(|t| !t.is_empty()) {
            parse_parameter(token)?;
        }

        let value_location = config.require_from_auth_or_meta("valueLocation")?;
        let value_location = JsonPath::parse(value_location)
            .map_err(|e| ScalerError::config("valueLocation", e.to_string()))?;

        let target_value = config.require_from_auth_or_meta("targetValue")?;
        let target_value = target_value.parse::<i64>().map_err(|e| {
            ScalerError::config("targetValue", format!("'{target_value}': {e}"))
        })?;

        Ok(Self {
            addresses,
            unsafe_ssl,
            username,
            password,
            indexes,
            search_template_name,
            parameters,
            value_location,
            target_value,
        })
    }
}

impl fmt::Debug for ElasticsearchMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticsearchMetadata")
            .field("addresses", &self.addresses)
            .field("unsafe_ssl", &self.unsafe_ssl)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("indexes", &self.indexes)
            .field("search_template_name", &self.search_template_name)
            .field("parameters", &self.parameters)
            .field("value_location", &self.value_location.as_str())
            .field("target_value", &self.target_value)
            .finish()
    }
}
