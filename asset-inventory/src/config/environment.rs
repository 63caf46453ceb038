//! Environment switches.

use std::env;
use std::time::Duration;

use asset_inventory_repository::opensearch::{ConnectionSettings, DEFAULT_REQUEST_TIMEOUT};
use asset_inventory_repository::IndexPatterns;

use super::clusters::ClusterProfile;
use crate::EtlError;

pub const ES_USERNAME: &str = "ES_USERNAME";
pub const ES_PASSWORD: &str = "ES_PASSWORD";
pub const ES_IS_CCS: &str = "ES_IS_CCS";
pub const READ_TLS_REJECT_UNAUTHORIZED: &str = "ASSETS_READ_ES_TLS_REJECT_UNAUTHORIZED";
pub const REQUEST_TIMEOUT_SECS: &str = "ASSETS_REQUEST_TIMEOUT_SECS";

/// Settings read from the process environment.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    username: String,
    password: String,
    /// Qualify source patterns for cross-cluster search.
    pub cross_cluster: bool,
    /// Validate the read cluster's TLS certificate.
    pub validate_read_certificates: bool,
    pub request_timeout: Duration,
}

impl EnvSettings {
    /// Read the settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `ES_USERNAME`, `ES_PASSWORD`: fallback credentials (required)
    /// - `ES_IS_CCS`: `true` to read through cross-cluster search
    /// - `ASSETS_READ_ES_TLS_REJECT_UNAUTHORIZED`: `false` to accept any certificate from the read cluster
    /// - `ASSETS_REQUEST_TIMEOUT_SECS`: per-request deadline (default: 60)
    pub fn from_env() -> Result<Self, EtlError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, EtlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).filter(|value| !value.is_empty()).ok_or_else(|| {
                EtlError::config(format!(
                    "Please provide username and password via {} and {}",
                    ES_USERNAME, ES_PASSWORD
                ))
            })
        };

        let username = required(ES_USERNAME)?;
        let password = required(ES_PASSWORD)?;

        let request_timeout = match lookup(REQUEST_TIMEOUT_SECS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| {
                    EtlError::config(format!("Invalid {} '{}': {}", REQUEST_TIMEOUT_SECS, raw, e))
                })?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            username,
            password,
            cross_cluster: lookup(ES_IS_CCS).as_deref() == Some("true"),
            validate_read_certificates: lookup(READ_TLS_REJECT_UNAUTHORIZED).as_deref()
                != Some("false"),
            request_timeout,
        })
    }

    pub fn index_patterns(&self) -> IndexPatterns {
        IndexPatterns {
            cross_cluster: self.cross_cluster,
        }
    }

    /// Connection to the cluster telemetry is read from.
    pub fn reader_settings(&self, profile: &ClusterProfile) -> ConnectionSettings {
        let mut settings = self.connection(profile);
        settings.validate_certificates = self.validate_read_certificates;
        settings
    }

    /// Connection to the cluster assets are written to.
    pub fn writer_settings(&self, profile: &ClusterProfile) -> ConnectionSettings {
        self.connection(profile)
    }

    /// Profile credentials take precedence over the environment.
    fn connection(&self, profile: &ClusterProfile) -> ConnectionSettings {
        let (username, password) = profile
            .credentials()
            .unwrap_or_else(|| (self.username.clone(), self.password.clone()));

        let mut settings =
            ConnectionSettings::new(profile.node.as_str()).with_credentials(username, password);
        settings.request_timeout = self.request_timeout;
        settings
    }
}
