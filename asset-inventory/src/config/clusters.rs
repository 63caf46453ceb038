//! Named cluster profiles.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::EtlError;

/// Connection details for one named cluster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClusterProfile {
    /// Cluster URL.
    pub node: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ClusterProfile {
    /// Username and password, if the profile carries both.
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        }
    }
}

/// The cluster profile file: `{ "clusters": { "<name>": { "node": ... } } }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClustersConfig {
    pub clusters: HashMap<String, ClusterProfile>,
}

impl ClustersConfig {
    pub fn from_json(json: &str) -> Result<Self, EtlError> {
        serde_json::from_str(json)
            .map_err(|e| EtlError::config(format!("Invalid cluster config: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EtlError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// The read and write profiles of a run. `write` defaults to `read`.
    ///
    /// Both names are checked before anything connects.
    pub fn resolve(
        &self,
        read: &str,
        write: Option<&str>,
    ) -> Result<(&ClusterProfile, &ClusterProfile), EtlError> {
        let read_profile = self.profile("--read", read)?;
        let write_profile = match write {
            Some(write) => self.profile("--write", write)?,
            None => read_profile,
        };
        Ok((read_profile, write_profile))
    }

    fn profile(&self, flag: &str, name: &str) -> Result<&ClusterProfile, EtlError> {
        self.clusters.get(name).ok_or_else(|| {
            let mut known: Vec<&str> = self.clusters.keys().map(String::as_str).collect();
            known.sort_unstable();
            EtlError::config(format!(
                "Invalid value for {}: '{}' is not a cluster in the config (known: {})",
                flag,
                name,
                known.join(", ")
            ))
        })
    }
}
