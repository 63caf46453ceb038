//! Configuration types for reading telemetry and writing assets.

use asset_inventory_shared::Asset;

/// Qualifier prepended to every source pattern in cross-cluster mode.
pub const REMOTE_CLUSTER_PREFIX: &str = "remote_cluster";

const LOGS_PATTERNS: &[&str] = &["logs-*", "filebeat-*"];
const APM_PATTERNS: &[&str] = &["traces-*", "apm*", "metrics-apm*"];
const METRICS_PATTERNS: &[&str] = &["metrics-*", "metricbeat-*"];

/// Telemetry categories the collectors read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryCategory {
    Logs,
    Apm,
    Metrics,
}

/// Resolves source index patterns for a telemetry category.
///
/// In cross-cluster mode every pattern is qualified with the remote cluster
/// name so the query is routed through cross-cluster search.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexPatterns {
    /// Query the remote cluster instead of local indices.
    pub cross_cluster: bool,
}

impl IndexPatterns {
    pub fn local() -> Self {
        Self {
            cross_cluster: false,
        }
    }

    pub fn cross_cluster() -> Self {
        Self {
            cross_cluster: true,
        }
    }

    /// Index patterns for a single category.
    pub fn for_category(&self, category: TelemetryCategory) -> Vec<String> {
        let patterns = match category {
            TelemetryCategory::Logs => LOGS_PATTERNS,
            TelemetryCategory::Apm => APM_PATTERNS,
            TelemetryCategory::Metrics => METRICS_PATTERNS,
        };

        patterns
            .iter()
            .map(|pattern| {
                if self.cross_cluster {
                    format!("{}:{}", REMOTE_CLUSTER_PREFIX, pattern)
                } else {
                    pattern.to_string()
                }
            })
            .collect()
    }

    /// Index patterns for several categories, in the order given.
    pub fn for_categories(&self, categories: &[TelemetryCategory]) -> Vec<String> {
        categories
            .iter()
            .flat_map(|category| self.for_category(*category))
            .collect()
    }
}

/// Naming of the indices assets are written to:
/// `<prefix>-<asset type>-<environment suffix>`.
#[derive(Debug, Clone)]
pub struct AssetIndexNaming {
    pub prefix: String,
    pub suffix: String,
}

impl Default for AssetIndexNaming {
    fn default() -> Self {
        Self {
            prefix: "assets".to_string(),
            suffix: "default".to_string(),
        }
    }
}

impl AssetIndexNaming {
    /// Target index for an asset, addressed by its refined type.
    pub fn index_for(&self, asset: &Asset) -> String {
        format!("{}-{}-{}", self.prefix, asset.asset_type, self.suffix)
    }

    /// Pattern matching every asset index, used by the index template.
    pub fn pattern(&self) -> String {
        format!("{}*", self.prefix)
    }
}
