//! Run configuration: cluster profiles, environment switches and wiring.

mod clusters;
mod dependencies;
mod environment;

pub use clusters::{ClusterProfile, ClustersConfig};
pub use dependencies::{Dependencies, RunOptions, DEFAULT_CONFIG_PATH};
pub use environment::EnvSettings;
