//! JSON snapshots of the policy table and startup loading

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::Array5;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use surge_core::{Result, SurgeError};

use crate::algorithm::QTablePolicy;
use crate::table::PriceTable;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serialized form of a [`QTablePolicy`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub format_version: u32,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub values: Array5<f64>,
}

impl PolicySnapshot {
    pub fn from_policy(policy: &QTablePolicy) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            learning_rate: policy.learning_rate(),
            discount_factor: policy.discount_factor(),
            values: policy.table().values().clone(),
        }
    }

    fn into_policy(self, path: &str) -> Result<QTablePolicy> {
        let corrupt = |reason: String| SurgeError::ArtifactCorrupt {
            path: path.to_string(),
            reason,
        };

        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported snapshot format version {}",
                self.format_version
            )));
        }

        let table = PriceTable::from_values(self.values).map_err(|e| corrupt(e.to_string()))?;
        Ok(QTablePolicy::new(
            table,
            self.learning_rate,
            self.discount_factor,
        ))
    }
}

impl QTablePolicy {
    /// Load a policy from a JSON snapshot
    pub fn load(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        if !path.exists() {
            return Err(SurgeError::ArtifactMissing(path_str));
        }

        let contents = std::fs::read_to_string(path)?;
        let snapshot: PolicySnapshot =
            serde_json::from_str(&contents).map_err(|e| SurgeError::ArtifactCorrupt {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;

        snapshot.into_policy(&path_str)
    }

    /// Write the policy as a JSON snapshot
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&PolicySnapshot::from_policy(self))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// What to do when the persisted policy cannot be loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailurePolicy {
    /// Construct a fresh zero table and keep serving
    Fallback,
    /// Report a blocking error
    #[default]
    Halt,
}

impl fmt::Display for LoadFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailurePolicy::Fallback => write!(f, "fallback"),
            LoadFailurePolicy::Halt => write!(f, "halt"),
        }
    }
}

impl FromStr for LoadFailurePolicy {
    type Err = SurgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fallback" => Ok(LoadFailurePolicy::Fallback),
            "halt" => Ok(LoadFailurePolicy::Halt),
            other => Err(SurgeError::Config(format!(
                "unknown load failure policy '{other}' (expected fallback or halt)"
            ))),
        }
    }
}

/// Where the active policy came from
#[derive(Debug, Clone, PartialEq)]
pub enum PolicySource {
    Persisted(PathBuf),
    Fallback { reason: String },
}

impl PolicySource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, PolicySource::Fallback { .. })
    }
}

#[derive(Debug, Clone)]
pub struct LoadedPolicy {
    pub policy: QTablePolicy,
    pub source: PolicySource,
}

/// Load the persisted policy, applying `on_failure` when it is missing or corrupt.
///
/// `learning_rate` and `discount_factor` are only used for a fallback table.
/// IO errors other than a missing file are always returned.
pub fn load_policy(
    path: &Path,
    on_failure: LoadFailurePolicy,
    learning_rate: f64,
    discount_factor: f64,
) -> Result<LoadedPolicy> {
    match QTablePolicy::load(path) {
        Ok(policy) => {
            info!(
                "Loaded surge policy from {} ({} non-zero entries)",
                path.display(),
                policy.table().nonzero_count()
            );
            Ok(LoadedPolicy {
                policy,
                source: PolicySource::Persisted(path.to_path_buf()),
            })
        }
        Err(e) if e.is_load_failure() && on_failure == LoadFailurePolicy::Fallback => {
            warn!("{}; falling back to a fresh zero-initialized policy table", e);
            Ok(LoadedPolicy {
                policy: QTablePolicy::untrained(learning_rate, discount_factor),
                source: PolicySource::Fallback {
                    reason: e.to_string(),
                },
            })
        }
        Err(e) => Err(e),
    }
}
