//! Configuration loading for the Surge daemon

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

use surge_core::fare::{DEFAULT_BASE_FARE, DEFAULT_RATE_PER_KM};
use surge_core::{FareModel, FeatureLayout, SurgeError};
use surge_rl::algorithm::{DEFAULT_DISCOUNT_FACTOR, DEFAULT_LEARNING_RATE};
use surge_rl::LoadFailurePolicy;

/// Upper bound for the cosmetic pre-compute delay
pub const MAX_COMPUTE_DELAY_MS: u64 = 10_000;

/// Configuration for the daemon
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub daemon: DaemonConfig,
    pub models: ModelsConfig,
    pub pricing: PricingConfig,
    pub learning: LearningConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub bind_address: String,
    pub log_level: String,
    /// Empty means stdout only
    pub log_file: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9300".to_string(),
            log_level: "info".to_string(),
            log_file: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub policy_path: PathBuf,
    pub demand_path: PathBuf,
    pub on_policy_load_failure: LoadFailurePolicy,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            policy_path: PathBuf::from("models/surge_policy.json"),
            demand_path: PathBuf::from("models/demand_model.json"),
            on_policy_load_failure: LoadFailurePolicy::Halt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FareMode {
    Flat,
    Distance,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub fare_mode: FareMode,
    pub base_fare: f64,
    pub rate_per_km: f64,
    /// Feed distance_km to the demand model as a fifth feature
    pub distance_feature: bool,
    pub compute_delay_ms: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            fare_mode: FareMode::Distance,
            base_fare: DEFAULT_BASE_FARE,
            rate_per_km: DEFAULT_RATE_PER_KM,
            distance_feature: true,
            compute_delay_ms: 0,
        }
    }
}

impl PricingConfig {
    pub fn fare_model(&self) -> FareModel {
        match self.fare_mode {
            FareMode::Flat => FareModel::Flat {
                base_fare: self.base_fare,
            },
            FareMode::Distance => FareModel::Distance {
                rate_per_km: self.rate_per_km,
            },
        }
    }

    pub fn feature_layout(&self) -> FeatureLayout {
        FeatureLayout::from_distance_flag(self.distance_feature)
    }

    pub fn compute_delay(&self) -> Duration {
        Duration::from_millis(self.compute_delay_ms)
    }

    pub fn validate(&self) -> Result<(), SurgeError> {
        if !self.base_fare.is_finite() || self.base_fare <= 0.0 {
            return Err(SurgeError::Config(format!(
                "pricing.base_fare must be positive, got {}",
                self.base_fare
            )));
        }
        if !self.rate_per_km.is_finite() || self.rate_per_km <= 0.0 {
            return Err(SurgeError::Config(format!(
                "pricing.rate_per_km must be positive, got {}",
                self.rate_per_km
            )));
        }
        if self.compute_delay_ms > MAX_COMPUTE_DELAY_MS {
            return Err(SurgeError::Config(format!(
                "pricing.compute_delay_ms must be at most {MAX_COMPUTE_DELAY_MS}, got {}",
                self.compute_delay_ms
            )));
        }
        Ok(())
    }
}

/// Placeholders carried into freshly constructed policy tables
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub learning_rate: f64,
    pub discount_factor: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        Self::load_from(Self::find_config_file().as_deref())
    }

    /// Load configuration from an explicit file (if any) and environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = path {
            tracing::info!("Loading config from: {:?}", path);
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        } else {
            tracing::info!("No config file found, using defaults");
        }

        // Add environment variables with SURGE_ prefix
        builder = builder.add_source(
            Environment::with_prefix("SURGE")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config
            .pricing
            .validate()
            .context("Invalid pricing configuration")?;

        Ok(config)
    }

    /// Find the configuration file
    fn find_config_file() -> Option<PathBuf> {
        // Check in order: SURGE_CONFIG env, ./surge.toml, ~/.config/surge/surge.toml
        if let Ok(path) = std::env::var("SURGE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("surge.toml");
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("surge").join("surge.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }
}
