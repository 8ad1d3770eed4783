//! Demand estimator contract and the linear model shipped with Surge

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SurgeError};

/// Feature vector layout fed to the demand estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureLayout {
    /// `[hour, traffic, weather_code, event_flag]`
    Basic,
    /// `[hour, traffic, weather_code, event_flag, distance_km]`
    WithDistance,
}

impl FeatureLayout {
    pub fn from_distance_flag(include_distance: bool) -> Self {
        if include_distance {
            FeatureLayout::WithDistance
        } else {
            FeatureLayout::Basic
        }
    }

    /// Number of features in the layout
    pub fn len(self) -> usize {
        match self {
            FeatureLayout::Basic => 4,
            FeatureLayout::WithDistance => 5,
        }
    }
}

/// Pre-trained demand regressor, treated as a black box
pub trait DemandEstimator: Send + Sync {
    /// Estimator name
    fn name(&self) -> &str;

    /// Number of features the estimator was fitted on
    fn feature_count(&self) -> usize;

    /// Predict ride demand from a fixed-order feature vector
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

/// Linear regression artifact: `demand = intercept + Σ coefficients[i] * features[i]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearDemandModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearDemandModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Result<Self> {
        let model = Self {
            intercept,
            coefficients,
        };
        model.check().map_err(|reason| SurgeError::ArtifactCorrupt {
            path: "<memory>".to_string(),
            reason,
        })?;
        Ok(model)
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("model has no coefficients".to_string());
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("model parameters must be finite".to_string());
        }
        Ok(())
    }

    /// Load the model from a JSON artifact
    pub fn load(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        if !path.exists() {
            return Err(SurgeError::ArtifactMissing(path_str));
        }

        let contents = std::fs::read_to_string(path)?;
        let model: Self =
            serde_json::from_str(&contents).map_err(|e| SurgeError::ArtifactCorrupt {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;
        model.check().map_err(|reason| SurgeError::ArtifactCorrupt {
            path: path_str.clone(),
            reason,
        })?;

        info!(
            "Loaded demand model from {} ({} features)",
            path_str,
            model.coefficients.len()
        );
        Ok(model)
    }

    /// Write the model as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl DemandEstimator for LinearDemandModel {
    fn name(&self) -> &str {
        "linear"
    }

    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(SurgeError::Prediction(format!(
                "feature shape mismatch: expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        let demand = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>();

        if !demand.is_finite() {
            return Err(SurgeError::Prediction(format!(
                "non-finite demand estimate for features {:?}",
                features
            )));
        }

        debug!("Demand estimate {:.3} for {:?}", demand, features);
        Ok(demand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LinearDemandModel {
        LinearDemandModel::new(20.0, vec![1.5, 4.0, 6.0, 25.0]).unwrap()
    }

    #[test]
    fn test_layout_len() {
        assert_eq!(FeatureLayout::Basic.len(), 4);
        assert_eq!(FeatureLayout::WithDistance.len(), 5);
        assert_eq!(
            FeatureLayout::from_distance_flag(true),
            FeatureLayout::WithDistance
        );
        assert_eq!(FeatureLayout::from_distance_flag(false), FeatureLayout::Basic);
    }

    #[test]
    fn test_predict() {
        let demand = model().predict(&[12.0, 5.0, 1.0, 0.0]).unwrap();
        // 20 + 18 + 20 + 6 + 0
        assert!((demand - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_shape_mismatch() {
        let err = model().predict(&[12.0, 5.0, 1.0, 0.0, 10.0]).unwrap_err();
        assert!(matches!(err, SurgeError::Prediction(_)));
        assert!(err.to_string().contains("expected 4 features, got 5"));
    }

    #[test]
    fn test_invalid_model_rejected() {
        assert!(LinearDemandModel::new(1.0, vec![]).is_err());
        assert!(LinearDemandModel::new(f64::NAN, vec![1.0]).is_err());
        assert!(LinearDemandModel::new(1.0, vec![f64::INFINITY]).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("demand.json");

        model().save(&path).unwrap();
        let loaded = LinearDemandModel::load(&path).unwrap();
        assert_eq!(loaded, model());
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("nope.json");
        assert!(matches!(
            LinearDemandModel::load(&missing),
            Err(SurgeError::ArtifactMissing(_))
        ));

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{ not json").unwrap();
        assert!(matches!(
            LinearDemandModel::load(&corrupt),
            Err(SurgeError::ArtifactCorrupt { .. })
        ));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{"intercept": 1.0, "coefficients": []}"#).unwrap();
        assert!(matches!(
            LinearDemandModel::load(&empty),
            Err(SurgeError::ArtifactCorrupt { .. })
        ));
    }
}
