//! Error types for Surge

use thiserror::Error;

/// Main error type for Surge
#[derive(Error, Debug)]
pub enum SurgeError {
    #[error("Invalid {field}: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Unknown weather condition: {0}")]
    UnknownWeather(String),

    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("Model artifact not found: {0}")]
    ArtifactMissing(String),

    #[error("Corrupt model artifact {path}: {reason}")]
    ArtifactCorrupt { path: String, reason: String },

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SurgeError {
    /// Build a range-validation error for a numeric input
    pub fn out_of_range(
        field: &'static str,
        value: impl std::fmt::Display,
        expected: &'static str,
    ) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            expected,
        }
    }

    /// Stable label used in API responses and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } | Self::UnknownWeather(_) | Self::MissingInput(_) => {
                "validation_error"
            }
            Self::ArtifactMissing(_) => "artifact_missing",
            Self::ArtifactCorrupt { .. } => "artifact_corrupt",
            Self::Prediction(_) => "prediction_error",
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
            Self::Io(_) => "io_error",
        }
    }

    /// Whether the error comes from loading a persisted model
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::ArtifactMissing(_) | Self::ArtifactCorrupt { .. }
        )
    }

    /// Whether the error was caused by caller input rather than the models
    pub fn is_invalid_input(&self) -> bool {
        self.kind() == "validation_error"
    }

    /// Human-readable hint shown next to the error
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::ArtifactMissing(_) => Some(
                "Create the artifact (`surge policy init` for the policy table) or point \
                 models.policy_path / models.demand_path at an existing file",
            ),
            Self::ArtifactCorrupt { .. } => Some(
                "Regenerate the artifact; it does not match the expected format or shape",
            ),
            Self::Prediction(_) => Some(
                "Check that the demand model was trained on the configured feature layout \
                 (pricing.distance_feature) and that its coefficients are finite",
            ),
            Self::MissingInput(_) => {
                Some("Provide distance_km or switch pricing.fare_mode to \"flat\"")
            }
            _ => None,
        }
    }
}

/// Result type alias for Surge operations
pub type Result<T> = std::result::Result<T, SurgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = SurgeError::out_of_range("hour", 24, "0..=23");
        assert_eq!(err.to_string(), "Invalid hour: 24 (expected 0..=23)");
        assert_eq!(err.kind(), "validation_error");
        assert!(err.is_invalid_input());
        assert!(!err.is_load_failure());
    }

    #[test]
    fn test_load_failures() {
        assert!(SurgeError::ArtifactMissing("x.json".into()).is_load_failure());
        assert!(SurgeError::ArtifactCorrupt {
            path: "x.json".into(),
            reason: "bad shape".into()
        }
        .is_load_failure());
        assert!(!SurgeError::Prediction("nan".into()).is_load_failure());
    }

    #[test]
    fn test_remediation_hints() {
        assert!(SurgeError::Prediction("shape".into()).remediation().is_some());
        assert!(SurgeError::ArtifactMissing("x".into()).remediation().is_some());
        assert!(SurgeError::Config("x".into()).remediation().is_none());
    }
}
