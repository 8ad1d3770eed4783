//! Fare computation and surge alert tiers

use serde::{Deserialize, Serialize};

use crate::context::RideContext;
use crate::error::{Result, SurgeError};

/// Base fare of the flat fare model
pub const DEFAULT_BASE_FARE: f64 = 10.0;
/// Per-kilometre rate of the distance-aware fare model
pub const DEFAULT_RATE_PER_KM: f64 = 1.5;

/// Multipliers above this are reported as high demand
pub const HIGH_SURGE_THRESHOLD: f64 = 1.5;
/// Multipliers above this (and not high) are reported as moderate surge
pub const MODERATE_SURGE_THRESHOLD: f64 = 1.2;

/// Round to two decimal places, exact halves going to the even cent
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// How the final fare is derived from the surge multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FareModel {
    /// `base_fare × multiplier`
    Flat { base_fare: f64 },
    /// `distance_km × rate_per_km × multiplier`
    Distance { rate_per_km: f64 },
}

impl FareModel {
    pub fn flat() -> Self {
        FareModel::Flat {
            base_fare: DEFAULT_BASE_FARE,
        }
    }

    pub fn distance() -> Self {
        FareModel::Distance {
            rate_per_km: DEFAULT_RATE_PER_KM,
        }
    }

    pub fn requires_distance(&self) -> bool {
        matches!(self, FareModel::Distance { .. })
    }

    /// Final fare rounded to cents
    pub fn fare(&self, ctx: &RideContext, multiplier: f64) -> Result<f64> {
        let raw = match *self {
            FareModel::Flat { base_fare } => base_fare * multiplier,
            FareModel::Distance { rate_per_km } => {
                let distance = ctx
                    .distance_km()
                    .ok_or(SurgeError::MissingInput("distance_km"))?;
                distance * rate_per_km * multiplier
            }
        };
        Ok(round_cents(raw))
    }
}

impl Default for FareModel {
    fn default() -> Self {
        Self::distance()
    }
}

/// Tiered surge alert shown with every quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeTier {
    High,
    Moderate,
    Normal,
}

impl SurgeTier {
    pub fn from_multiplier(multiplier: f64) -> Self {
        if multiplier > HIGH_SURGE_THRESHOLD {
            SurgeTier::High
        } else if multiplier > MODERATE_SURGE_THRESHOLD {
            SurgeTier::Moderate
        } else {
            SurgeTier::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SurgeTier::High => "high",
            SurgeTier::Moderate => "moderate",
            SurgeTier::Normal => "normal",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SurgeTier::High => "High demand! Prices are surging",
            SurgeTier::Moderate => "Moderate surge pricing applied.",
            SurgeTier::Normal => "Normal pricing. No surge!",
        }
    }
}

impl std::fmt::Display for SurgeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Weather;

    fn ctx(distance: Option<f64>) -> RideContext {
        RideContext::new(12, 5, Weather::Clear, false, distance).unwrap()
    }

    #[test]
    fn test_distance_fare() {
        let model = FareModel::distance();
        assert_eq!(model.fare(&ctx(Some(10.0)), 1.0).unwrap(), 15.0);
        assert_eq!(model.fare(&ctx(Some(10.0)), 1.4).unwrap(), 21.0);
        assert_eq!(model.fare(&ctx(Some(3.3)), 1.2).unwrap(), 5.94);
        // 0.75 km: 1.125 rounds half to even
        assert_eq!(model.fare(&ctx(Some(0.75)), 1.0).unwrap(), 1.12);
    }

    #[test]
    fn test_distance_fare_requires_distance() {
        let err = FareModel::distance().fare(&ctx(None), 1.0).unwrap_err();
        assert!(matches!(err, SurgeError::MissingInput("distance_km")));
    }

    #[test]
    fn test_flat_fare_ignores_distance() {
        let model = FareModel::flat();
        assert_eq!(model.fare(&ctx(None), 1.0).unwrap(), 10.0);
        assert_eq!(model.fare(&ctx(Some(42.0)), 1.6).unwrap(), 16.0);
        assert_eq!(model.fare(&ctx(None), 1.8).unwrap(), 18.0);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(15.0), 15.0);
        assert_eq!(round_cents(1.234), 1.23);
        assert_eq!(round_cents(1.236), 1.24);
        // Exact binary halves
        assert_eq!(round_cents(1.125), 1.12);
        assert_eq!(round_cents(1.375), 1.38);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(SurgeTier::from_multiplier(1.8), SurgeTier::High);
        assert_eq!(SurgeTier::from_multiplier(1.6), SurgeTier::High);
        assert_eq!(SurgeTier::from_multiplier(1.4), SurgeTier::Moderate);
        assert_eq!(SurgeTier::from_multiplier(1.2), SurgeTier::Normal);
        assert_eq!(SurgeTier::from_multiplier(1.0), SurgeTier::Normal);
        // Boundaries are exclusive
        assert_eq!(SurgeTier::from_multiplier(1.5), SurgeTier::Moderate);
    }

    #[test]
    fn test_fare_model_serde() {
        let json = serde_json::to_string(&FareModel::flat()).unwrap();
        assert_eq!(json, r#"{"mode":"flat","base_fare":10.0}"#);

        let parsed: FareModel =
            serde_json::from_str(r#"{"mode":"distance","rate_per_km":2.0}"#).unwrap();
        assert_eq!(parsed, FareModel::Distance { rate_per_km: 2.0 });
    }
}
