//! Ride context collected from the caller

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::demand::FeatureLayout;
use crate::error::{Result, SurgeError};

pub const MAX_HOUR: u8 = 23;
pub const MIN_TRAFFIC_LEVEL: u8 = 1;
pub const MAX_TRAFFIC_LEVEL: u8 = 10;
pub const MIN_DISTANCE_KM: f64 = 0.5;
pub const MAX_DISTANCE_KM: f64 = 100.0;

/// Weather condition reported for the pickup area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[serde(alias = "Clear")]
    Clear,
    #[serde(alias = "Rain")]
    Rain,
    #[serde(alias = "Storm")]
    Storm,
}

impl Weather {
    /// Number of weather categories
    pub const COUNT: usize = 3;

    pub const ALL: [Weather; 3] = [Weather::Clear, Weather::Rain, Weather::Storm];

    /// Model encoding (1-based)
    pub fn code(self) -> u8 {
        match self {
            Weather::Clear => 1,
            Weather::Rain => 2,
            Weather::Storm => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Weather::Clear),
            2 => Ok(Weather::Rain),
            3 => Ok(Weather::Storm),
            other => Err(SurgeError::out_of_range("weather_code", other, "1..=3")),
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weather::Clear => write!(f, "Clear"),
            Weather::Rain => write!(f, "Rain"),
            Weather::Storm => write!(f, "Storm"),
        }
    }
}

impl FromStr for Weather {
    type Err = SurgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "clear" | "1" => Ok(Weather::Clear),
            "rain" | "2" => Ok(Weather::Rain),
            "storm" | "3" => Ok(Weather::Storm),
            _ => Err(SurgeError::UnknownWeather(s.to_string())),
        }
    }
}

/// Validated ride request context.
///
/// Every field is range-checked at construction, so downstream consumers
/// (policy lookup, feature encoding, fare computation) never see values
/// outside the accepted domains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideContext {
    hour: u8,
    traffic_level: u8,
    weather: Weather,
    event_nearby: bool,
    distance_km: Option<f64>,
}

impl RideContext {
    pub fn new(
        hour: u8,
        traffic_level: u8,
        weather: Weather,
        event_nearby: bool,
        distance_km: Option<f64>,
    ) -> Result<Self> {
        if hour > MAX_HOUR {
            return Err(SurgeError::out_of_range("hour", hour, "0..=23"));
        }
        if !(MIN_TRAFFIC_LEVEL..=MAX_TRAFFIC_LEVEL).contains(&traffic_level) {
            return Err(SurgeError::out_of_range(
                "traffic_level",
                traffic_level,
                "1..=10",
            ));
        }
        if let Some(distance) = distance_km {
            if !distance.is_finite() || !(MIN_DISTANCE_KM..=MAX_DISTANCE_KM).contains(&distance) {
                return Err(SurgeError::out_of_range(
                    "distance_km",
                    distance,
                    "0.5..=100.0",
                ));
            }
        }

        Ok(Self {
            hour,
            traffic_level,
            weather,
            event_nearby,
            distance_km,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn traffic_level(&self) -> u8 {
        self.traffic_level
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    pub fn event_nearby(&self) -> bool {
        self.event_nearby
    }

    /// Event flag as the models encode it (No = 0, Yes = 1)
    pub fn event_flag(&self) -> u8 {
        u8::from(self.event_nearby)
    }

    pub fn distance_km(&self) -> Option<f64> {
        self.distance_km
    }

    /// Encode the context as the fixed-order feature vector the demand model expects
    pub fn features(&self, layout: FeatureLayout) -> Result<Vec<f64>> {
        let mut features = vec![
            f64::from(self.hour),
            f64::from(self.traffic_level),
            f64::from(self.weather.code()),
            f64::from(self.event_flag()),
        ];

        if layout == FeatureLayout::WithDistance {
            let distance = self
                .distance_km
                .ok_or(SurgeError::MissingInput("distance_km"))?;
            features.push(distance);
        }

        Ok(features)
    }
}
