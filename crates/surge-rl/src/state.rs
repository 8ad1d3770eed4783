//! Discretized pricing state and surge multiplier actions

use serde::{Deserialize, Serialize};

use surge_core::context::{MAX_HOUR, MAX_TRAFFIC_LEVEL, MIN_TRAFFIC_LEVEL};
use surge_core::{Result, RideContext, SurgeError, Weather};

pub const HOUR_BINS: usize = 24;
pub const TRAFFIC_BINS: usize = 10;
pub const WEATHER_BINS: usize = Weather::COUNT;
pub const EVENT_BINS: usize = 2;

/// Number of discrete price actions
pub const ACTION_COUNT: usize = 5;

/// Multiplier of action 0
pub const BASE_MULTIPLIER: f64 = 1.0;
/// Multiplier increment between consecutive actions
pub const MULTIPLIER_STEP: f64 = 0.2;

/// Discretized state used to index the price table.
///
/// All four coordinates are zero-based bin indices that are guaranteed to be
/// in range for a table of shape (24, 10, 3, 2, 5). Deserialization goes
/// through the same bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StateBins")]
pub struct SurgeState {
    hour: usize,
    traffic: usize,
    weather: usize,
    event: usize,
}

impl SurgeState {
    /// Build a state from raw model inputs.
    ///
    /// `traffic_level` is 1-based (1..=10) and `weather_code` is 1-based (1..=3);
    /// both are shifted to zero-based bins.
    pub fn from_inputs(hour: u8, traffic_level: u8, weather_code: u8, event_flag: u8) -> Result<Self> {
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
        let weather = Weather::from_code(weather_code)?;
        if event_flag > 1 {
            return Err(SurgeError::out_of_range("event_flag", event_flag, "0..=1"));
        }

        Ok(Self {
            hour: usize::from(hour),
            traffic: usize::from(traffic_level - 1),
            weather: usize::from(weather.code() - 1),
            event: usize::from(event_flag),
        })
    }

    pub fn hour(&self) -> usize {
        self.hour
    }

    pub fn traffic(&self) -> usize {
        self.traffic
    }

    pub fn weather(&self) -> usize {
        self.weather
    }

    pub fn event(&self) -> usize {
        self.event
    }

    /// Index into the first four table axes
    pub fn index(&self) -> [usize; 4] {
        [self.hour, self.traffic, self.weather, self.event]
    }
}

/// Unchecked wire form of [`SurgeState`]
#[derive(Deserialize)]
struct StateBins {
    hour: usize,
    traffic: usize,
    weather: usize,
    event: usize,
}

impl TryFrom<StateBins> for SurgeState {
    type Error = SurgeError;

    fn try_from(bins: StateBins) -> Result<Self> {
        let axes = [
            ("hour", bins.hour, HOUR_BINS, "0..24"),
            ("traffic", bins.traffic, TRAFFIC_BINS, "0..10"),
            ("weather", bins.weather, WEATHER_BINS, "0..3"),
            ("event", bins.event, EVENT_BINS, "0..2"),
        ];
        for (field, value, len, expected) in axes {
            if value >= len {
                return Err(SurgeError::out_of_range(field, value, expected));
            }
        }

        Ok(Self {
            hour: bins.hour,
            traffic: bins.traffic,
            weather: bins.weather,
            event: bins.event,
        })
    }
}

impl From<&RideContext> for SurgeState {
    fn from(ctx: &RideContext) -> Self {
        // RideContext is validated at construction, so the shifts cannot underflow
        Self {
            hour: usize::from(ctx.hour()),
            traffic: usize::from(ctx.traffic_level() - 1),
            weather: usize::from(ctx.weather().code() - 1),
            event: usize::from(ctx.event_flag()),
        }
    }
}

/// One of the five discrete price actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize")]
pub struct PriceAction(usize);

impl TryFrom<usize> for PriceAction {
    type Error = SurgeError;

    fn try_from(index: usize) -> Result<Self> {
        Self::from_index(index).ok_or_else(|| SurgeError::out_of_range("action", index, "0..5"))
    }
}

impl PriceAction {
    /// Action chosen by an untrained (all-zero) table
    pub const NO_SURGE: PriceAction = PriceAction(0);

    pub fn from_index(index: usize) -> Option<Self> {
        (index < ACTION_COUNT).then_some(Self(index))
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// Surge multiplier for this action: `1.0 + 0.2 × index`
    pub fn multiplier(self) -> f64 {
        BASE_MULTIPLIER + MULTIPLIER_STEP * self.0 as f64
    }

    /// All actions in index order
    pub fn all() -> impl Iterator<Item = PriceAction> {
        (0..ACTION_COUNT).map(PriceAction)
    }
}
