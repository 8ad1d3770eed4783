//! Pricing policy trait and the tabular Q-learning policy

use surge_core::Result;

use crate::state::{PriceAction, SurgeState};
use crate::table::PriceTable;

pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.9;

/// Trait for surge pricing policies
pub trait PricingPolicy: Send + Sync {
    /// Policy name
    fn name(&self) -> &str;

    /// Pick the price action for a state
    fn select_action(&self, state: &SurgeState) -> PriceAction;

    /// Get policy parameters as JSON
    fn get_params(&self) -> serde_json::Value;

    /// Surge multiplier for raw model inputs.
    ///
    /// `traffic_level` is 1..=10, `weather_code` is 1..=3 and `event_flag` is 0 or 1.
    fn multiplier_for(
        &self,
        hour: u8,
        traffic_level: u8,
        weather_code: u8,
        event_flag: u8,
    ) -> Result<f64> {
        let state = SurgeState::from_inputs(hour, traffic_level, weather_code, event_flag)?;
        Ok(self.select_action(&state).multiplier())
    }
}

/// Greedy policy over a tabular Q-function.
///
/// The learning rate and discount factor are carried for snapshots and
/// reporting only; no update rule reads them.
#[derive(Debug, Clone)]
pub struct QTablePolicy {
    table: PriceTable,
    learning_rate: f64,
    discount_factor: f64,
}

impl QTablePolicy {
    pub fn new(table: PriceTable, learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            table,
            learning_rate,
            discount_factor,
        }
    }

    /// Untrained policy backed by an all-zero table
    pub fn untrained(learning_rate: f64, discount_factor: f64) -> Self {
        Self::new(PriceTable::zeros(), learning_rate, discount_factor)
    }

    pub fn table(&self) -> &PriceTable {
        &self.table
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }
}

impl PricingPolicy for QTablePolicy {
    fn name(&self) -> &str {
        "q_table"
    }

    fn select_action(&self, state: &SurgeState) -> PriceAction {
        self.table.best_action(state)
    }

    fn get_params(&self) -> serde_json::Value {
        serde_json::json!({
            "learning_rate": self.learning_rate,
            "discount_factor": self.discount_factor,
            "table_shape": self.table.values().shape(),
            "nonzero_entries": self.table.nonzero_count(),
            "untrained": self.table.is_untrained()
        })
    }
}

impl Default for QTablePolicy {
    fn default() -> Self {
        Self::untrained(DEFAULT_LEARNING_RATE, DEFAULT_DISCOUNT_FACTOR)
    }
}
