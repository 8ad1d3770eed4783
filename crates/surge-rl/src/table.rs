//! Dense Q-table of price action values

use ndarray::{s, Array5, ArrayView1};
use thiserror::Error;
use tracing::warn;

use crate::state::{
    PriceAction, SurgeState, ACTION_COUNT, EVENT_BINS, HOUR_BINS, TRAFFIC_BINS, WEATHER_BINS,
};

/// Shape of the table: hour × traffic × weather × event × action
pub const TABLE_SHAPE: [usize; 5] = [HOUR_BINS, TRAFFIC_BINS, WEATHER_BINS, EVENT_BINS, ACTION_COUNT];

/// Older snapshots allocated four weather slots for three categories
pub const LEGACY_TABLE_SHAPE: [usize; 5] = [HOUR_BINS, TRAFFIC_BINS, 4, EVENT_BINS, ACTION_COUNT];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("expected table shape {expected:?}, found {found:?}")]
    Shape {
        expected: [usize; 5],
        found: Vec<usize>,
    },

    #[error("table contains NaN action values")]
    NaN,
}

/// Read-only table of action values indexed by [`SurgeState`]
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    values: Array5<f64>,
}

impl PriceTable {
    /// Fresh, untrained table with every action value at zero
    pub fn zeros() -> Self {
        Self {
            values: Array5::zeros(TABLE_SHAPE),
        }
    }

    /// Wrap an existing array of action values.
    ///
    /// Arrays in the legacy layout have their unused fourth weather slot dropped.
    pub fn from_values(values: Array5<f64>) -> Result<Self, TableError> {
        let values = if values.shape() == TABLE_SHAPE.as_slice() {
            values
        } else if values.shape() == LEGACY_TABLE_SHAPE.as_slice() {
            warn!("Dropping unused weather slot from legacy price table");
            values.slice(s![.., .., 0..WEATHER_BINS, .., ..]).to_owned()
        } else {
            return Err(TableError::Shape {
                expected: TABLE_SHAPE,
                found: values.shape().to_vec(),
            });
        };

        if values.iter().any(|v| v.is_nan()) {
            return Err(TableError::NaN);
        }

        Ok(Self { values })
    }

    pub fn values(&self) -> &Array5<f64> {
        &self.values
    }

    /// Action values for one state
    pub fn action_values(&self, state: &SurgeState) -> ArrayView1<'_, f64> {
        let [hour, traffic, weather, event] = state.index();
        self.values.slice(s![hour, traffic, weather, event, ..])
    }

    /// Greedy action for a state; ties go to the lowest action index
    pub fn best_action(&self, state: &SurgeState) -> PriceAction {
        let index = argmax_first(self.action_values(state).iter().copied());
        PriceAction::from_index(index).unwrap_or(PriceAction::NO_SURGE)
    }

    /// Number of non-zero action values
    pub fn nonzero_count(&self) -> usize {
        self.values.iter().filter(|v| **v != 0.0).count()
    }

    /// True when no action value was ever set
    pub fn is_untrained(&self) -> bool {
        self.nonzero_count() == 0
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Index of the first maximum. NaN never compares greater, so it never wins.
fn argmax_first(values: impl Iterator<Item = f64>) -> usize {
    let mut best_index = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, value) in values.enumerate() {
        if value > best_value {
            best_value = value;
            best_index = i;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_table_shape() {
        let table = PriceTable::zeros();
        assert_eq!(table.values().shape(), &TABLE_SHAPE);
        assert_eq!(table.values().len(), 24 * 10 * 3 * 2 * 5);
        assert!(table.is_untrained());
    }

    #[test]
    fn test_zero_table_picks_first_action() {
        let table = PriceTable::zeros();
        let state = SurgeState::from_inputs(12, 5, 1, 0).unwrap();
        assert_eq!(table.best_action(&state), PriceAction::NO_SURGE);
    }

    #[test]
    fn test_best_action_uses_state_slice() {
        let mut values = Array5::zeros(TABLE_SHAPE);
        values[[18, 9, 2, 1, 3]] = 5.0;
        values[[18, 9, 2, 1, 4]] = 1.0;
        let table = PriceTable::from_values(values).unwrap();

        let hot = SurgeState::from_inputs(18, 10, 3, 1).unwrap();
        assert_eq!(table.best_action(&hot).index(), 3);

        let cold = SurgeState::from_inputs(18, 10, 3, 0).unwrap();
        assert_eq!(table.best_action(&cold), PriceAction::NO_SURGE);
        assert_eq!(table.nonzero_count(), 2);
    }

    #[test]
    fn test_argmax_ties_resolve_to_lowest_index() {
        assert_eq!(argmax_first([0.0, 0.0, 0.0].into_iter()), 0);
        assert_eq!(argmax_first([1.0, 3.0, 3.0, 2.0].into_iter()), 1);
        assert_eq!(argmax_first([-2.0, -1.0, -1.0].into_iter()), 1);
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(argmax_first([f64::NAN, 0.5, 0.1].into_iter()), 1);
        assert_eq!(argmax_first([0.2, f64::NAN, 0.1].into_iter()), 0);
    }

    #[test]
    fn test_legacy_shape_is_trimmed() {
        let mut values = Array5::zeros(LEGACY_TABLE_SHAPE);
        values[[7, 3, 1, 0, 2]] = 1.0;
        // Unused slot is discarded
        values[[7, 3, 3, 0, 4]] = 9.0;

        let table = PriceTable::from_values(values).unwrap();
        assert_eq!(table.values().shape(), &TABLE_SHAPE);
        assert_eq!(table.nonzero_count(), 1);

        let state = SurgeState::from_inputs(7, 4, 2, 0).unwrap();
        assert_eq!(table.best_action(&state).index(), 2);
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let values = Array5::<f64>::zeros([24, 10, 3, 2, 4]);
        assert!(matches!(
            PriceTable::from_values(values),
            Err(TableError::Shape { .. })
        ));
    }

    #[test]
    fn test_nan_rejected() {
        let mut values = Array5::zeros(TABLE_SHAPE);
        values[[0, 0, 0, 0, 0]] = f64::NAN;
        assert_eq!(PriceTable::from_values(values), Err(TableError::NaN));
    }
}
