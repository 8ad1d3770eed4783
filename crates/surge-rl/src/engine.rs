//! Surge engine - Coordinates policy lookups and tracks decisions

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use surge_core::{Result, RideContext};

use crate::algorithm::PricingPolicy;
use crate::state::{PriceAction, SurgeState, ACTION_COUNT};

/// Outcome of a single policy lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceDecision {
    pub state: SurgeState,
    pub action: PriceAction,
    pub multiplier: f64,
}

/// Engine owning the read-only pricing policy.
///
/// Lookups take `&self`; counters are atomic so one engine can be shared
/// across request handlers without a lock.
pub struct SurgeEngine {
    policy: Box<dyn PricingPolicy>,
    action_counts: [AtomicU64; ACTION_COUNT],
}

impl SurgeEngine {
    /// Create a new engine around a policy
    pub fn new(policy: impl PricingPolicy + 'static) -> Self {
        Self::from_boxed(Box::new(policy))
    }

    pub fn from_boxed(policy: Box<dyn PricingPolicy>) -> Self {
        Self {
            policy,
            action_counts: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Get the policy name
    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Decide the surge multiplier for a validated ride context
    pub fn decide(&self, ctx: &RideContext) -> PriceDecision {
        self.decide_state(SurgeState::from(ctx))
    }

    /// Decide the surge multiplier for raw model inputs
    pub fn multiplier_for(
        &self,
        hour: u8,
        traffic_level: u8,
        weather_code: u8,
        event_flag: u8,
    ) -> Result<PriceDecision> {
        let state = SurgeState::from_inputs(hour, traffic_level, weather_code, event_flag)?;
        Ok(self.decide_state(state))
    }

    fn decide_state(&self, state: SurgeState) -> PriceDecision {
        let action = self.policy.select_action(&state);

        self.action_counts[action.index()].fetch_add(1, Ordering::Relaxed);

        debug!(
            "Policy {} chose action {} for state {:?}",
            self.policy.name(),
            action.index(),
            state.index()
        );

        PriceDecision {
            state,
            action,
            multiplier: action.multiplier(),
        }
    }

    /// Get policy parameters
    pub fn params(&self) -> serde_json::Value {
        self.policy.get_params()
    }

    /// Get statistics
    pub fn stats(&self) -> EngineStats {
        // Total is summed from the same reads, so it never trails a bucket
        let action_counts: Vec<u64> = self
            .action_counts
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect();
        let total_lookups: u64 = action_counts.iter().sum();
        let surged = total_lookups - action_counts[PriceAction::NO_SURGE.index()];

        EngineStats {
            total_lookups,
            action_counts,
            surge_rate: if total_lookups > 0 {
                surged as f64 / total_lookups as f64
            } else {
                0.0
            },
            policy: self.policy.name().to_string(),
        }
    }
}

/// Engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_lookups: u64,
    pub action_counts: Vec<u64>,
    pub surge_rate: f64,
    pub policy: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::QTablePolicy;
    use crate::table::{PriceTable, TABLE_SHAPE};
    use ndarray::Array5;
    use surge_core::Weather;

    fn surging_engine() -> SurgeEngine {
        let mut values = Array5::zeros(TABLE_SHAPE);
        // Storm + event at 18:00 with heavy traffic surges to 1.8
        values[[18, 9, 2, 1, 4]] = 1.0;
        SurgeEngine::new(QTablePolicy::new(
            PriceTable::from_values(values).unwrap(),
            0.1,
            0.9,
        ))
    }

    #[test]
    fn test_engine_creation() {
        let engine = SurgeEngine::new(QTablePolicy::default());
        assert_eq!(engine.policy_name(), "q_table");
        assert_eq!(engine.stats().total_lookups, 0);
        assert_eq!(engine.stats().surge_rate, 0.0);
    }

    #[test]
    fn test_decide_zero_table() {
        let engine = SurgeEngine::new(QTablePolicy::default());
        let ctx = RideContext::new(12, 5, Weather::Clear, false, Some(10.0)).unwrap();

        let decision = engine.decide(&ctx);
        assert_eq!(decision.action, PriceAction::NO_SURGE);
        assert_eq!(decision.multiplier, 1.0);
        assert_eq!(decision.state.index(), [12, 4, 0, 0]);
    }

    #[test]
    fn test_decide_surging_state() {
        let engine = surging_engine();
        let ctx = RideContext::new(18, 10, Weather::Storm, true, None).unwrap();

        let decision = engine.decide(&ctx);
        assert_eq!(decision.action.index(), 4);
        assert!((decision.multiplier - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_for_validates() {
        let engine = SurgeEngine::new(QTablePolicy::default());
        assert!(engine.multiplier_for(12, 5, 1, 0).is_ok());
        assert!(engine.multiplier_for(12, 5, 0, 0).is_err());
        // Failed lookups are not counted
        assert_eq!(engine.stats().total_lookups, 1);
    }

    #[test]
    fn test_stats() {
        let engine = surging_engine();

        for _ in 0..3 {
            engine.multiplier_for(18, 10, 3, 1).unwrap();
        }
        engine.multiplier_for(3, 1, 1, 0).unwrap();

        let stats = engine.stats();
        assert_eq!(stats.total_lookups, 4);
        assert_eq!(stats.action_counts, vec![1, 0, 0, 0, 3]);
        assert_eq!(stats.surge_rate, 0.75);
        assert_eq!(stats.policy, "q_table");
    }

    #[test]
    fn test_stats_during_concurrent_lookups() {
        let engine = std::sync::Arc::new(SurgeEngine::new(QTablePolicy::default()));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    for _ in 0..5_000 {
                        engine.multiplier_for(12, 5, 1, 0).unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..2_000 {
            let stats = engine.stats();
            assert_eq!(stats.total_lookups, stats.action_counts.iter().sum::<u64>());
            assert!(stats.surge_rate >= 0.0 && stats.surge_rate <= 1.0);
        }

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(engine.stats().total_lookups, 20_000);
    }

    #[test]
    fn test_params() {
        let engine = SurgeEngine::new(QTablePolicy::default());
        let params = engine.params();
        assert!(!params.is_null());
        assert_eq!(params["untrained"], true);
    }
}
