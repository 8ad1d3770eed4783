//! Integration tests for the surge policy
//!
//! These tests exercise the table, snapshot format and engine together.

#![allow(clippy::float_cmp)]
#![allow(clippy::cast_possible_truncation)]

use ndarray::Array5;
use rand::{Rng, SeedableRng};
use surge_core::{RideContext, Weather};
use surge_rl::table::TABLE_SHAPE;
use surge_rl::{
    load_policy, LoadFailurePolicy, PriceTable, PricingPolicy, QTablePolicy, SurgeEngine,
};

const MULTIPLIERS: [f64; 5] = [1.0, 1.2, 1.4, 1.6, 1.8];

fn random_policy(seed: u64) -> QTablePolicy {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let values = Array5::from_shape_fn(TABLE_SHAPE, |_| rng.gen_range(-1.0..1.0));
    QTablePolicy::new(PriceTable::from_values(values).unwrap(), 0.1, 0.9)
}

/// Every valid input maps to one of the five discrete multipliers
#[test]
fn test_multiplier_always_discrete() {
    for seed in 0..4 {
        let policy = random_policy(seed);
        for hour in 0..=23 {
            for traffic in 1..=10 {
                for weather in 1..=3 {
                    for event in 0..=1 {
                        let m = policy.multiplier_for(hour, traffic, weather, event).unwrap();
                        assert!(
                            MULTIPLIERS.iter().any(|v| (v - m).abs() < 1e-9),
                            "multiplier {m} outside the action set"
                        );
                    }
                }
            }
        }
    }
}

/// Reference scenario: midday, moderate traffic, clear weather, no event
#[test]
fn test_reference_scenario_zero_table() {
    let engine = SurgeEngine::new(QTablePolicy::default());
    let ctx = RideContext::new(12, 5, Weather::Clear, false, Some(10.0)).unwrap();

    let decision = engine.decide(&ctx);
    assert_eq!(decision.multiplier, 1.0);

    let fare = surge_core::FareModel::distance()
        .fare(&ctx, decision.multiplier)
        .unwrap();
    assert_eq!(fare, 15.0);
}

/// A fallback table keeps serving the no-surge policy
#[test]
fn test_fallback_policy_serves_requests() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("surge_policy.json");
    std::fs::write(&path, "\u{0}\u{1}not a snapshot").unwrap();

    let loaded = load_policy(&path, LoadFailurePolicy::Fallback, 0.1, 0.9).unwrap();
    assert!(loaded.source.is_fallback());

    let engine = SurgeEngine::new(loaded.policy);
    for weather in Weather::ALL {
        let ctx = RideContext::new(8, 9, weather, true, Some(4.0)).unwrap();
        assert_eq!(engine.decide(&ctx).multiplier, 1.0);
    }
    assert_eq!(engine.stats().total_lookups, 3);
}

/// A halting loader refuses to start from a corrupt snapshot
#[test]
fn test_halt_policy_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("surge_policy.json");
    std::fs::write(&path, "[]").unwrap();

    let err = load_policy(&path, LoadFailurePolicy::Halt, 0.1, 0.9).unwrap_err();
    assert!(err.is_load_failure());
    assert!(err.to_string().contains("surge_policy.json"));
}

/// Saved random tables reproduce the same decisions after reload
#[test]
fn test_snapshot_preserves_decisions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trained.json");

    let policy = random_policy(42);
    policy.save(&path).unwrap();
    let reloaded = QTablePolicy::load(&path).unwrap();

    for hour in [0, 7, 12, 18, 23] {
        for traffic in [1, 5, 10] {
            let before = policy.multiplier_for(hour, traffic, 2, 1).unwrap();
            let after = reloaded.multiplier_for(hour, traffic, 2, 1).unwrap();
            assert_eq!(before, after);
        }
    }
}

/// Engines are shareable across threads
#[test]
fn test_engine_shared_across_threads() {
    let engine = std::sync::Arc::new(SurgeEngine::new(QTablePolicy::default()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                for hour in 0..24u8 {
                    engine
                        .multiplier_for(hour, (i % 10) + 1, 1, 0)
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = engine.stats();
    assert_eq!(stats.total_lookups, 96);
    assert_eq!(stats.action_counts[0], 96);
}
