//! Surge RL - Tabular reinforcement-learning surge multiplier policy
//!
//! This crate provides the discretized pricing state, the fixed-shape
//! Q-table of action values, its JSON snapshot format and the engine that
//! turns a ride context into a surge multiplier.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]

pub mod algorithm;
pub mod engine;
pub mod state;
pub mod store;
pub mod table;

pub use algorithm::{PricingPolicy, QTablePolicy};
pub use engine::{EngineStats, PriceDecision, SurgeEngine};
pub use state::{PriceAction, SurgeState};
pub use store::{load_policy, LoadFailurePolicy, LoadedPolicy, PolicySnapshot, PolicySource};
pub use table::PriceTable;
