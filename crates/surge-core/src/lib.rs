//! Surge Core - Ride context, fare models, demand estimation and shared errors
//!
//! This crate provides the foundational types used across all Surge components.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

pub mod context;
pub mod demand;
pub mod error;
pub mod fare;
pub mod util;

pub use context::{RideContext, Weather};
pub use demand::{DemandEstimator, FeatureLayout, LinearDemandModel};
pub use error::{Result, SurgeError};
pub use fare::{FareModel, SurgeTier};
