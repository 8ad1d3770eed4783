//! Surge daemon - Pricing HTTP service
//!
//! Loads the demand model and the surge policy table once at startup and
//! serves quotes over a JSON API.

// Pedantic clippy allows - intentional design decisions for this crate
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::unused_async)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod daemon;
pub mod error;
pub mod metrics;
pub mod pricing;
pub mod validation;

pub use config::Config;
pub use daemon::{create_router, DaemonState, SurgeDaemon};
pub use pricing::{PricingService, Quote};
