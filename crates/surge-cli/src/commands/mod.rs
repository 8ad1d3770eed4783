//! CLI command modules

pub mod config;
pub mod http;
pub mod policy;
pub mod quote;
pub mod status;
