//! # sp-observability
//!
//! Structured logging setup for the stakeholder portal crates.

pub mod logging;

pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
