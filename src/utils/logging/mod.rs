//! Logging utilities
//!
//! This module provides helpers that keep request log lines uniform.

pub mod log;

// Re-export commonly used functions for convenience
pub use log::{log_operation_complete, log_operation_failed, log_operation_start};
