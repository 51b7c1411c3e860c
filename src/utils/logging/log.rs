//! Logging utilities
//!
//! This module provides standardized logging functions for pipeline runs.

use std::time::Duration;

use crate::error::Error;

/// Log an operation start with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `rows` - Number of rows the operation will process
pub fn log_operation_start(operation: &str, rows: usize) {
    log::debug!("Starting {operation} for {rows} rows");
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `rows` - Number of rows processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, rows: usize, elapsed: Option<Duration>) {
    if let Some(duration) = elapsed {
        log::info!("Completed {operation} for {rows} rows in {duration:?}");
    } else {
        log::info!("Completed {operation} for {rows} rows");
    }
}

/// Log a failed operation at a level matching who is at fault
///
/// Client mistakes are logged as warnings, everything else as errors.
pub fn log_operation_failed(operation: &str, error: &Error) {
    if error.is_client_error() {
        log::warn!("Rejected {operation}: {error}");
    } else {
        log::error!("Failed {operation}: {error}");
    }
}
