//! Utility functions shared across the service

pub mod logging;
