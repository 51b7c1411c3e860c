//! Domain models for health records
//!
//! This module contains the per-request entities of the scoring pipeline:
//! a single health record supplied directly by a caller and a tabular
//! dataset uploaded for batch scoring.

pub mod dataset;
pub mod health_record;

// Re-export commonly used types
pub use dataset::Dataset;
pub use health_record::HealthRecord;
