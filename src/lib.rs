//! Cardiovascular disease-risk scoring.
//!
//! Tabular health records are validated, enriched with BMI, rescaled and
//! passed to a pre-trained classifier. Single records come back with a
//! probability percentage and a risk band; uploaded datasets come back with
//! a probability column appended to every row.

pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod response;
pub mod risk;
pub mod scaler;
pub mod schema;
pub mod server;
pub mod utils;
pub mod validate;

// Core types
pub use config::ServiceConfig;
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{PredictionResult, Predictor};

// Data model
pub use models::{Dataset, HealthRecord};
pub use schema::{Feature, FeatureLayout};

// Pipeline stages
pub use classifier::{Classifier, ObliviousForest, load_classifier};
pub use inference::InferenceEngine;
pub use risk::RiskBand;
pub use scaler::{Scaler, ScalingMode};

// Input and output
pub use reader::{InputFormat, read_dataset};
pub use response::{OutputFormat, SinglePredictionResponse, write_batch};

// Arrow types
pub use arrow::record_batch::RecordBatch;
