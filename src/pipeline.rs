//! The prediction pipeline shared by single-record and batch requests.
//!
//! Both modes lower their input to a `RecordBatch` and run the same stages:
//! validate, derive, scale, assemble, infer. Single mode adds risk banding;
//! batch mode appends the probability column to the uploaded rows.

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::features::derive;
use crate::inference::InferenceEngine;
use crate::models::{Dataset, HealthRecord};
use crate::risk::RiskBand;
use crate::scaler::Scaler;
use crate::utils::logging::{log_operation_complete, log_operation_failed, log_operation_start};
use crate::validate::{validate_columns, validate_record};

/// Outcome of scoring one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    /// Positive-class probability as a percentage in [0, 100]
    pub probability: f64,
    pub risk_band: Option<RiskBand>,
}

/// Runs requests through the scoring stages
///
/// Cheap to clone; clones share the loaded classifier.
#[derive(Debug, Clone)]
pub struct Predictor {
    engine: InferenceEngine,
    scaler: Scaler,
}

impl Predictor {
    #[must_use]
    pub const fn new(engine: InferenceEngine, scaler: Scaler) -> Self {
        Self { engine, scaler }
    }

    /// Load the classifier and scaler described by `config`
    ///
    /// # Errors
    /// Any failure here is fatal to startup
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let engine = InferenceEngine::load(&config.model_path)?;
        let scaler = Scaler::from_mode(config.scaling, config.scaler_params_path.as_deref())?;
        log::info!(
            "Predictor ready: {} features, scaling {:?}",
            engine.layout().len(),
            scaler.mode()
        );
        Ok(Self::new(engine, scaler))
    }

    #[must_use]
    pub const fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    #[must_use]
    pub const fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    /// Probability percentages for every row of `batch`, unrounded
    ///
    /// # Errors
    /// Validation errors are raised before any value is read
    pub fn score_batch(&self, batch: &RecordBatch) -> Result<Vec<f64>> {
        let schema = batch.schema();
        validate_columns(schema.fields().iter().map(|f| f.name().as_str()))?;

        let mut derived = derive(batch)?;
        self.scaler.transform(&mut derived);
        let matrix = derived.assemble(self.engine.layout());

        let probabilities = self.engine.predict_proba(&matrix)?;
        Ok(probabilities.into_iter().map(|p| p * 100.0).collect())
    }

    /// Score one record supplied as a JSON object
    pub fn score_record(&self, payload: &Value) -> Result<PredictionResult> {
        let start = Instant::now();
        log_operation_start("single prediction", 1);

        let result = validate_record(payload)
            .and_then(HealthRecord::from_json)
            .and_then(|record| HealthRecord::to_record_batch(&[record]))
            .and_then(|batch| self.score_batch(&batch));

        let probability = result
            .and_then(|probabilities| {
                probabilities.first().copied().ok_or_else(|| {
                    Error::Inference("Classifier returned no probability".to_string())
                })
            })
            .inspect_err(|e| log_operation_failed("single prediction", e))?;

        log_operation_complete("single prediction", 1, Some(start.elapsed()));
        Ok(PredictionResult {
            probability,
            risk_band: Some(RiskBand::from_percentage(probability)),
        })
    }

    /// Score every row of an uploaded dataset
    ///
    /// # Returns
    /// The original rows with the probability column appended
    pub fn score_dataset(&self, dataset: &Dataset) -> Result<RecordBatch> {
        let start = Instant::now();
        let rows = dataset.num_rows();
        log_operation_start("batch prediction", rows);

        let output = self
            .score_batch(dataset.batch())
            .and_then(|probabilities| dataset.with_probabilities(&probabilities))
            .inspect_err(|e| log_operation_failed("batch prediction", e))?;

        log_operation_complete("batch prediction", rows, Some(start.elapsed()));
        Ok(output)
    }
}
