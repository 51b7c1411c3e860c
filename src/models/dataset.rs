//! Uploaded tabular dataset
//!
//! A [`Dataset`] keeps the uploaded rows exactly as decoded, including
//! columns the classifier never looks at, so that batch output can echo
//! them back untouched.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result};
use crate::features::round2;
use crate::schema::PROBABILITY_COLUMN;

/// An ordered collection of health records held as one Arrow batch
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    #[must_use]
    pub const fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Names of all columns in upload order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Append the probability column to a copy of the original batch
    ///
    /// # Arguments
    /// * `probabilities` - One percentage per row, in row order
    ///
    /// # Returns
    /// The original columns followed by [`PROBABILITY_COLUMN`], rounded to
    /// two decimals
    pub fn with_probabilities(&self, probabilities: &[f64]) -> Result<RecordBatch> {
        if probabilities.len() != self.num_rows() {
            return Err(Error::Inference(format!(
                "Got {} probabilities for {} rows",
                probabilities.len(),
                self.num_rows()
            )));
        }

        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        fields.push(Field::new(PROBABILITY_COLUMN, DataType::Float64, false));

        let mut columns: Vec<ArrayRef> = self.batch.columns().to_vec();
        let rounded: Float64Array = probabilities.iter().copied().map(round2).collect();
        columns.push(Arc::new(rounded));

        let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
        Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
    }
}

impl From<RecordBatch> for Dataset {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}
