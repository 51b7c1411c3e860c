//! Feature engineering: body-mass index derivation and feature assembly.
//!
//! Required columns are read from a `RecordBatch` as `f64`, `bmi` is
//! derived once per row, and the resulting columns are laid out row-major
//! in the order the classifier was trained on.
//!
//! Rounding is half away from zero at two decimals (see [`round2`]). The
//! same rule is used for the probability column of batch output.

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{Error, Result};
use crate::schema::{Feature, FeatureLayout};

/// Round to two decimal places, halves away from zero
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Body-mass index from weight in kilograms and height in centimetres
///
/// The caller guarantees `height_cm > 0`; [`derive`] enforces it.
#[must_use]
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round2(weight_kg / (height_m * height_m))
}

/// Per-row feature values for one request, held column-wise
///
/// Columns are indexed by [`Feature::index`]. Every column has the same
/// length.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumns {
    rows: usize,
    columns: Vec<Vec<f64>>,
}

impl DerivedColumns {
    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn column(&self, feature: Feature) -> &[f64] {
        &self.columns[feature.index()]
    }

    pub fn column_mut(&mut self, feature: Feature) -> &mut [f64] {
        &mut self.columns[feature.index()]
    }

    /// Lay the columns out row-major in `layout` order
    #[must_use]
    pub fn assemble(&self, layout: &FeatureLayout) -> FeatureMatrix {
        let width = layout.len();
        let mut data = Vec::with_capacity(self.rows * width);
        for row in 0..self.rows {
            data.extend(
                layout
                    .features()
                    .iter()
                    .map(|feature| self.columns[feature.index()][row]),
            );
        }
        FeatureMatrix { width, data }
    }
}

/// Row-major feature vectors for one request
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    width: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Number of features per row
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    /// The feature vector of row `idx`
    #[must_use]
    pub fn row(&self, idx: usize) -> &[f64] {
        &self.data[idx * self.width..(idx + 1) * self.width]
    }

    /// All rows, in order
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.width.max(1))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Read a required column as `f64`, casting numeric, boolean and textual
/// columns
///
/// # Errors
/// Returns [`Error::MalformedValue`] for the first null or unparseable cell
pub fn numeric_column(batch: &RecordBatch, column_name: &str) -> Result<Vec<f64>> {
    let idx = batch
        .schema()
        .index_of(column_name)
        .map_err(|_| Error::missing_fields([column_name]))?;
    let column = batch.column(idx);

    let converted: ArrayRef = if column.data_type() == &DataType::Float64 {
        column.clone()
    } else {
        debug!(
            "Converting column '{column_name}' from {:?} to Float64",
            column.data_type()
        );
        cast(column, &DataType::Float64)?
    };

    let values = converted
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::malformed(column_name, 0, "column is not numeric"))?;

    (0..values.len())
        .map(|row| {
            if !column.is_valid(row) {
                Err(Error::malformed(column_name, row, "null value"))
            } else if !values.is_valid(row) {
                Err(Error::malformed(column_name, row, "value is not numeric"))
            } else {
                Ok(values.value(row))
            }
        })
        .collect()
}

/// First row of `values` that fails `is_valid`, as an [`Error::InvalidValue`]
fn reject_invalid<F>(feature: Feature, values: &[f64], is_valid: F) -> Result<()>
where
    F: Fn(f64) -> bool,
{
    match values.iter().enumerate().find(|(_, v)| !is_valid(**v)) {
        Some((row, &value)) => Err(Error::InvalidValue {
            field: feature.name().to_string(),
            row,
            value,
        }),
        None => Ok(()),
    }
}

/// Derive every classifier feature for the rows of `batch`
///
/// The batch must already have passed column validation.
///
/// # Errors
/// Returns [`Error::InvalidValue`] when a required value is not finite, a
/// height is not positive, or a height is so small that `bmi` overflows.
/// Returns [`Error::MalformedValue`] for null or non-numeric cells.
pub fn derive(batch: &RecordBatch) -> Result<DerivedColumns> {
    let rows = batch.num_rows();
    let mut columns = vec![Vec::new(); Feature::ALL.len()];

    for feature in Feature::ALL.into_iter().filter(|f| f.is_required_input()) {
        let values = numeric_column(batch, feature.name())?;
        reject_invalid(feature, &values, f64::is_finite)?;
        columns[feature.index()] = values;
    }

    let heights = &columns[Feature::Height.index()];
    reject_invalid(Feature::Height, heights, |h| h > 0.0)?;

    let bmi: Vec<f64> = columns[Feature::Weight.index()]
        .iter()
        .zip(heights)
        .map(|(&weight, &height)| compute_bmi(weight, height))
        .collect();

    // Report an overflowing bmi against the height that caused it
    if let Some(row) = bmi.iter().position(|b| !b.is_finite()) {
        return Err(Error::InvalidValue {
            field: Feature::Height.name().to_string(),
            row,
            value: heights[row],
        });
    }
    columns[Feature::Bmi.index()] = bmi;

    debug!("Derived {} features for {rows} rows", Feature::ALL.len());
    Ok(DerivedColumns { rows, columns })
}
