//! Response assembly for both request modes.
//!
//! Batch mode serializes the augmented dataset as CSV or XLSX. Single mode
//! produces a [`SinglePredictionResponse`] ready to be sent as JSON.

use std::str::FromStr;

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::compute::kernels::cast::cast;
use arrow::csv::WriterBuilder;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::pipeline::PredictionResult;
use crate::risk::RiskBand;

/// Success message of single-record responses
pub const SUCCESS_MESSAGE: &str = "Prediction successful";

/// File format of batch output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Excel,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" => Ok(Self::Excel),
            _ => Err(Error::UnsupportedOutputFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl OutputFormat {
    /// Parse an optional request parameter, defaulting to CSV
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedOutputFormat`] for anything but `csv` or
    /// `excel`
    pub fn from_param(value: Option<&str>) -> Result<Self> {
        value.map_or(Ok(Self::default()), str::parse)
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "predictions.csv",
            Self::Excel => "predictions.xlsx",
        }
    }

    /// Value of the `Content-Disposition` header for a download
    #[must_use]
    pub fn content_disposition(self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name())
    }
}

/// Serialize an augmented batch in `format`
pub fn write_batch(batch: &RecordBatch, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Csv => write_csv(batch),
        OutputFormat::Excel => write_excel(batch),
    }
}

fn write_csv(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().with_header(true).build(Vec::new());
    writer.write(batch)?;
    Ok(writer.into_inner())
}

fn cell(row: usize, col: usize) -> Result<(u32, u16)> {
    let row = u32::try_from(row).map_err(|_| XlsxError::RowColumnLimitError)?;
    let col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
    Ok((row, col))
}

fn write_excel_column(
    sheet: &mut Worksheet,
    col: usize,
    name: &str,
    column: &ArrayRef,
) -> Result<()> {
    match column.data_type() {
        DataType::Boolean => {
            let values = column
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| Error::malformed(name, 0, "boolean column downcast failed"))?;
            for (row, value) in values.iter().enumerate() {
                if let Some(value) = value {
                    let (r, c) = cell(row + 1, col)?;
                    sheet.write_boolean(r, c, value)?;
                }
            }
        }
        data_type if data_type.is_numeric() => {
            let converted = cast(column, &DataType::Float64)?;
            let values = converted
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| Error::malformed(name, 0, "numeric column downcast failed"))?;
            for (row, value) in values.iter().enumerate() {
                if let Some(value) = value {
                    let (r, c) = cell(row + 1, col)?;
                    sheet.write_number(r, c, value)?;
                }
            }
        }
        _ => {
            let converted = cast(column, &DataType::Utf8)?;
            let values = converted
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::malformed(name, 0, "text column downcast failed"))?;
            for (row, value) in values.iter().enumerate() {
                if let Some(value) = value {
                    let (r, c) = cell(row + 1, col)?;
                    sheet.write_string(r, c, value)?;
                }
            }
        }
    }
    Ok(())
}

fn write_excel(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    let schema = batch.schema();
    for (col, field) in schema.fields().iter().enumerate() {
        let (r, c) = cell(0, col)?;
        sheet.write_string_with_format(r, c, field.name(), &header_format)?;
        write_excel_column(sheet, col, field.name(), batch.column(col))?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// JSON body of a successful single-record prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinglePredictionResponse {
    pub message: &'static str,
    /// Percentage formatted with two decimals and a `%` suffix
    pub disease_probability: String,
    pub risk_band: RiskBand,
    pub recommendation: &'static str,
}

impl From<&PredictionResult> for SinglePredictionResponse {
    fn from(result: &PredictionResult) -> Self {
        let band = result
            .risk_band
            .unwrap_or_else(|| RiskBand::from_percentage(result.probability));
        Self {
            message: SUCCESS_MESSAGE,
            disease_probability: format!("{:.2}%", result.probability),
            risk_band: band,
            recommendation: band.advisory(),
        }
    }
}
