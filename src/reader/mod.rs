//! Module for decoding uploaded batch files into a [`Dataset`].
//!
//! The format is picked from the upload's file name. CSV schemas are
//! inferred from the whole file, XLSX uses the first worksheet with its
//! first row as header, and Parquet keeps the file's own schema.

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::{Error, Result};
use crate::models::Dataset;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Excel,
    Parquet,
}

impl InputFormat {
    /// Pick the format from an upload's file name, ignoring case
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedInputFormat`] for unknown suffixes
    pub fn from_file_name(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(Self::Csv)
        } else if lower.ends_with(".xlsx") {
            Ok(Self::Excel)
        } else if lower.ends_with(".parquet") {
            Ok(Self::Parquet)
        } else {
            Err(Error::UnsupportedInputFormat {
                name: name.to_string(),
            })
        }
    }
}

/// Decode an uploaded file
///
/// # Arguments
/// * `format` - Format of the upload
/// * `contents` - The complete file contents
///
/// # Returns
/// All rows of the file as one [`Dataset`], in file order
pub fn read_dataset(format: InputFormat, contents: Bytes) -> Result<Dataset> {
    let size = contents.len();
    let batch = match format {
        InputFormat::Csv => read_csv(contents)?,
        InputFormat::Excel => read_excel(contents)?,
        InputFormat::Parquet => read_parquet(contents)?,
    };
    info!(
        "Decoded {format:?} upload of {size} bytes into {} rows and {} columns",
        batch.num_rows(),
        batch.num_columns()
    );
    Ok(Dataset::new(batch))
}

fn combine(schema: SchemaRef, batches: &[RecordBatch]) -> Result<RecordBatch> {
    debug!("Combining {} record batches", batches.len());
    Ok(concat_batches(&schema, batches)?)
}

fn read_csv(contents: Bytes) -> Result<RecordBatch> {
    let format = Format::default().with_header(true);
    let (schema, records) = format.infer_schema(Cursor::new(contents.as_ref()), None)?;
    debug!("Inferred CSV schema from {records} records");

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(Cursor::new(contents))?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    combine(schema, &batches)
}

fn read_parquet(contents: Bytes) -> Result<RecordBatch> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(contents)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    combine(schema, &batches)
}

/// Column type chosen for a worksheet column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int,
    Float,
    Text,
}

fn classify(cells: &[&Data]) -> CellKind {
    cells.iter().fold(CellKind::Int, |kind, cell| match (kind, cell) {
        (CellKind::Text, _) => CellKind::Text,
        (_, Data::Empty) => kind,
        (CellKind::Int, Data::Int(_)) => CellKind::Int,
        (CellKind::Int | CellKind::Float, Data::Int(_) | Data::Float(_)) => CellKind::Float,
        _ => CellKind::Text,
    })
}

fn excel_column(cells: &[&Data], kind: CellKind) -> ArrayRef {
    match kind {
        CellKind::Int => Arc::new(
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        CellKind::Float => Arc::new(
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    _ => None,
                })
                .collect::<Float64Array>(),
        ),
        CellKind::Text => Arc::new(
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty => None,
                    other => Some(other.to_string()),
                })
                .collect::<StringArray>(),
        ),
    }
}

fn read_excel(contents: Bytes) -> Result<RecordBatch> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(contents))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(RecordBatch::new_empty(Arc::new(Schema::empty()))),
    };

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    };
    let body: Vec<&[Data]> = rows.collect();

    let mut fields = Vec::with_capacity(header.len());
    let mut columns = Vec::with_capacity(header.len());
    for (idx, name) in header.iter().enumerate() {
        let cells: Vec<&Data> = body
            .iter()
            .map(|row| row.get(idx).unwrap_or(&Data::Empty))
            .collect();
        let kind = classify(&cells);
        let column = excel_column(&cells, kind);
        fields.push(Field::new(name.to_string(), column.data_type().clone(), true));
        columns.push(column);
    }

    let schema = Arc::new(Schema::new(fields));
    if columns.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(RecordBatch::try_new(schema, columns)?)
}
