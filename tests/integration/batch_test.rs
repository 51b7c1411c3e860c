use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;

use crate::utils::{CSV_HEADER, assert_percent, sample_csv, test_predictor};
use cardio_risk::schema::PROBABILITY_COLUMN;
use cardio_risk::{ErrorKind, InputFormat, OutputFormat, ScalingMode, read_dataset, write_batch};

fn csv_dataset(csv: String) -> cardio_risk::Result<cardio_risk::Dataset> {
    read_dataset(InputFormat::Csv, Bytes::from(csv))
}

fn probabilities(batch: &RecordBatch) -> Vec<f64> {
    let column = batch
        .column_by_name(PROBABILITY_COLUMN)
        .expect("probability column present");
    column
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("probabilities are Float64")
        .values()
        .to_vec()
}

#[test]
fn test_batch_appends_probability_column() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let dataset = csv_dataset(sample_csv())?;
    let output = predictor.score_dataset(&dataset)?;

    assert_eq!(output.num_rows(), 3);
    assert_eq!(output.num_columns(), dataset.batch().num_columns() + 1);
    assert_eq!(
        output.schema().field(output.num_columns() - 1).name(),
        PROBABILITY_COLUMN
    );

    // Original columns come back untouched
    for idx in 0..dataset.batch().num_columns() {
        assert_eq!(output.column(idx).as_ref(), dataset.batch().column(idx).as_ref());
    }

    let scores = probabilities(&output);
    assert_percent(scores[0], 6.30);
    assert_percent(scores[1], 6.30);
    assert_percent(scores[2], 57.44);
    Ok(())
}

#[test]
fn test_batch_probabilities_are_rounded() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let output = predictor.score_dataset(&csv_dataset(sample_csv())?)?;

    for score in probabilities(&output) {
        assert!((0.0..=100.0).contains(&score));
        assert_eq!(score, (score * 100.0).round() / 100.0);
    }
    Ok(())
}

#[test]
fn test_one_row_batch_scales_to_zero() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let csv = format!("{CSV_HEADER}\np3,180,85,160,95,60,1,1,1,0,0,0\n");
    let output = predictor.score_dataset(&csv_dataset(csv)?)?;

    assert_percent(probabilities(&output)[0], 6.30);
    Ok(())
}

#[test]
fn test_disabled_scaling_feeds_raw_values() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::Disabled)?;
    let output = predictor.score_dataset(&csv_dataset(sample_csv())?)?;

    // Raw ap_hi is always above the 0.0 border
    for score in probabilities(&output) {
        assert_percent(score, 57.44);
    }
    Ok(())
}

#[test]
fn test_missing_column_is_named() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let csv = "height,weight,ap_hi,ap_lo,age_years,gender,cholesterol,gluc,smoke,alco\n\
               170,70,120,80,50,1,1,1,0,0\n";
    let err = predictor
        .score_dataset(&csv_dataset(csv.to_string())?)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.to_string(), "Missing required fields: active");
    Ok(())
}

#[test]
fn test_zero_height_row_fails_request() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let csv = format!(
        "{CSV_HEADER}\np1,170,70,110,80,50,1,1,1,0,0,1\np2,0,62,120,80,45,2,1,1,0,0,1\n"
    );
    let err = predictor.score_dataset(&csv_dataset(csv)?).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Numeric);
    assert!(err.to_string().contains("height"), "{err}");
    Ok(())
}

#[test]
fn test_infinite_cell_fails_request() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let csv = format!(
        "{CSV_HEADER}\np1,170,70,110,80,50,1,1,1,0,0,1\np2,165,62,inf,80,45,2,1,1,0,0,1\n"
    );
    let err = predictor.score_dataset(&csv_dataset(csv)?).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Numeric);
    assert!(err.to_string().contains("ap_hi"), "{err}");
    Ok(())
}

#[test]
fn test_parquet_upload() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let source = csv_dataset(sample_csv())?;

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, source.batch().schema(), None)?;
    writer.write(source.batch())?;
    writer.close()?;

    let dataset = read_dataset(InputFormat::Parquet, Bytes::from(buffer))?;
    let output = predictor.score_dataset(&dataset)?;
    let scores = probabilities(&output);
    assert_eq!(scores.len(), 3);
    assert_percent(scores[2], 57.44);
    Ok(())
}

#[test]
fn test_excel_upload() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    let header: Vec<&str> = CSV_HEADER.split(',').collect();
    sheet.write_row(0, 0, header)?;
    sheet.write_row(1, 0, ["p1"])?;
    sheet.write_row(1, 1, [170, 70, 110, 80, 50, 1, 1, 1, 0, 0, 1])?;
    sheet.write_row(2, 0, ["p2"])?;
    sheet.write_row(2, 1, [180, 85, 160, 95, 60, 1, 1, 1, 0, 0, 0])?;
    let bytes = workbook.save_to_buffer()?;

    let dataset = read_dataset(InputFormat::Excel, Bytes::from(bytes))?;
    let output = predictor.score_dataset(&dataset)?;

    let ids = output
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("text column");
    assert_eq!(ids.value(1), "p2");

    let scores = probabilities(&output);
    assert_percent(scores[0], 6.30);
    assert_percent(scores[1], 57.44);
    Ok(())
}

#[test]
fn test_csv_output_keeps_rows_and_header() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let input = sample_csv();
    let output = predictor.score_dataset(&csv_dataset(input.clone())?)?;
    let body = String::from_utf8(write_batch(&output, OutputFormat::Csv)?).expect("utf-8 csv");

    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some(format!("{CSV_HEADER},{PROBABILITY_COLUMN}").as_str())
    );

    for (written, original) in lines.zip(input.lines().skip(1)) {
        let (values, probability) = written.rsplit_once(',').expect("probability field");
        assert_eq!(values, original);
        let probability: f64 = probability.parse().expect("numeric probability");
        assert!((0.0..=100.0).contains(&probability));
    }
    Ok(())
}

#[test]
fn test_integer_columns_survive() -> cardio_risk::Result<()> {
    let dataset = csv_dataset(sample_csv())?;
    let heights = dataset
        .batch()
        .column_by_name("height")
        .expect("height column");
    let heights = heights
        .as_any()
        .downcast_ref::<Int64Array>()
        .expect("integer heights");
    assert_eq!(heights.len(), 3);
    assert_eq!(heights.value(2), 180);
    Ok(())
}
