use crate::utils::{assert_percent, sample_record, test_predictor};
use cardio_risk::{ErrorKind, RiskBand, ScalingMode, SinglePredictionResponse};
use serde_json::json;

#[test]
fn test_low_risk_record() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let result = predictor.score_record(&sample_record())?;

    assert_percent(result.probability, 6.30);
    assert_eq!(result.risk_band, Some(RiskBand::Low));
    Ok(())
}

#[test]
fn test_moderate_risk_record() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let mut record = sample_record();
    record["smoke"] = json!(1);

    let result = predictor.score_record(&record)?;
    assert_percent(result.probability, 10.91);
    assert_eq!(result.risk_band, Some(RiskBand::Moderate));
    Ok(())
}

#[test]
fn test_high_risk_record_response() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let mut record = sample_record();
    record["cholesterol"] = json!(3);

    let result = predictor.score_record(&record)?;
    let response = SinglePredictionResponse::from(&result);
    assert_eq!(response.disease_probability, "33.18%");
    assert_eq!(response.risk_band, RiskBand::High);
    assert_eq!(response.recommendation, RiskBand::High.advisory());
    Ok(())
}

#[test]
fn test_single_record_scales_to_zero() -> cardio_risk::Result<()> {
    // Every scaled feature collapses to 0.0 for one row, so ap_hi can
    // never cross its 0.0 border however high it is.
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let mut record = sample_record();
    record["ap_hi"] = json!(220);

    let result = predictor.score_record(&record)?;
    assert_percent(result.probability, 6.30);
    Ok(())
}

#[test]
fn test_fitted_scaling_uses_stored_ranges() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::Fitted)?;
    let mut record = sample_record();
    record["ap_hi"] = json!(160);

    let result = predictor.score_record(&record)?;
    assert_percent(result.probability, 57.44);
    assert_eq!(result.risk_band, Some(RiskBand::High));
    Ok(())
}

#[test]
fn test_numeric_strings_are_accepted() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let mut record = sample_record();
    record["height"] = json!("170");
    record["smoke"] = json!("1");

    let result = predictor.score_record(&record)?;
    assert_percent(result.probability, 10.91);
    Ok(())
}

#[test]
fn test_missing_field_is_named() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let mut record = sample_record();
    if let Some(object) = record.as_object_mut() {
        object.remove("active");
    }

    let err = predictor.score_record(&record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("active"), "{err}");
    Ok(())
}

#[test]
fn test_zero_height_is_rejected() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let mut record = sample_record();
    record["height"] = json!(0);

    let err = predictor.score_record(&record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Numeric);
    assert!(err.is_client_error());
    Ok(())
}

#[test]
fn test_non_object_payload_is_rejected() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let err = predictor.score_record(&json!([1, 2, 3])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    Ok(())
}

#[test]
fn test_nan_weight_is_rejected() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let mut record = sample_record();
    record["weight"] = json!("NaN");

    let err = predictor.score_record(&record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Numeric);
    assert!(err.to_string().contains("weight"), "{err}");
    Ok(())
}

#[test]
fn test_vanishing_height_is_rejected() -> cardio_risk::Result<()> {
    let predictor = test_predictor(ScalingMode::PerRequest)?;
    let mut record = sample_record();
    record["height"] = json!(1e-200);

    let err = predictor.score_record(&record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Numeric);
    assert!(err.to_string().contains("height"), "{err}");
    Ok(())
}
