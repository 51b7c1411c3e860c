use std::path::PathBuf;

use crate::utils::{fixture, test_config};
use cardio_risk::{ErrorKind, Predictor, ScalingMode, ServiceConfig};

#[test]
fn test_config_file_drives_predictor() -> cardio_risk::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("service.json");
    let contents = serde_json::json!({
        "model_path": fixture("cardio_model.json"),
        "scaling": "fitted",
        "scaler_params_path": fixture("scaler_params.json"),
        "listen_addr": "127.0.0.1:0"
    });
    std::fs::write(&path, contents.to_string())?;

    let config = ServiceConfig::from_file(&path)?;
    assert_eq!(config.listen_addr, "127.0.0.1:0");

    let predictor = Predictor::from_config(&config)?;
    assert_eq!(predictor.scaler().mode(), ScalingMode::Fitted);
    assert_eq!(predictor.engine().layout().len(), 12);
    Ok(())
}

#[test]
fn test_missing_model_fails_startup() {
    let config = ServiceConfig {
        model_path: PathBuf::from("/nonexistent/cardio_model.json"),
        ..test_config(ScalingMode::PerRequest)
    };
    let err = Predictor::from_config(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Model);
    assert!(!err.is_client_error());
}

#[test]
fn test_fitted_scaling_requires_params() {
    let config = ServiceConfig {
        scaler_params_path: None,
        ..test_config(ScalingMode::Fitted)
    };
    let err = Predictor::from_config(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Model);
}

#[test]
fn test_model_feature_mismatch_fails_startup() -> cardio_risk::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("model.json");
    let model = serde_json::json!({
        "features_info": {
            "float_features": [
                { "flat_feature_index": 0, "feature_id": "height" },
                { "flat_feature_index": 1, "feature_id": "waist" }
            ]
        },
        "oblivious_trees": []
    });
    std::fs::write(&path, model.to_string())?;

    let config = ServiceConfig {
        model_path: path,
        ..test_config(ScalingMode::PerRequest)
    };
    let err = Predictor::from_config(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Model);
    Ok(())
}
