//! Request handlers for the prediction endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use super::{ApiError, AppState};
use crate::error::Error;
use crate::reader::{InputFormat, read_dataset};
use crate::response::{OutputFormat, SinglePredictionResponse, write_batch};

/// `GET /health` - liveness probe reporting the loaded classifier
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "features": state.predictor.engine().layout().len(),
        "scaling": state.predictor.scaler().mode(),
    }))
}

/// `POST /predict/` - score one record supplied as a JSON object
pub async fn predict_single(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SinglePredictionResponse>, ApiError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| Error::InvalidPayload(format!("request body is not JSON: {e}")))?;

    let predictor = state.predictor.clone();
    let result = tokio::task::spawn_blocking(move || predictor.score_record(&payload)).await??;

    Ok(Json(SinglePredictionResponse::from(&result)))
}

/// Parts of a batch upload request
#[derive(Debug, Default)]
struct UploadParts {
    file_name: Option<String>,
    contents: Option<Bytes>,
    output_format: Option<String>,
}

async fn collect_parts(mut multipart: Multipart) -> Result<UploadParts, Error> {
    let mut parts = UploadParts::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidPayload(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                parts.file_name = field.file_name().map(str::to_owned);
                parts.contents = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| Error::InvalidPayload(e.body_text()))?,
                );
            }
            Some("output_format") => {
                parts.output_format = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| Error::InvalidPayload(e.body_text()))?,
                );
            }
            _ => {}
        }
    }
    Ok(parts)
}

/// `POST /predict/upload` - score every row of an uploaded file
///
/// Expects a multipart form with a `file` part and an optional
/// `output_format` part (`csv` or `excel`). The output format is checked
/// before the file is decoded.
pub async fn predict_upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| Error::InvalidPayload(e.body_text()))?;
    let parts = collect_parts(multipart).await?;

    let output_format = OutputFormat::from_param(parts.output_format.as_deref())?;
    // A file part without a file name is treated as no upload at all
    let (Some(file_name), Some(contents)) = (
        parts.file_name.filter(|name| !name.is_empty()),
        parts.contents,
    ) else {
        return Err(Error::MissingUpload.into());
    };
    let input_format = InputFormat::from_file_name(&file_name)?;
    log::info!("Received upload '{file_name}' ({} bytes)", contents.len());

    let predictor = state.predictor.clone();
    let body = tokio::task::spawn_blocking(move || {
        let dataset = read_dataset(input_format, contents)?;
        let output = predictor.score_dataset(&dataset)?;
        write_batch(&output, output_format)
    })
    .await??;

    Ok((
        [
            (header::CONTENT_TYPE, output_format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, output_format.content_disposition()),
        ],
        body,
    )
        .into_response())
}
