use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use log::info;
use prognos_classifiers::response::{BacteriaReport, HospitalReport};
use serde::Serialize;

use super::error::ApiError;
use super::state::AppState;
use crate::uploads::{check_csv_filename, save_upload, BACTERIA_PREFIX, HOSPITAL_PREFIX};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct HospitalResponse {
    pub filename: String,
    pub content: HospitalReport,
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Pull the `file` part out of a multipart body.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Upload, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::unprocessable(e.body_text()))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::unprocessable(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(|n| n.to_string())
            .ok_or_else(|| ApiError::unprocessable("Expected an uploaded file in field 'file'"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::unprocessable(e.body_text()))?;
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::unprocessable("Field required: file"))
}

async fn read_csv_upload(
    multipart: Result<Multipart, MultipartRejection>,
    failed: &str,
) -> Result<Upload, ApiError> {
    let upload = read_upload(multipart).await?;
    check_csv_filename(&upload.filename).map_err(|e| ApiError::from_predict(failed, e))?;
    info!(
        "[Prognos::Server] Received {} ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );
    Ok(upload)
}

pub async fn hospital_predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<HospitalResponse>, ApiError> {
    const FAILED: &str = "Prediction failed";
    let upload = read_csv_upload(multipart, FAILED).await?;

    let predictor = state.hospital.clone();
    let data_dir = state.data_dir.clone();
    let bytes = upload.bytes;
    let report = tokio::task::spawn_blocking(move || -> anyhow::Result<HospitalReport> {
        let path = save_upload(&data_dir, HOSPITAL_PREFIX, &bytes)?;
        Ok(predictor.predict_path(&path)?)
    })
    .await
    .map_err(|e| ApiError::internal(FAILED, e))?
    .map_err(|e| ApiError::internal(FAILED, e))?;

    Ok(Json(HospitalResponse {
        filename: format!("predictions_{}", upload.filename),
        content: report,
    }))
}

pub async fn bacteria_predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BacteriaReport>, ApiError> {
    const FAILED: &str = "Bacteria prediction failed";
    let upload = read_csv_upload(multipart, FAILED).await?;

    let predictor = state.bacteria.clone();
    let data_dir = state.data_dir.clone();
    let report = tokio::task::spawn_blocking(move || -> anyhow::Result<BacteriaReport> {
        let path = save_upload(&data_dir, BACTERIA_PREFIX, &upload.bytes)?;
        Ok(predictor.predict_path(&path)?)
    })
    .await
    .map_err(|e| ApiError::internal(FAILED, e))?
    .map_err(|e| ApiError::internal(FAILED, e))?;

    Ok(Json(report))
}
