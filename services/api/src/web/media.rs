//! services/api/src/web/media.rs
//!
//! The teacher-only media upload endpoint. Accepts a multipart form with a
//! single file part and forwards it to the external asset host through the
//! `MediaStorageService` port; the response carries the durable URL and
//! the host-assigned reference id the client then embeds in a course.

use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
};
use course_market_core::domain::StoredMedia;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::protocol::{self, ApiFailure};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct MediaUploadResponse {
    pub url: String,
    pub asset_id: String,
}

/// POST /media/upload - Upload one video or image to the asset host
#[utoipa::path(
    post,
    path = "/media/upload",
    request_body(content_type = "multipart/form-data", description = "The file to upload."),
    responses(
        (status = 201, description = "File stored on the asset host", body = MediaUploadResponse),
        (status = 400, description = "Multipart form is missing a file part"),
        (status = 403, description = "Caller is not a teacher"),
        (status = 500, description = "Upload to the asset host failed")
    )
)]
pub async fn upload_media_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiFailure> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::BadRequest(format!("Failed to read multipart data: {}", e)))?
        .ok_or_else(|| {
            ApiFailure::BadRequest("Multipart form must include a file".to_string())
        })?;

    let file_name = field.file_name().unwrap_or("untitled").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiFailure::BadRequest(format!("Failed to read file bytes: {}", e)))?
        .to_vec();

    if data.is_empty() {
        return Err(ApiFailure::BadRequest("Uploaded file is empty".to_string()));
    }

    let StoredMedia { url, asset_id } = state
        .media
        .upload(&file_name, &content_type, data)
        .await
        .map_err(|e| {
            error!("Media upload failed: {:?}", e);
            ApiFailure::from(e)
        })?;

    Ok(protocol::created(
        "File uploaded",
        MediaUploadResponse { url, asset_id },
    ))
}
