//! services/api/src/adapters/media.rs
//!
//! This module contains the adapter for the external asset host that stores
//! course videos and thumbnails. It implements the `MediaStorageService`
//! port from the `core` crate. The host itself stays an opaque collaborator:
//! we post raw bytes, it answers with a durable URL and a reference id.

use async_trait::async_trait;
use course_market_core::domain::StoredMedia;
use course_market_core::ports::{MediaStorageService, PortError, PortResult};
use serde::Deserialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `MediaStorageService` port against an
/// HTTP upload endpoint.
#[derive(Clone)]
pub struct HostedMediaAdapter {
    client: reqwest::Client,
    upload_url: String,
    api_key: Option<String>,
}

impl HostedMediaAdapter {
    /// Creates a new `HostedMediaAdapter`.
    pub fn new(client: reqwest::Client, upload_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            upload_url,
            api_key,
        }
    }
}

/// The host's upload response body.
#[derive(Deserialize)]
struct UploadResponse {
    url: String,
    asset_id: String,
}

//=========================================================================================
// `MediaStorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl MediaStorageService for HostedMediaAdapter {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> PortResult<StoredMedia> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.client.post(&self.upload_url).multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "Media host returned status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(StoredMedia {
            url: body.url,
            asset_id: body.asset_id,
        })
    }
}
