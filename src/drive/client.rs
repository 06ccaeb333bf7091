use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, info};

use super::{DriveAuth, DriveError};
use crate::crawler::traits::DirectorySource;

const API_BASE: &str = "https://www.googleapis.com/drive/v3";

pub struct DriveClient {
    client: Client,
    auth: DriveAuth,
}

impl DriveClient {
    pub fn new(client: Client, auth: DriveAuth) -> Self {
        Self { client, auth }
    }

    pub async fn download_media(&self, file_id: &str) -> Result<Bytes, DriveError> {
        let token = self.auth.access_token().await?;
        let url = format!("{API_BASE}/files/{file_id}");

        let res = self
            .client
            .get(&url)
            .query(&[("alt", "media")])
            .bearer_auth(token)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(DriveError::Status {
                status: res.status().as_u16(),
                file_id: file_id.to_string(),
            });
        }

        let body = res.bytes().await?;
        debug!(file_id, bytes = body.len(), "Downloaded Drive media");
        Ok(body)
    }
}

#[async_trait]
impl DirectorySource for DriveClient {
    async fn directory_text(&self, file_id: &str) -> anyhow::Result<String> {
        let body = self.download_media(file_id).await?;
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&body)).await??;

        info!(file_id, chars = text.len(), "Extracted vendor directory text");
        Ok(text)
    }
}

/// Plain text of every page, in page order.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, DriveError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| DriveError::Pdf(e.to_string()))
}
