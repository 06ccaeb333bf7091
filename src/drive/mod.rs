//! Google Drive plumbing: share-link parsing, media download and the OAuth
//! access token it needs.

mod auth;
mod client;

pub use auth::{CachedToken, DriveAuth};
pub use client::{extract_pdf_text, DriveClient};

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("no Drive credentials: token cache is missing or expired and no fallback token is set")]
    NoCredentials,
    #[error("Drive answered {status} for file {file_id}")]
    Status { status: u16, file_id: String },
    #[error("Drive request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token cache io: {0}")]
    Cache(#[from] std::io::Error),
    #[error("token cache format: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PDF text extraction failed: {0}")]
    Pdf(String),
}

/// File or folder id from a Drive share link such as
/// `https://drive.google.com/file/d/<id>/view` or
/// `https://drive.google.com/drive/folders/<id>`.
pub fn drive_id(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();

    segments
        .windows(2)
        .find(|pair| matches!(pair[0], "d" | "folders"))
        .map(|pair| pair[1])
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| {
            url.query_pairs()
                .find(|(k, _)| k == "id")
                .map(|(_, v)| v.into_owned())
        })
}

pub fn is_folder_link(link: &str) -> bool {
    link.contains("folders")
}

pub fn is_file_link(link: &str) -> bool {
    link.contains("file")
}

pub fn export_url(file_id: &str) -> String {
    format!("https://drive.google.com/u/0/uc?id={file_id}&export=download")
}

pub fn folder_view_url(folder_id: &str) -> String {
    format!("https://drive.google.com/embeddedfolderview?id={folder_id}#list")
}
