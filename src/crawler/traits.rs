use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Loads a page and hands back its markup once `wait_for` is present.
/// No page handle outlives the call.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn snapshot(&self, url: &str, wait_for: &str) -> anyhow::Result<String>;

    /// Loads `url`, activates the element matching `target` and returns the
    /// resulting page once `wait_for` is present.
    async fn click(&self, url: &str, target: &str, wait_for: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("server answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Download, DownloadError>;
}

/// Produces the plain text of a vendor-directory document.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn directory_text(&self, file_id: &str) -> anyhow::Result<String>;
}
