use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use reqwest::Client;
use tracing::debug;

use url::Url;

use crate::crawler::parser::{self, Activation, FormMethod};
use crate::crawler::traits::{Download, DownloadError, Downloader, PageSource};

pub fn build_client(timeout_secs: u64) -> anyhow::Result<Client> {
    Ok(Client::builder()
        .user_agent("escnj-scraper/0.1")
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(10))
        .cookie_store(true)
        .build()?)
}

pub async fn fetch_html(client: &Client, url: &str) -> anyhow::Result<String> {
    let res = client.get(url).send().await?.error_for_status()?;
    Ok(res.text().await?)
}

pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn snapshot(&self, url: &str, wait_for: &str) -> anyhow::Result<String> {
        let html = fetch_html(&self.client, url).await?;

        if !parser::contains_selector(&html, wait_for)? {
            anyhow::bail!("{wait_for:?} never appeared on {url}");
        }

        debug!(url, bytes = html.len(), "Captured page snapshot");
        Ok(html)
    }

    async fn click(&self, url: &str, target: &str, wait_for: &str) -> anyhow::Result<String> {
        let page = fetch_html(&self.client, url).await?;
        let base = Url::parse(url)?;

        let request = match parser::activation(&page, target, &base)? {
            Activation::Follow(href) => self.client.get(href),
            Activation::Submit {
                method: FormMethod::Get,
                action,
                fields,
            } => self.client.get(action).query(&fields),
            Activation::Submit {
                method: FormMethod::Post,
                action,
                fields,
            } => self.client.post(action).form(&fields),
        };

        let html = request.send().await?.error_for_status()?.text().await?;

        if !parser::contains_selector(&html, wait_for)? {
            anyhow::bail!("{wait_for:?} never appeared after activating {target:?} on {url}");
        }

        debug!(url, target, bytes = html.len(), "Captured page snapshot after click");
        Ok(html)
    }
}

pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Download, DownloadError> {
        let res = self.client.get(url).send().await?;

        if res.status() != reqwest::StatusCode::OK {
            return Err(DownloadError::Status {
                status: res.status().as_u16(),
                url: url.to_string(),
            });
        }

        let file_name = filename_from_headers(res.headers());
        let body = res.bytes().await?;

        Ok(Download { file_name, body })
    }
}

/// File name announced in `Content-Disposition`, preferring the RFC 5987
/// `filename*` form.
pub fn filename_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;

    let mut plain = None;
    for part in value.split(';').map(str::trim) {
        if let Some(encoded) = part.strip_prefix("filename*=") {
            let name = encoded.rsplit("''").next().unwrap_or(encoded);
            return Some(
                percent_decode_str(name.trim_matches('"'))
                    .decode_utf8_lossy()
                    .into_owned(),
            );
        }
        if let Some(name) = part.strip_prefix("filename=") {
            plain = Some(name.trim_matches('"').to_string());
        }
    }

    plain.filter(|n| !n.is_empty())
}
