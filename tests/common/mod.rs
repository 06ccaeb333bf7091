//! In-memory stand-ins for the portal, Drive downloads, vendor directories
//! and the record sink.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use escnj_scraper::crawler::models::ContractRecord;
use escnj_scraper::crawler::traits::{
    DirectorySource, Download, DownloadError, Downloader, PageSource,
};
use escnj_scraper::storage::RecordSink;

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Default)]
pub struct FakePages {
    pages: HashMap<String, String>,
    clicks: HashMap<(String, String), String>,
}

impl FakePages {
    pub fn with(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    /// Page shown after activating `target` on `url`.
    pub fn with_click(mut self, url: &str, target: &str, html: String) -> Self {
        self.clicks
            .insert((url.to_string(), target.to_string()), html);
        self
    }
}

#[async_trait]
impl PageSource for FakePages {
    async fn snapshot(&self, url: &str, _wait_for: &str) -> anyhow::Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no page at {url}"))
    }

    async fn click(&self, url: &str, target: &str, _wait_for: &str) -> anyhow::Result<String> {
        self.clicks
            .get(&(url.to_string(), target.to_string()))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("nothing behind {target} on {url}"))
    }
}

/// Serves every Drive export URL except ids containing "missing".
#[derive(Default)]
pub struct FakeDownloads {
    pub requested: Mutex<Vec<String>>,
}

#[async_trait]
impl Downloader for FakeDownloads {
    async fn download(&self, url: &str) -> Result<Download, DownloadError> {
        self.requested.lock().unwrap().push(url.to_string());

        let id = Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        if id.contains("missing") {
            return Err(DownloadError::Status {
                status: 404,
                url: url.to_string(),
            });
        }

        Ok(Download {
            file_name: Some(format!("{id}.pdf")),
            body: Bytes::from(id),
        })
    }
}

pub struct FakeDirectory {
    pub text: String,
}

#[async_trait]
impl DirectorySource for FakeDirectory {
    async fn directory_text(&self, file_id: &str) -> anyhow::Result<String> {
        anyhow::ensure!(file_id == "DIR", "unexpected directory id {file_id}");
        Ok(self.text.clone())
    }
}

/// Keeps saved records in a shared vector the test can read back.
#[derive(Clone, Default)]
pub struct MemorySink {
    pub records: Arc<Mutex<Vec<ContractRecord>>>,
    pub finished: Arc<Mutex<bool>>,
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn save(&mut self, record: &ContractRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn finish(&mut self) -> anyhow::Result<()> {
        *self.finished.lock().unwrap() = true;
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub const DETAIL_URL: &str = "https://www.escnj.us/page/athletic";
pub const LEFT_URL: &str = "https://drive.google.com/embeddedfolderview?id=LEFT#list";
pub const RIGHT_URL: &str = "https://drive.google.com/embeddedfolderview?id=RIGHT#list";
pub const CONTRACTS_URL: &str = "https://drive.google.com/embeddedfolderview?id=CONTRACTS#list";

pub fn site_root() -> Url {
    Url::parse("https://www.escnj.us").unwrap()
}

pub fn folder_view(id: &str) -> String {
    format!("https://drive.google.com/embeddedfolderview?id={id}#list")
}

pub fn file(id: &str) -> String {
    format!("https://drive.google.com/file/d/{id}/view?usp=drive_web")
}

pub fn folder(id: &str) -> String {
    format!("https://drive.google.com/drive/folders/{id}")
}

pub fn listing(entries: &[(&str, String)]) -> String {
    entries
        .iter()
        .map(|(title, href)| {
            format!(
                "<div class=\"flip-entry\"><div class=\"flip-entry-info\">\
                 <a href=\"{href}\"><div class=\"flip-entry-title\">{title}</div></a>\
                 </div></div>"
            )
        })
        .collect()
}

pub fn detail_page() -> String {
    format!("<iframe src=\"{LEFT_URL}\"></iframe><iframe src=\"{RIGHT_URL}\"></iframe>")
}

/// One contract table in the members portal layout.
pub fn contract_table(title: &str, number: &str, href: &str) -> String {
    format!(
        "<table><tr>\
         <td>Category</td><td>Title</td><td>{title}</td>\
         <td>Bid #</td><td>{number}</td>\
         <td>Term</td><td>01/01/2023 - 12/31/2025</td>\
         <td></td><td></td><td>Docs</td><td><a href=\"{href}\">View</a></td>\
         </tr></table>"
    )
}

pub fn supplier_block(vendor: &str) -> String {
    format!(
        "Bid #22/23-14\nVendor\n{vendor}\nRepresentative\nPat Lee\nAddress\n1 Main St\n\
         Telephone #\n732-555-0100\nFax #\n732-555-0101\nEmail\npat@example.com\n\
         Website\nwww.example.com\n"
    )
}

pub fn directory(vendors: &[&str]) -> FakeDirectory {
    let mut text: String = vendors.iter().map(|v| supplier_block(v)).collect();
    text.push_str("Bid\n");
    FakeDirectory { text }
}
