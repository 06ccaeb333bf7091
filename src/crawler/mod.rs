use std::fmt;

use tracing::{debug, info, warn};
use url::Url;

use crate::crawler::models::{ContractRecord, Listing};
use crate::crawler::parser::ContractRow;
use crate::crawler::traits::{DirectorySource, Downloader, PageSource};
use crate::directory::{parse_directory, SegmentError};
use crate::drive;

pub mod assembler;
pub mod fetcher;
pub mod models;
pub mod parser;
pub mod service;
pub mod traits;

const DETAIL_READY: &str = "iframe";

/// Collaborators one contract's enrichment runs against.
pub struct Sources<'a> {
    pub pages: &'a dyn PageSource,
    pub downloads: &'a dyn Downloader,
    pub directory: &'a dyn DirectorySource,
}

#[derive(Debug)]
pub enum SkipReason {
    MissingDetailLink,
    PageUnavailable { url: String, error: String },
    MissingFrames { found: usize },
    DirectoryUnavailable { error: String },
    MalformedDirectory(SegmentError),
    EmptyDirectory,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingDetailLink => write!(f, "contract row has no document link"),
            SkipReason::PageUnavailable { url, error } => {
                write!(f, "page {url} unavailable: {error}")
            }
            SkipReason::MissingFrames { found } => {
                write!(f, "document page has {found} listing frames, expected 2")
            }
            SkipReason::DirectoryUnavailable { error } => {
                write!(f, "vendor directory unavailable: {error}")
            }
            SkipReason::MalformedDirectory(e) => write!(f, "malformed directory: {e}"),
            SkipReason::EmptyDirectory => write!(f, "vendor directory lists no suppliers"),
        }
    }
}

/// What became of one contract row.
#[derive(Debug)]
pub enum EnrichOutcome {
    /// One record per supplier, documents attached where found.
    Enriched(Vec<ContractRecord>),
    /// No vendor directory in the left listing; the base record goes out as is.
    NoDirectory(ContractRecord),
    Skipped(SkipReason),
}

pub async fn enrich_contract(sources: &Sources<'_>, site_root: &Url, row: ContractRow) -> EnrichOutcome {
    let ContractRow {
        record: base,
        detail_link,
    } = row;

    let Some(link) = detail_link else {
        return EnrichOutcome::Skipped(SkipReason::MissingDetailLink);
    };

    let detail_url = match site_root.join(&link) {
        Ok(url) => url.to_string(),
        Err(e) => {
            return EnrichOutcome::Skipped(SkipReason::PageUnavailable {
                url: link,
                error: e.to_string(),
            })
        }
    };

    let frames = match sources.pages.snapshot(&detail_url, DETAIL_READY).await {
        Ok(html) => parser::frame_sources(&html),
        Err(e) => {
            return EnrichOutcome::Skipped(SkipReason::PageUnavailable {
                url: detail_url,
                error: e.to_string(),
            })
        }
    };

    let [left_url, right_url, ..] = frames.as_slice() else {
        return EnrichOutcome::Skipped(SkipReason::MissingFrames {
            found: frames.len(),
        });
    };

    let left = match snapshot_listing(sources.pages, left_url).await {
        Ok(listing) => listing,
        Err(reason) => return EnrichOutcome::Skipped(reason),
    };

    let Some(directory) = assembler::find_titled(&left, &assembler::DIRECTORY_TITLES) else {
        info!(contract = %base.contract_number, "No vendor directory listed");
        return EnrichOutcome::NoDirectory(base);
    };

    let Some(file_id) = drive::drive_id(&directory.url) else {
        return EnrichOutcome::Skipped(SkipReason::DirectoryUnavailable {
            error: format!("no file id in {}", directory.url),
        });
    };

    let text = match sources.directory.directory_text(&file_id).await {
        Ok(text) => text,
        Err(e) => {
            return EnrichOutcome::Skipped(SkipReason::DirectoryUnavailable {
                error: e.to_string(),
            })
        }
    };

    let suppliers = match parse_directory(&text) {
        Ok(entries) if entries.is_empty() => {
            return EnrichOutcome::Skipped(SkipReason::EmptyDirectory)
        }
        Ok(entries) => entries,
        Err(e) => return EnrichOutcome::Skipped(SkipReason::MalformedDirectory(e)),
    };

    debug!(contract = %base.contract_number, suppliers = suppliers.len(), "Parsed vendor directory");

    let mut records = assembler::seed(&base, &suppliers);
    assembler::attach_contract_files(&mut records, &left, sources).await;

    match snapshot_listing(sources.pages, right_url).await {
        Ok(right) => assembler::attach_listing_documents(&mut records, &right, sources).await,
        Err(reason) => warn!(contract = %base.contract_number, %reason, "Document listing unavailable"),
    }

    EnrichOutcome::Enriched(records)
}

async fn snapshot_listing(pages: &dyn PageSource, url: &str) -> Result<Listing, SkipReason> {
    pages
        .snapshot(url, assembler::LISTING_READY)
        .await
        .map(|html| parser::parse_listing(&html))
        .map_err(|e| SkipReason::PageUnavailable {
            url: url.to_string(),
            error: e.to_string(),
        })
}
