//! Builds one record per supplier and hangs the downloaded documents on them.

use tracing::{debug, warn};

use crate::crawler::models::{
    ContractRecord, DocumentCategory, DocumentRef, Listing, ListingEntry, SupplierEntry,
};
use crate::crawler::parser;
use crate::crawler::traits::{Downloader, PageSource};
use crate::crawler::Sources;
use crate::directory::{classify, same_supplier};
use crate::drive;

pub const LISTING_READY: &str = ".flip-entry";

pub const DIRECTORY_TITLES: [&str; 6] = [
    "Vendor-Information",
    "Vendor Information",
    "Vendor-Contact",
    "Vendor Contact",
    "Contact-Information",
    "Contact Information",
];

pub const CONTRACT_DOCUMENT_TITLES: [&str; 4] = [
    "Vendor Document",
    "Vendor Documentation",
    "Vendor-Document",
    "Vendor-Documentation",
];

/// First entry whose title contains any of `needles`.
pub fn find_titled<'l>(listing: &'l Listing, needles: &[&str]) -> Option<&'l ListingEntry> {
    listing
        .iter()
        .find(|entry| needles.iter().any(|n| entry.title.contains(n)))
}

pub fn seed(base: &ContractRecord, entries: &[SupplierEntry]) -> Vec<ContractRecord> {
    entries.iter().map(|entry| base.for_supplier(entry)).collect()
}

pub async fn list_folder(pages: &dyn PageSource, link: &str) -> anyhow::Result<Listing> {
    let id = drive::drive_id(link).ok_or_else(|| anyhow::anyhow!("no folder id in {link}"))?;
    let html = pages
        .snapshot(&drive::folder_view_url(&id), LISTING_READY)
        .await?;
    Ok(parser::parse_listing(&html))
}

/// Downloads one listing entry. Any failure leaves the document absent.
pub async fn fetch_document(
    downloads: &dyn Downloader,
    entry: &ListingEntry,
    category: DocumentCategory,
) -> Option<DocumentRef> {
    let url = match drive::drive_id(&entry.url) {
        Some(id) => drive::export_url(&id),
        None => entry.url.clone(),
    };

    match downloads.download(&url).await {
        Ok(download) => {
            debug!(title = %entry.title, %category, bytes = download.body.len(), "Downloaded document");
            Some(DocumentRef {
                document_name: download.file_name.unwrap_or_else(|| entry.title.clone()),
                human_name: entry.title.clone(),
                category,
                size_bytes: download.body.len(),
                stored_path: None,
                body: download.body,
            })
        }
        Err(e) => {
            warn!(title = %entry.title, %url, error = %e, "Document unavailable");
            None
        }
    }
}

/// Attaches the main contract document found under the "Vendor Documentation"
/// entry of the left listing. A folder is matched per supplier; a lone file
/// goes to the first supplier.
pub async fn attach_contract_files(
    records: &mut [ContractRecord],
    left: &Listing,
    sources: &Sources<'_>,
) {
    let Some(entry) = find_titled(left, &CONTRACT_DOCUMENT_TITLES) else {
        debug!("No vendor documentation entry");
        return;
    };

    if drive::is_folder_link(&entry.url) {
        let folder = match list_folder(sources.pages, &entry.url).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(url = %entry.url, error = %e, "Contract folder unavailable");
                return;
            }
        };

        for record in records.iter_mut() {
            let supplier = record.supplier_name().to_string();
            let Some(file) = folder.iter().find(|f| same_supplier(&supplier, &f.title)) else {
                continue;
            };
            if let Some(doc) =
                fetch_document(sources.downloads, file, DocumentCategory::ContractFiles).await
            {
                record.attach(doc);
            }
        }
    } else if drive::is_file_link(&entry.url) {
        let Some(first) = records.first_mut() else {
            return;
        };
        if let Some(doc) =
            fetch_document(sources.downloads, entry, DocumentCategory::ContractFiles).await
        {
            first.attach(doc);
        }
    }
}

/// Attaches the documents of the right listing. A single supplier takes every
/// entry; otherwise each supplier takes the entries whose title matches it.
pub async fn attach_listing_documents(
    records: &mut [ContractRecord],
    right: &Listing,
    sources: &Sources<'_>,
) {
    if let [only] = records {
        for entry in right.iter() {
            attach_entry(only, entry, sources).await;
        }
        return;
    }

    for record in records.iter_mut() {
        let supplier = record.supplier_name().to_string();

        for entry in right.iter().filter(|e| same_supplier(&supplier, &e.title)) {
            let is_folder = drive::is_folder_link(&entry.url);
            attach_entry(record, entry, sources).await;
            if is_folder {
                break;
            }
        }
    }
}

async fn attach_entry(record: &mut ContractRecord, entry: &ListingEntry, sources: &Sources<'_>) {
    if !drive::is_folder_link(&entry.url) {
        if let Some(doc) = fetch_document(sources.downloads, entry, classify(&entry.title)).await {
            record.attach(doc);
        }
        return;
    }

    let folder = match list_folder(sources.pages, &entry.url).await {
        Ok(listing) => listing,
        Err(e) => {
            warn!(url = %entry.url, error = %e, "Supplier folder unavailable");
            return;
        }
    };

    for file in folder.iter() {
        if let Some(doc) = fetch_document(sources.downloads, file, classify(&file.title)).await {
            record.attach(doc);
        }
    }
}
