use std::collections::HashSet;

use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use url::Url;

use crate::{
    config::Config,
    crawler::{self, fetcher, parser, EnrichOutcome, Sources},
    drive::{DriveAuth, DriveClient},
    storage::{self, DocumentStore, RecordSink},
};
use crate::crawler::fetcher::{HttpDownloader, HttpPageSource};
use crate::crawler::models::ContractRecord;
use crate::crawler::traits::{DirectorySource, Downloader, PageSource};

/// Submit control that opens the contract listing on the members portal.
pub const PORTAL_ENTRY: &str = "#minibaseSubmit3554";
/// Present once the contract listing has rendered.
pub const PORTAL_READY: &str = ".sw-flex-item-group";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages: u32,
    pub contracts: usize,
    pub saved: usize,
    pub without_directory: usize,
    pub skipped: usize,
}

pub struct ScrapingService {
    cfg: Config,
    site_root: Url,
    pages: Box<dyn PageSource>,
    downloads: Box<dyn Downloader>,
    directory: Box<dyn DirectorySource>,
    sink: Box<dyn RecordSink>,
    documents: DocumentStore,
}

impl ScrapingService {
    pub async fn new(cfg: Config) -> anyhow::Result<Self> {
        let client = fetcher::build_client(cfg.request_timeout_secs)?;
        let sink = storage::open_sink(&cfg).await?;
        let auth = DriveAuth::new(client.clone(), &cfg.drive);

        Self::with_sources(
            cfg,
            Box::new(HttpPageSource::new(client.clone())),
            Box::new(HttpDownloader::new(client.clone())),
            Box::new(DriveClient::new(client, auth)),
            sink,
        )
    }

    pub fn with_sources(
        cfg: Config,
        pages: Box<dyn PageSource>,
        downloads: Box<dyn Downloader>,
        directory: Box<dyn DirectorySource>,
        sink: Box<dyn RecordSink>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            site_root: Url::parse(&cfg.site_root)?,
            documents: DocumentStore::new(cfg.documents_dir.clone()),
            pages,
            downloads,
            directory,
            sink,
            cfg,
        })
    }

    pub async fn run(&mut self) -> anyhow::Result<CrawlStats> {
        let mut stats = CrawlStats::default();
        let mut url = self.cfg.portal_url.clone();
        let mut visited = HashSet::new();
        let mut page = 1u32;

        loop {
            info!(page, %url, "Processing portal page");
            visited.insert(url.clone());

            let loaded = if page == 1 {
                self.pages.click(&url, PORTAL_ENTRY, PORTAL_READY).await
            } else {
                self.pages.snapshot(&url, PORTAL_READY).await
            };

            let html = match loaded {
                Ok(html) => html,
                Err(e) => {
                    error!(page, error = %e, "Failed to load portal page");
                    break;
                }
            };

            stats.pages += 1;
            self.process_page(&html, &mut stats).await;

            if self.cfg.max_pages.is_some_and(|max| page >= max) {
                info!(page, "Reached page limit");
                break;
            }

            page += 1;
            let Some(next) = parser::next_page_link(&html, page) else {
                break;
            };

            let next_url = match Url::parse(&url).and_then(|current| current.join(&next)) {
                Ok(u) => u.to_string(),
                Err(e) => {
                    warn!(page, href = %next, error = %e, "Bad pagination link");
                    break;
                }
            };

            if visited.contains(&next_url) {
                warn!(page, url = %next_url, "Pagination leads back to a visited page");
                break;
            }
            url = next_url;

            sleep(Duration::from_millis(self.cfg.page_delay_ms)).await;
        }

        self.sink.finish().await?;

        info!(
            pages = stats.pages,
            contracts = stats.contracts,
            saved = stats.saved,
            without_directory = stats.without_directory,
            skipped = stats.skipped,
            "DONE: portal crawl finished"
        );
        Ok(stats)
    }

    async fn process_page(&mut self, html: &str, stats: &mut CrawlStats) {
        let rows = parser::extract_contract_rows(html, &self.cfg.portal_url);
        info!(count = rows.len(), "Found contract tables");

        for row in rows {
            stats.contracts += 1;
            let contract = row.record.contract_number.clone();

            let sources = Sources {
                pages: self.pages.as_ref(),
                downloads: self.downloads.as_ref(),
                directory: self.directory.as_ref(),
            };

            let outcome = crawler::enrich_contract(&sources, &self.site_root, row).await;
            match outcome {
                EnrichOutcome::Enriched(records) => {
                    info!(%contract, suppliers = records.len(), "Contract enriched");
                    stats.saved += self.save(records).await;
                }
                EnrichOutcome::NoDirectory(record) => {
                    stats.without_directory += 1;
                    stats.saved += self.save(vec![record]).await;
                }
                EnrichOutcome::Skipped(reason) => {
                    stats.skipped += 1;
                    warn!(%contract, %reason, "Skipped contract enrichment");
                }
            }
        }
    }

    async fn save(&mut self, mut records: Vec<ContractRecord>) -> usize {
        for record in records.iter_mut() {
            if let Err(e) = self.documents.persist(record).await {
                error!(contract = %record.contract_number, error = %e, "Failed to store documents");
            }
        }

        match self.sink.save_batch(&records).await {
            Ok(saved) => saved,
            Err(e) => {
                error!(error = %e, "Failed to save contract records");
                0
            }
        }
    }
}
