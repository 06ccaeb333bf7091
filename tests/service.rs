//! Full portal crawls against in-memory pages: entry click, pagination and
//! record delivery to the sink.

mod common;

use escnj_scraper::config::{Config, DriveConfig};
use escnj_scraper::crawler::service::{CrawlStats, ScrapingService, PORTAL_ENTRY};

use common::*;

const PORTAL_URL: &str = "https://www.escnj.us/members";
const PAGE_2_URL: &str = "https://www.escnj.us/members?page=2";

fn config(documents_dir: &std::path::Path, max_pages: Option<u32>) -> Config {
    Config {
        portal_url: PORTAL_URL.to_string(),
        site_root: "https://www.escnj.us".to_string(),
        page_delay_ms: 0,
        request_timeout_secs: 5,
        max_pages,
        output_path: documents_dir.join("contracts.jsonl"),
        documents_dir: documents_dir.to_path_buf(),
        database_url: None,
        drive: DriveConfig {
            token_cache: documents_dir.join("token.json"),
            access_token: None,
            client_id: None,
            client_secret: None,
        },
    }
}

fn portal_page(number: &str, pager: &str) -> String {
    format!(
        "<div class=\"sw-flex-item-group\">{}</div>{pager}",
        contract_table("Athletic Supplies", number, "/page/athletic")
    )
}

/// Every contract row leads to a document page without a vendor directory.
fn pages_without_directory() -> FakePages {
    FakePages::default()
        .with(DETAIL_URL, detail_page())
        .with(LEFT_URL, listing(&[("Bid Tabulation", file("BT"))]))
}

async fn crawl(pages: FakePages, max_pages: Option<u32>) -> (CrawlStats, MemorySink) {
    let dir = tempfile::tempdir().unwrap();
    let sink = MemorySink::default();

    let mut service = ScrapingService::with_sources(
        config(dir.path(), max_pages),
        Box::new(pages),
        Box::new(FakeDownloads::default()),
        Box::new(directory(&["Acme Sports"])),
        Box::new(sink.clone()),
    )
    .unwrap();

    let stats = service.run().await.unwrap();
    (stats, sink)
}

fn saved_numbers(sink: &MemorySink) -> Vec<String> {
    sink.records
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.contract_number.clone())
        .collect()
}

#[tokio::test]
async fn follows_pagination_until_only_script_links_remain() {
    let pages = pages_without_directory()
        .with_click(
            PORTAL_URL,
            PORTAL_ENTRY,
            portal_page("22/23-14", "<a aria-label=\"Go to Page 2\" href=\"/members?page=2\">2</a>"),
        )
        .with(
            PAGE_2_URL,
            portal_page("23/24-02", "<a aria-label=\"Go to Page 3\" href=\"#\">3</a>"),
        );

    let (stats, sink) = crawl(pages, None).await;

    assert_eq!(
        stats,
        CrawlStats {
            pages: 2,
            contracts: 2,
            saved: 2,
            without_directory: 2,
            skipped: 0,
        }
    );
    assert_eq!(saved_numbers(&sink), ["22/23-14", "23/24-02"]);
    assert!(*sink.finished.lock().unwrap());
}

#[tokio::test]
async fn pagination_back_to_a_visited_page_stops_the_crawl() {
    let pages = pages_without_directory()
        .with_click(
            PORTAL_URL,
            PORTAL_ENTRY,
            portal_page("22/23-14", "<a aria-label=\"Go to Page 2\" href=\"?page=2\">2</a>"),
        )
        .with(
            PAGE_2_URL,
            portal_page("23/24-02", "<a aria-label=\"Go to Page 3\" href=\"/members\">3</a>"),
        );

    let (stats, sink) = crawl(pages, None).await;

    assert_eq!(stats.pages, 2);
    assert_eq!(saved_numbers(&sink), ["22/23-14", "23/24-02"]);
}

#[tokio::test]
async fn page_limit_stops_after_the_first_page() {
    let pages = pages_without_directory()
        .with_click(
            PORTAL_URL,
            PORTAL_ENTRY,
            portal_page("22/23-14", "<a aria-label=\"Go to Page 2\" href=\"/members?page=2\">2</a>"),
        )
        .with(PAGE_2_URL, portal_page("23/24-02", ""));

    let (stats, sink) = crawl(pages, Some(1)).await;

    assert_eq!(stats.pages, 1);
    assert_eq!(saved_numbers(&sink), ["22/23-14"]);
}

#[tokio::test]
async fn portal_that_never_opens_saves_nothing() {
    let (stats, sink) = crawl(pages_without_directory(), None).await;

    assert_eq!(stats, CrawlStats::default());
    assert!(saved_numbers(&sink).is_empty());
    assert!(*sink.finished.lock().unwrap());
}
