use escnj_scraper::config::Config;
use escnj_scraper::crawler::service::ScrapingService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::from_env()?;

    let mut service = ScrapingService::new(cfg).await?;
    let stats = service.run().await?;

    println!("\n==============================");
    println!("PAGES CRAWLED:      {}", stats.pages);
    println!("CONTRACTS SEEN:     {}", stats.contracts);
    println!("RECORDS SAVED:      {}", stats.saved);
    println!("WITHOUT DIRECTORY:  {}", stats.without_directory);
    println!("SKIPPED:            {}", stats.skipped);
    println!("==============================\n");

    Ok(())
}
