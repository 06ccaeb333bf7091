use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::crawler::models::ContractRecord;

pub mod documents;
pub mod jsonl;
pub mod postgres;

pub use documents::DocumentStore;
pub use jsonl::JsonlSink;
pub use postgres::PostgresSink;

/// Destination for assembled contract records.
#[async_trait]
pub trait RecordSink: Send {
    async fn save(&mut self, record: &ContractRecord) -> anyhow::Result<()>;

    async fn save_batch(&mut self, records: &[ContractRecord]) -> anyhow::Result<usize> {
        for record in records {
            self.save(record).await?;
        }
        Ok(records.len())
    }

    async fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Postgres when `DATABASE_URL` is set, JSON lines otherwise.
pub async fn open_sink(cfg: &Config) -> anyhow::Result<Box<dyn RecordSink>> {
    match &cfg.database_url {
        Some(url) => {
            info!("Writing contracts to Postgres");
            Ok(Box::new(PostgresSink::new(url).await?))
        }
        None => {
            info!(path = %cfg.output_path.display(), "Writing contracts as JSON lines");
            Ok(Box::new(JsonlSink::create(&cfg.output_path).await?))
        }
    }
}
