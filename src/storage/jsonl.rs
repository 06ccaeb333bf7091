use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use super::RecordSink;
use crate::crawler::models::ContractRecord;

/// One JSON object per line.
pub struct JsonlSink {
    out: BufWriter<File>,
}

impl JsonlSink {
    pub async fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(path).await?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn save(&mut self, record: &ContractRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.out.write_all(&line).await?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.out.flush().await?;
        Ok(())
    }
}
