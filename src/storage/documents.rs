use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::crawler::models::ContractRecord;

/// Writes document bodies under `<root>/<contract number>/<supplier>/`, one
/// `<category>-<position>-<name>` file per attached document.
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores every attached document and records where it went.
    pub async fn persist(&self, record: &mut ContractRecord) -> anyhow::Result<usize> {
        let dir = self
            .root
            .join(file_safe(&record.contract_number))
            .join(file_safe(record.suppliers.as_deref().unwrap_or("contract")));

        let mut written = 0usize;
        for (category, docs) in record.documents.iter_mut() {
            for (idx, doc) in docs.iter_mut().enumerate() {
                fs::create_dir_all(&dir).await?;

                let name = format!("{category}-{:02}-{}", idx + 1, file_safe(&doc.document_name));
                let path = dir.join(name);
                let mut file = fs::File::create(&path).await?;
                file.write_all(&doc.body).await?;
                file.flush().await?;

                debug!(path = %path.display(), bytes = doc.body.len(), "Stored document");
                doc.stored_path = Some(path);
                written += 1;
            }
        }

        Ok(written)
    }
}

fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}
