use anyhow::Result;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Row, Transaction};

use super::RecordSink;
use crate::crawler::models::ContractRecord;

pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    async fn save_record_tx(
        tx: &mut Transaction<'_, Postgres>,
        record: &ContractRecord,
    ) -> Result<i64> {
        let buyer_contacts = serde_json::to_string(&record.buyer_contacts)?;
        let supplier_contacts = serde_json::to_string(&record.supplier_contacts)?;

        let contract_id: i64 = sqlx::query(
            r#"
            INSERT INTO escnj_contracts (
                contract_number,
                supplier,
                title,
                effective,
                expiration,
                source_url,
                buyer_lead_agency,
                buyer_lead_agency_state,
                service_area_state,
                service_area_national,
                cooperative_language,
                contract_type,
                cooperative_affiliation,
                buyer_contacts,
                supplier_contacts
            )
            VALUES (
                $1,$2,$3,$4,$5,$6,
                $7,$8,$9,$10,$11,$12,$13,
                $14::jsonb,$15::jsonb
            )
            ON CONFLICT (contract_number, supplier) DO UPDATE SET
                title = EXCLUDED.title,
                effective = EXCLUDED.effective,
                expiration = EXCLUDED.expiration,
                supplier_contacts = EXCLUDED.supplier_contacts,
                scraped_at = now()
            RETURNING id
            "#,
        )
        .bind(&record.contract_number)
        .bind(record.supplier_name())
        .bind(&record.title)
        .bind(&record.effective)
        .bind(&record.expiration)
        .bind(&record.source_url)
        .bind(&record.buyer_lead_agency)
        .bind(&record.buyer_lead_agency_state)
        .bind(&record.service_area_state)
        .bind(record.service_area_national)
        .bind(record.cooperative_language)
        .bind(&record.contract_type)
        .bind(&record.cooperative_affiliation)
        .bind(buyer_contacts)
        .bind(supplier_contacts)
        .fetch_one(&mut **tx)
        .await?
        .try_get("id")?;

        for doc in record.documents.values().flatten() {
            sqlx::query(
                r#"
                INSERT INTO escnj_documents
                    (contract_id, category, document_name, human_name, size_bytes, stored_path)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (contract_id, category, document_name) DO UPDATE SET
                    size_bytes = EXCLUDED.size_bytes,
                    stored_path = EXCLUDED.stored_path
                "#,
            )
            .bind(contract_id)
            .bind(doc.category.as_str())
            .bind(&doc.document_name)
            .bind(&doc.human_name)
            .bind(doc.size_bytes as i64)
            .bind(doc.stored_path.as_ref().map(|p| p.display().to_string()))
            .execute(&mut **tx)
            .await?;
        }

        Ok(contract_id)
    }
}

#[async_trait]
impl RecordSink for PostgresSink {
    async fn save(&mut self, record: &ContractRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::save_record_tx(&mut tx, record).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_batch(&mut self, records: &[ContractRecord]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut saved = 0usize;

        for record in records {
            Self::save_record_tx(&mut tx, record).await?;
            saved += 1;
        }

        tx.commit().await?;
        Ok(saved)
    }
}
