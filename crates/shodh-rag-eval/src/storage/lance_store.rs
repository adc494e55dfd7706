use anyhow::{bail, Context, Result};
use arrow_array::{Array, RecordBatch, StringArray};
use async_trait::async_trait;
use lancedb::query::{ExecutableQuery, QueryBase, Select};

use super::ContentLookup;
use crate::config::StoreConfig;

const CHUNK_INDEX_COLUMN: &str = "chunk_index";
const TEXT_COLUMN: &str = "text";

/// Read-only view over the chunk table written by the indexing pipeline.
pub struct LanceChunkStore {
    table: lancedb::Table,
    document_column: String,
}

impl LanceChunkStore {
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let path = config.path.to_string_lossy();
        let db = lancedb::connect(&path)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        let table = db
            .open_table(&config.table_name)
            .execute()
            .await
            .with_context(|| {
                format!(
                    "Failed to open table '{}' in {}",
                    config.table_name,
                    config.path.display()
                )
            })?;

        let schema = table.schema().await.context("Failed to read table schema")?;
        for column in [
            config.document_column.as_str(),
            CHUNK_INDEX_COLUMN,
            TEXT_COLUMN,
        ] {
            if schema.column_with_name(column).is_none() {
                bail!(
                    "Table '{}' has no '{}' column",
                    config.table_name,
                    column
                );
            }
        }

        tracing::debug!(
            table = %config.table_name,
            document_column = %config.document_column,
            "Opened chunk table"
        );

        Ok(Self {
            table,
            document_column: config.document_column.clone(),
        })
    }
}

#[async_trait]
impl ContentLookup for LanceChunkStore {
    async fn fetch_chunk(&self, document_id: &str, chunk_index: u64) -> Result<Option<String>> {
        // The indexing pipeline writes chunk_index as UInt32
        if u32::try_from(chunk_index).is_err() {
            return Ok(None);
        }

        let predicate = format!(
            "{} = '{}' AND {} = {}",
            self.document_column,
            document_id.replace('\'', "''"),
            CHUNK_INDEX_COLUMN,
            chunk_index
        );

        let results = self
            .table
            .query()
            .only_if(predicate)
            .select(Select::columns(&[TEXT_COLUMN]))
            .limit(1)
            .execute()
            .await
            .context("LanceDB chunk lookup failed")?;

        let batches: Vec<RecordBatch> = futures::TryStreamExt::try_collect(results).await?;
        Ok(first_text(&batches))
    }
}

fn first_text(batches: &[RecordBatch]) -> Option<String> {
    batches
        .iter()
        .filter_map(|batch| {
            batch
                .column_by_name(TEXT_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        })
        .find(|texts| !texts.is_empty())
        .map(|texts| texts.value(0).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{RecordBatchIterator, UInt32Array};
    use arrow_schema::{DataType, Field, Schema};
    use std::sync::Arc;

    async fn seed_table(dir: &std::path::Path) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("source", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("text", DataType::Utf8, false),
        ]));

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![
                    "NASDAQ_TSLA_2023.txt",
                    "NASDAQ_TSLA_2023.txt",
                    "O'Reilly_2022.txt",
                ])) as Arc<dyn Array>,
                Arc::new(UInt32Array::from(vec![0u32, 1, 0])),
                Arc::new(StringArray::from(vec![
                    "Energy storage deployments reached 14.7 GWh",
                    "Megapack margins improved",
                    "Parts distribution",
                ])),
            ],
        )
        .unwrap();

        let db = lancedb::connect(&dir.to_string_lossy())
            .execute()
            .await
            .unwrap();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
        db.create_table("documents", Box::new(batches))
            .execute()
            .await
            .unwrap();
    }

    fn config_for(dir: &std::path::Path) -> StoreConfig {
        StoreConfig {
            path: dir.to_path_buf(),
            ..StoreConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_chunk_by_document_and_index() {
        let dir = tempfile::tempdir().unwrap();
        seed_table(dir.path()).await;

        let store = LanceChunkStore::open(&config_for(dir.path())).await.unwrap();

        let text = store.fetch_chunk("NASDAQ_TSLA_2023.txt", 1).await.unwrap();
        assert_eq!(text.as_deref(), Some("Megapack margins improved"));

        let quoted = store.fetch_chunk("O'Reilly_2022.txt", 0).await.unwrap();
        assert_eq!(quoted.as_deref(), Some("Parts distribution"));

        assert!(store.fetch_chunk("NASDAQ_TSLA_2023.txt", 9).await.unwrap().is_none());
        assert!(store
            .fetch_chunk("NASDAQ_TSLA_2023.txt", u64::from(u32::MAX) + 1)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_open_rejects_missing_document_column() {
        let dir = tempfile::tempdir().unwrap();
        seed_table(dir.path()).await;

        let mut config = config_for(dir.path());
        config.document_column = "doc_name".to_string();

        let err = LanceChunkStore::open(&config).await.err().unwrap();
        assert!(err.to_string().contains("doc_name"));
    }

    #[tokio::test]
    async fn test_open_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LanceChunkStore::open(&config_for(dir.path())).await.is_err());
    }
}
