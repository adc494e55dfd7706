use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::ContentLookup;

/// A chunk exported from the index, as stored in a JSON chunk file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub document_id: String,
    pub chunk_index: u64,
    pub text: String,
}

/// Map-backed lookup for offline evaluation against an exported chunk file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChunkStore {
    chunks: HashMap<(String, u64), String>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document_id: impl Into<String>, chunk_index: u64, text: impl Into<String>) {
        self.chunks
            .insert((document_id.into(), chunk_index), text.into());
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Load a JSON array of [`ChunkEntry`]. Later entries win on duplicate keys.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chunk file {}", path.display()))?;
        let entries: Vec<ChunkEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse chunk file {}", path.display()))?;

        let store: Self = entries.into_iter().collect();
        tracing::debug!(chunks = store.len(), path = %path.display(), "Loaded chunk file");
        Ok(store)
    }
}

impl FromIterator<ChunkEntry> for InMemoryChunkStore {
    fn from_iter<I: IntoIterator<Item = ChunkEntry>>(iter: I) -> Self {
        let mut store = Self::new();
        for entry in iter {
            store.insert(entry.document_id, entry.chunk_index, entry.text);
        }
        store
    }
}

#[async_trait]
impl ContentLookup for InMemoryChunkStore {
    async fn fetch_chunk(&self, document_id: &str, chunk_index: u64) -> Result<Option<String>> {
        Ok(self
            .chunks
            .get(&(document_id.to_string(), chunk_index))
            .cloned())
    }
}
