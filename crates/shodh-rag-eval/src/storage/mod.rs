//! Chunk content lookup
//!
//! The evaluator never writes to the store; it only resolves a
//! `(document_id, chunk_index)` pair back to the chunk text that was indexed.

pub mod lance_store;
pub mod memory;

pub use lance_store::LanceChunkStore;
pub use memory::InMemoryChunkStore;

use anyhow::Result;
use async_trait::async_trait;

/// Resolves a retrieved reference to the text shown to the judge.
#[async_trait]
pub trait ContentLookup: Send + Sync {
    /// `Ok(None)` means the chunk is not in the store; `Err` means the store itself failed.
    async fn fetch_chunk(&self, document_id: &str, chunk_index: u64) -> Result<Option<String>>;
}
