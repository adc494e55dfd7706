pub mod config;
pub mod error;
pub mod rag;
pub mod storage;
pub mod types;

// Re-export primary types for convenience
pub use config::EvalConfig;
pub use error::{EvalError, Result};
pub use rag::{
    calculate_metrics, parse_document_references, run_session, EvaluationResult, MetricsAtK,
    MetricsOutcome, SessionOptions, SessionReport,
};
pub use storage::{ContentLookup, InMemoryChunkStore, LanceChunkStore};
pub use types::{CorpusRelevantEstimate, DocumentReference, RankedReferenceList};
