use thiserror::Error;

/// Errors that end an evaluation session.
///
/// Recoverable conditions (skipped dump lines, unresolved chunks, invalid
/// judge answers) never surface here; they are reported alongside the result.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A dump line carried the `, chunk index ` separator but no valid integer after it.
    #[error("malformed chunk index on line {line}: {text:?}")]
    Format { line: usize, text: String },

    /// The judge input closed (EOF or interrupt) before every reference was judged.
    #[error("judge input closed before the evaluation finished")]
    Interrupted,

    #[error("content lookup failed for {document_id}, chunk index {chunk_index}")]
    Lookup {
        document_id: String,
        chunk_index: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = EvalError> = std::result::Result<T, E>;
