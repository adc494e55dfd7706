use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// One retrieved unit: a chunk of a document at a given position in that document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentReference {
    pub document_id: String,
    pub chunk_index: u64,
}

impl DocumentReference {
    pub fn new(document_id: impl Into<String>, chunk_index: u64) -> Self {
        Self {
            document_id: document_id.into(),
            chunk_index,
        }
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, chunk index {}", self.document_id, self.chunk_index)
    }
}

/// References in retrieval order; index 0 is rank 1.
pub type RankedReferenceList = Vec<DocumentReference>;

/// The judge's estimate of how many relevant chunks exist in the whole corpus.
///
/// Always strictly positive. It is a guess, not ground truth, and may even be
/// smaller than the number of relevant chunks actually retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorpusRelevantEstimate(NonZeroU64);

impl CorpusRelevantEstimate {
    /// Returns `None` for zero.
    pub fn new(count: u64) -> Option<Self> {
        NonZeroU64::new(count).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Parses a judge answer such as `" 12 "`. Zero, negatives and non-numbers are rejected.
    pub fn parse(input: &str) -> Option<Self> {
        input.trim().parse::<u64>().ok().and_then(Self::new)
    }
}

impl fmt::Display for CorpusRelevantEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rejects_zero() {
        assert!(CorpusRelevantEstimate::new(0).is_none());
        assert_eq!(CorpusRelevantEstimate::new(5).map(|e| e.get()), Some(5));
    }

    #[test]
    fn test_estimate_parse() {
        assert_eq!(CorpusRelevantEstimate::parse(" 12 ").map(|e| e.get()), Some(12));
        assert!(CorpusRelevantEstimate::parse("0").is_none());
        assert!(CorpusRelevantEstimate::parse("-3").is_none());
        assert!(CorpusRelevantEstimate::parse("many").is_none());
        assert!(CorpusRelevantEstimate::parse("").is_none());
    }

    #[test]
    fn test_estimate_serde_is_plain_number() {
        let estimate = CorpusRelevantEstimate::new(7).unwrap();
        assert_eq!(serde_json::to_string(&estimate).unwrap(), "7");
        assert!(serde_json::from_str::<CorpusRelevantEstimate>("0").is_err());
    }

    #[test]
    fn test_reference_display_matches_dump_format() {
        let reference = DocumentReference::new("NASDAQ_META_2024.txt", 277);
        assert_eq!(reference.to_string(), "NASDAQ_META_2024.txt, chunk index 277");
    }
}
