//! Retrieval Evaluation Metrics
//!
//! Scores one ranked result list from binary relevance judgments:
//! - Precision@K: fraction of the top K results judged relevant
//! - Recall@K: fraction of the relevant results (within the retrieved set) found in the top K
//! - Grounded Recall@K: top-K hits divided by the judge's estimate of relevant chunks
//!   in the whole corpus
//! - F1@K for both recall variants
//! - AP (Average Precision): mean of Precision@K over the ranks holding a relevant result
//!
//! All values are computed in one pass over the judgments and left unrounded.

use serde::{Deserialize, Serialize};

use crate::types::CorpusRelevantEstimate;

/// Metrics at one cutoff `k` (1-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsAtK {
    pub k: usize,
    /// Relevant results within the top `k`
    pub relevant_retrieved: usize,
    pub precision: f64,
    pub recall: f64,
    /// Recall against the corpus estimate; exceeds 1.0 when the estimate is too low
    pub recall_grounded: f64,
    pub f1: f64,
    pub f1_grounded: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// One entry per rank, `k = 1..=total_retrieved`
    pub metrics_at_k: Vec<MetricsAtK>,
    pub average_precision: f64,
    /// Judged relevant among the retrieved results
    pub total_relevant: usize,
    /// The judge's estimate for the whole corpus
    pub total_relevant_whole: u64,
    /// Number of judged results
    pub total_retrieved: usize,
}

/// Average Precision is undefined without a single relevant result, so that
/// case is a separate variant rather than a zero or NaN score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricsOutcome {
    Scored(EvaluationResult),
    NoRelevantDocuments { total_retrieved: usize },
}

impl MetricsOutcome {
    pub fn result(&self) -> Option<&EvaluationResult> {
        match self {
            Self::Scored(result) => Some(result),
            Self::NoRelevantDocuments { .. } => None,
        }
    }

    pub fn total_retrieved(&self) -> usize {
        match self {
            Self::Scored(result) => result.total_retrieved,
            Self::NoRelevantDocuments { total_retrieved } => *total_retrieved,
        }
    }
}

/// Compute metrics for judgments given in rank order.
pub fn calculate_metrics(judgments: &[bool], estimate: CorpusRelevantEstimate) -> MetricsOutcome {
    let n = judgments.len();
    let total_relevant = judgments.iter().filter(|&&relevant| relevant).count();

    if total_relevant == 0 {
        return MetricsOutcome::NoRelevantDocuments { total_retrieved: n };
    }

    let relevant = total_relevant as f64;
    let whole = estimate.get() as f64;

    let mut metrics_at_k = Vec::with_capacity(n);
    let mut true_positives = 0usize;
    let mut precision_sum = 0.0;

    for (idx, &is_relevant) in judgments.iter().enumerate() {
        let k = idx + 1;
        if is_relevant {
            true_positives += 1;
        }

        let tp = true_positives as f64;
        let precision = tp / k as f64;
        let recall = tp / relevant;
        let recall_grounded = tp / whole;

        // Only ranks that are themselves relevant contribute to AP
        if is_relevant {
            precision_sum += precision;
        }

        metrics_at_k.push(MetricsAtK {
            k,
            relevant_retrieved: true_positives,
            precision,
            recall,
            recall_grounded,
            f1: harmonic_mean(precision, recall),
            f1_grounded: harmonic_mean(precision, recall_grounded),
        });
    }

    MetricsOutcome::Scored(EvaluationResult {
        metrics_at_k,
        average_precision: precision_sum / relevant,
        total_relevant,
        total_relevant_whole: estimate.get(),
        total_retrieved: n,
    })
}

fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}
