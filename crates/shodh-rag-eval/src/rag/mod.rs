//! Retrieval evaluation: reference parsing, relevance judgments, metrics and reporting.

pub mod eval;
pub mod judgment;
pub mod references;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use eval::{calculate_metrics, EvaluationResult, MetricsAtK, MetricsOutcome};
pub use judgment::{
    ask_corpus_estimate, ask_judgment, collect_judgments, CollectedJudgments, ConsoleJudge,
    EstimateState, JudgeInput, JudgeTokens, JudgedReference, JudgmentState, ScriptedJudge,
};
pub use references::{
    parse_document_references, render_document_references, ParsedLine, ParsedReferences,
    SkipReason, SkippedLine,
};
pub use report::{format_json, format_outcome, format_report, format_session_report};
pub use session::{run_session, SessionOptions, SessionReport};
