//! One evaluation run: parse the dump, judge each chunk, score the ranking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::eval::{calculate_metrics, MetricsOutcome};
use super::judgment::{ask_corpus_estimate, collect_judgments, JudgeInput, JudgeTokens, JudgedReference};
use super::references::{parse_document_references, SkippedLine};
use crate::error::Result;
use crate::storage::ContentLookup;
use crate::types::{CorpusRelevantEstimate, DocumentReference};

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// The query the results were retrieved for; informational only
    pub query: String,
    /// Skips the interactive estimate prompt when set
    pub corpus_estimate: Option<CorpusRelevantEstimate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub query: String,
    pub evaluated_at: DateTime<Utc>,
    pub corpus_estimate: CorpusRelevantEstimate,
    pub judged: Vec<JudgedReference>,
    pub unresolved: Vec<DocumentReference>,
    pub skipped_lines: Vec<SkippedLine>,
    pub outcome: MetricsOutcome,
}

/// Run a full evaluation session.
///
/// A malformed dump fails before any chunk is looked up or shown. If the judge
/// input closes part way, the whole session fails with
/// [`EvalError::Interrupted`](crate::EvalError::Interrupted) and nothing is scored.
pub async fn run_session<L, J>(
    dump: &str,
    options: &SessionOptions,
    lookup: &L,
    judge: &mut J,
    tokens: &JudgeTokens,
) -> Result<SessionReport>
where
    L: ContentLookup + ?Sized,
    J: JudgeInput + ?Sized,
{
    let session_id = Uuid::new_v4();

    let parsed = parse_document_references(dump)?;
    let references = parsed.references();
    let skipped_lines = parsed.skipped();
    for skipped in &skipped_lines {
        tracing::warn!(line = skipped.line, reason = ?skipped.reason, "Skipped dump line");
    }

    tracing::info!(
        %session_id,
        references = references.len(),
        skipped = skipped_lines.len(),
        "Starting evaluation session"
    );

    if !options.query.is_empty() {
        judge.show(&format!("Query: {}", options.query))?;
    }

    let collected = collect_judgments(&references, lookup, judge, tokens).await?;

    let corpus_estimate = match options.corpus_estimate {
        Some(estimate) => estimate,
        None => ask_corpus_estimate(judge)?,
    };

    let outcome = calculate_metrics(&collected.judgments(), corpus_estimate);

    match &outcome {
        MetricsOutcome::Scored(result) => tracing::info!(
            %session_id,
            judged = result.total_retrieved,
            relevant = result.total_relevant,
            unresolved = collected.unresolved.len(),
            average_precision = result.average_precision,
            "Evaluation complete"
        ),
        MetricsOutcome::NoRelevantDocuments { total_retrieved } => tracing::info!(
            %session_id,
            judged = total_retrieved,
            unresolved = collected.unresolved.len(),
            "Evaluation complete, no relevant documents"
        ),
    }

    Ok(SessionReport {
        session_id,
        query: options.query.clone(),
        evaluated_at: Utc::now(),
        corpus_estimate,
        judged: collected.judged,
        unresolved: collected.unresolved,
        skipped_lines,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::rag::judgment::{ConsoleJudge, ScriptedJudge};
    use crate::rag::report::format_json;
    use crate::storage::InMemoryChunkStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DUMP: &str = "
Relevant Document 0, NASDAQ_TSLA_2023.txt, chunk index 1
Relevant Document 1, NASDAQ_TSLA_2022.txt, chunk index 13
not a reference
Relevant Document 2, NASDAQ_TSLA_2023.txt, chunk index 7
Relevant Document 3, NASDAQ_TSLA_2021.txt, chunk index 2
Relevant Document 4, NASDAQ_TSLA_2023.txt, chunk index 9
";

    fn store() -> InMemoryChunkStore {
        let mut store = InMemoryChunkStore::new();
        store.insert("NASDAQ_TSLA_2023.txt", 1, "Energy storage deployments grew 125%");
        store.insert("NASDAQ_TSLA_2022.txt", 13, "Automotive regulatory credits");
        store.insert("NASDAQ_TSLA_2023.txt", 7, "Megapack factory ramp in Lathrop");
        store.insert("NASDAQ_TSLA_2023.txt", 9, "Solar deployments declined");
        store
    }

    /// Counts lookups so tests can assert none happened.
    struct CountingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentLookup for CountingStore {
        async fn fetch_chunk(&self, _: &str, _: u64) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some("text".to_string()))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl ContentLookup for BrokenStore {
        async fn fetch_chunk(&self, _: &str, _: u64) -> anyhow::Result<Option<String>> {
            Err(anyhow!("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_full_session() {
        // 2021 chunk 2 is missing from the store, so four prompts then the estimate
        let mut judge = ScriptedJudge::new(["y", "n", "maybe", "y", "y", "five", "5"]);
        let options = SessionOptions {
            query: "How does Tesla evaluate its energy segment growth?".to_string(),
            corpus_estimate: None,
        };

        let report = run_session(DUMP, &options, &store(), &mut judge, &JudgeTokens::default())
            .await
            .unwrap();

        assert_eq!(report.corpus_estimate.get(), 5);
        assert_eq!(report.unresolved, vec![DocumentReference::new("NASDAQ_TSLA_2021.txt", 2)]);
        assert_eq!(report.skipped_lines.len(), 1);
        assert_eq!(report.skipped_lines[0].line, 4);
        assert_eq!(judge.remaining(), 0);

        let result = report.outcome.result().unwrap();
        // judged count, not the parsed count
        assert_eq!(result.total_retrieved, 4);
        assert_eq!(result.total_relevant, 3);
        assert!((result.average_precision - (1.0 + 2.0 / 3.0 + 0.75) / 3.0).abs() < 1e-9);
        assert!(judge.shown[0].starts_with("Query: How does Tesla"));
    }

    #[tokio::test]
    async fn test_console_dialogue_stays_out_of_json_report() {
        let input = std::io::Cursor::new("y\nn\ny\nn\n4\n");
        let mut dialogue = Vec::new();
        let report = {
            let mut judge = ConsoleJudge::new(input, &mut dialogue);
            run_session(DUMP, &SessionOptions::default(), &store(), &mut judge, &JudgeTokens::default())
                .await
                .unwrap()
        };

        let json = format_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"]["total_retrieved"], 4);
        assert!(!json.contains("Relevant to the query?"));

        let dialogue = String::from_utf8(dialogue).unwrap();
        assert!(dialogue.contains("Energy storage deployments grew 125%"));
        assert!(dialogue.contains("Relevant to the query?"));
    }

    #[tokio::test]
    async fn test_estimate_option_skips_prompt() {
        let mut judge = ScriptedJudge::new(["n", "n", "n", "n"]);
        let options = SessionOptions {
            query: String::new(),
            corpus_estimate: CorpusRelevantEstimate::new(10),
        };

        let report = run_session(DUMP, &options, &store(), &mut judge, &JudgeTokens::default())
            .await
            .unwrap();

        assert_eq!(judge.prompts.len(), 4);
        assert_eq!(
            report.outcome,
            MetricsOutcome::NoRelevantDocuments { total_retrieved: 4 }
        );
    }

    #[tokio::test]
    async fn test_malformed_dump_fails_before_lookup() {
        let lookup = CountingStore {
            calls: AtomicUsize::new(0),
        };
        let mut judge = ScriptedJudge::new(["y", "y", "3"]);
        let dump = "a.txt, chunk index 1\nb.txt, chunk index one";

        let err = run_session(dump, &SessionOptions::default(), &lookup, &mut judge, &JudgeTokens::default())
            .await
            .unwrap_err();

        assert!(matches!(err, EvalError::Format { line: 2, .. }));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
        assert!(judge.prompts.is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_during_estimate_produces_no_report() {
        let mut judge = ScriptedJudge::new(["y", "n", "y", "y"]);
        let err = run_session(DUMP, &SessionOptions::default(), &store(), &mut judge, &JudgeTokens::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::Interrupted));
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal() {
        let mut judge = ScriptedJudge::new(["y"]);
        let err = run_session(DUMP, &SessionOptions::default(), &BrokenStore, &mut judge, &JudgeTokens::default())
            .await
            .unwrap_err();

        match err {
            EvalError::Lookup { document_id, chunk_index, .. } => {
                assert_eq!(document_id, "NASDAQ_TSLA_2023.txt");
                assert_eq!(chunk_index, 1);
            }
            other => panic!("expected lookup error, got {other:?}"),
        }
    }
}
