use anyhow::Result;

use super::eval::{EvaluationResult, MetricsOutcome};
use super::session::SessionReport;

/// Format evaluation metrics as a human-readable report.
pub fn format_report(result: &EvaluationResult, decimals: usize) -> String {
    let mut report = String::new();

    report.push_str(&format!("Total Retrieved: {}\n", result.total_retrieved));
    report.push_str(&format!("Total Relevant: {}\n", result.total_relevant));
    report.push_str(&format!(
        "Total Relevant (estimated, all chunks): {}\n",
        result.total_relevant_whole
    ));
    report.push_str(&format!(
        "\nAverage Precision (AP): {:.*}\n\n",
        decimals, result.average_precision
    ));

    report.push_str(&format!(
        "{:<5} {:<16} {:<16} {:<20} {:<16} {:<16}\n",
        "k", "Precision", "Recall", "~Recall (all chunks)", "F1", "F1 (all chunks)"
    ));
    report.push_str(&"-".repeat(94));
    report.push('\n');
    for m in &result.metrics_at_k {
        report.push_str(&format!(
            "{:<5} {:<16.prec$} {:<16.prec$} {:<20.prec$} {:<16.prec$} {:<16.prec$}\n",
            m.k,
            m.precision,
            m.recall,
            m.recall_grounded,
            m.f1,
            m.f1_grounded,
            prec = decimals
        ));
    }

    report
}

pub fn format_outcome(outcome: &MetricsOutcome, decimals: usize) -> String {
    match outcome {
        MetricsOutcome::Scored(result) => format_report(result, decimals),
        MetricsOutcome::NoRelevantDocuments { total_retrieved } => format!(
            "No relevant documents: none of the {} judged results were relevant, \
             so Average Precision is undefined.\n",
            total_retrieved
        ),
    }
}

/// Full session report: query, metrics and everything that was left out.
pub fn format_session_report(session: &SessionReport, decimals: usize) -> String {
    let rule = "=".repeat(80);
    let mut report = String::new();

    report.push_str(&format!("\n\n{rule}\nEVALUATION RESULTS\n{rule}\n\n"));
    if !session.query.is_empty() {
        report.push_str(&format!("Query: {}\n", session.query));
    }
    report.push_str(&format_outcome(&session.outcome, decimals));

    if !session.unresolved.is_empty() {
        report.push_str(&format!(
            "\n--- Unresolved references ({}, not judged) ---\n",
            session.unresolved.len()
        ));
        for reference in &session.unresolved {
            report.push_str(&format!("  - {}\n", reference));
        }
    }

    if !session.skipped_lines.is_empty() {
        report.push_str(&format!(
            "\n--- Skipped dump lines ({}) ---\n",
            session.skipped_lines.len()
        ));
        for skipped in &session.skipped_lines {
            report.push_str(&format!("  - line {}: {:?}\n", skipped.line, skipped.reason));
        }
    }

    report
}

pub fn format_json(session: &SessionReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(session)?)
}
