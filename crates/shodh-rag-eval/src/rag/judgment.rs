//! Relevance judgment collection
//!
//! Walks ranked references in order, shows each resolved chunk to a judge and
//! blocks until a yes/no answer is given. Input handling is a pair of small
//! state machines driven by a [`JudgeInput`] so tests can script the judge.

use serde::Serialize;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::config::JudgeConfig;
use crate::error::{EvalError, Result};
use crate::storage::ContentLookup;
use crate::types::{CorpusRelevantEstimate, DocumentReference};

const RULE_WIDTH: usize = 80;

/// Channel to whoever decides relevance.
pub trait JudgeInput {
    /// Display text to the judge.
    fn show(&mut self, text: &str) -> io::Result<()>;

    /// Ask for one line of input. `None` means the channel is closed.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Judge on a terminal (or any reader/writer pair).
pub struct ConsoleJudge<R, W> {
    reader: R,
    writer: W,
}

impl ConsoleJudge<io::StdinLock<'static>, io::Stderr> {
    /// Answers from stdin, dialogue on stderr. Stdout is left to the report.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> ConsoleJudge<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> JudgeInput for ConsoleJudge<R, W> {
    fn show(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", text)
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.writer, "{}", prompt)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Replays canned answers and records everything shown and asked.
#[derive(Debug, Default)]
pub struct ScriptedJudge {
    answers: VecDeque<String>,
    pub shown: Vec<String>,
    pub prompts: Vec<String>,
}

impl ScriptedJudge {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl JudgeInput for ScriptedJudge {
    fn show(&mut self, text: &str) -> io::Result<()> {
        self.shown.push(text.to_string());
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }
}

/// Recognised yes/no answers.
#[derive(Debug, Clone)]
pub struct JudgeTokens {
    affirmative: Vec<String>,
    negative: Vec<String>,
}

impl JudgeTokens {
    pub fn new(affirmative: &[String], negative: &[String]) -> Self {
        let normalize = |tokens: &[String]| -> Vec<String> {
            tokens
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };
        Self {
            affirmative: normalize(affirmative),
            negative: normalize(negative),
        }
    }

    /// `Some(true)` for an affirmative answer, `Some(false)` for negative, `None` otherwise.
    pub fn classify(&self, answer: &str) -> Option<bool> {
        let answer = answer.trim().to_lowercase();
        if self.affirmative.contains(&answer) {
            Some(true)
        } else if self.negative.contains(&answer) {
            Some(false)
        } else {
            None
        }
    }

    fn prompt(&self) -> String {
        format!(
            "\nRelevant to the query? ({}/{}): ",
            self.affirmative.first().map(String::as_str).unwrap_or("y"),
            self.negative.first().map(String::as_str).unwrap_or("n")
        )
    }

    fn hint(&self) -> String {
        format!(
            "Please answer one of: {}",
            self.affirmative
                .iter()
                .chain(&self.negative)
                .map(|t| format!("'{}'", t))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Default for JudgeTokens {
    fn default() -> Self {
        Self::from(&JudgeConfig::default())
    }
}

impl From<&JudgeConfig> for JudgeTokens {
    fn from(config: &JudgeConfig) -> Self {
        Self::new(&config.affirmative, &config.negative)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgmentState {
    AwaitingJudgment,
    Recorded(bool),
}

impl JudgmentState {
    /// Feed one answer. Unrecognised answers leave the state unchanged.
    pub fn advance(self, answer: &str, tokens: &JudgeTokens) -> Self {
        match self {
            Self::AwaitingJudgment => tokens
                .classify(answer)
                .map_or(Self::AwaitingJudgment, Self::Recorded),
            recorded => recorded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateState {
    AwaitingEstimate,
    Recorded(CorpusRelevantEstimate),
}

impl EstimateState {
    pub fn advance(self, answer: &str) -> Self {
        match self {
            Self::AwaitingEstimate => CorpusRelevantEstimate::parse(answer)
                .map_or(Self::AwaitingEstimate, Self::Recorded),
            recorded => recorded,
        }
    }
}

/// Ask until the judge gives a recognised yes/no answer.
pub fn ask_judgment<J: JudgeInput + ?Sized>(judge: &mut J, tokens: &JudgeTokens) -> Result<bool> {
    let prompt = tokens.prompt();
    let mut state = JudgmentState::AwaitingJudgment;

    loop {
        let answer = judge.ask(&prompt)?.ok_or(EvalError::Interrupted)?;
        state = state.advance(&answer, tokens);
        match state {
            JudgmentState::Recorded(relevant) => return Ok(relevant),
            JudgmentState::AwaitingJudgment => {
                tracing::debug!(answer = %answer.trim(), "Unrecognised judgment");
                judge.show(&tokens.hint())?;
            }
        }
    }
}

/// Ask until the judge gives a positive integer.
pub fn ask_corpus_estimate<J: JudgeInput + ?Sized>(judge: &mut J) -> Result<CorpusRelevantEstimate> {
    let prompt = "Estimated number of relevant chunks in the whole corpus \
                  (guess from how many chunks were indexed): ";
    let mut state = EstimateState::AwaitingEstimate;

    loop {
        let answer = judge.ask(prompt)?.ok_or(EvalError::Interrupted)?;
        state = state.advance(&answer);
        match state {
            EstimateState::Recorded(estimate) => return Ok(estimate),
            EstimateState::AwaitingEstimate => {
                judge.show("Should be a positive whole number")?;
            }
        }
    }
}

/// A reference that was resolved and judged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgedReference {
    /// 1-based rank among judged references
    pub rank: usize,
    #[serde(flatten)]
    pub reference: DocumentReference,
    pub relevant: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedJudgments {
    pub judged: Vec<JudgedReference>,
    /// References the store could not resolve, in rank order
    pub unresolved: Vec<DocumentReference>,
}

impl CollectedJudgments {
    /// Judgments in rank order, ready for the metrics calculator.
    pub fn judgments(&self) -> Vec<bool> {
        self.judged.iter().map(|j| j.relevant).collect()
    }
}

/// Resolve, display and judge each reference in rank order.
///
/// References missing from the store get no judgment and are listed in
/// [`CollectedJudgments::unresolved`]; metrics are computed over the judged
/// references only.
pub async fn collect_judgments<L, J>(
    references: &[DocumentReference],
    lookup: &L,
    judge: &mut J,
    tokens: &JudgeTokens,
) -> Result<CollectedJudgments>
where
    L: ContentLookup + ?Sized,
    J: JudgeInput + ?Sized,
{
    let total = references.len();
    let mut collected = CollectedJudgments::default();

    for (idx, reference) in references.iter().enumerate() {
        let position = idx + 1;

        let content = lookup
            .fetch_chunk(&reference.document_id, reference.chunk_index)
            .await
            .map_err(|e| EvalError::Lookup {
                document_id: reference.document_id.clone(),
                chunk_index: reference.chunk_index,
                source: e.into(),
            })?;

        let Some(content) = content else {
            tracing::warn!(
                document_id = %reference.document_id,
                chunk_index = reference.chunk_index,
                "Could not find chunk, skipping"
            );
            judge.show(&format!(
                "\n[{}/{}] WARNING: could not find {}",
                position, total, reference
            ))?;
            collected.unresolved.push(reference.clone());
            continue;
        };

        let rule = "=".repeat(RULE_WIDTH);
        judge.show(&format!(
            "\n{rule}\n[{position}/{total}] {reference}\n{rule}\n{content}\n{rule}"
        ))?;

        let relevant = ask_judgment(judge, tokens)?;
        collected.judged.push(JudgedReference {
            rank: collected.judged.len() + 1,
            reference: reference.clone(),
            relevant,
        });
    }

    Ok(collected)
}
