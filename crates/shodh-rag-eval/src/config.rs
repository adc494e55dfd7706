use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::EvalError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub store: StoreConfig,
    pub judge: JudgeConfig,
    pub report: ReportConfig,
}

/// Where retrieved chunks are looked up for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// LanceDB directory written by the indexing pipeline
    pub path: PathBuf,
    pub table_name: String,
    /// Column holding the document identifier that appears in reference dumps
    pub document_column: String,
}

/// Answers accepted from the judge, compared trimmed and case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub affirmative: Vec<String>,
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Digits after the decimal point in the metrics table
    pub decimals: usize,
}

impl EvalConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.store.table_name.trim().is_empty() {
            return Err("store.table_name must not be empty".into());
        }
        if !is_column_name(&self.store.document_column) {
            return Err(format!(
                "store.document_column must be a plain column name, got {:?}",
                self.store.document_column
            ));
        }
        if self.judge.affirmative.iter().all(|t| t.trim().is_empty()) {
            return Err("judge.affirmative needs at least one token".into());
        }
        if self.judge.negative.iter().all(|t| t.trim().is_empty()) {
            return Err("judge.negative needs at least one token".into());
        }
        for token in &self.judge.affirmative {
            let token = token.trim();
            if !token.is_empty()
                && self
                    .judge
                    .negative
                    .iter()
                    .any(|n| n.trim().eq_ignore_ascii_case(token))
            {
                return Err(format!(
                    "judge token {:?} is both affirmative and negative",
                    token
                ));
            }
        }
        if self.report.decimals > 10 {
            return Err("report.decimals must be <= 10".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, EvalError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EvalError::Config(format!("Failed to read config file: {}", e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate().map_err(EvalError::Config)?;
        Ok(config)
    }
}

fn is_column_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shodh-rag");

        Self {
            path: data_dir.join("lance_data"),
            table_name: "documents".to_string(),
            document_column: "source".to_string(),
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            affirmative: vec!["y".to_string(), "yes".to_string()],
            negative: vec!["n".to_string(), "no".to_string()],
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { decimals: 4 }
    }
}
