// src/generator.rs

//! Question generation collaborator.
//!
//! Uploaded material goes to an external command on stdin; the command prints
//! a JSON array of `{question, options, answer}` objects on stdout.

use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::{io::AsyncWriteExt, process::Command};
use validator::Validate;

use crate::{config::Config, error::AppError, models::question::QuestionDraft};

/// Generators often wrap their JSON in a markdown fence.
static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n\s*```").expect("static regex"));

pub type DynGenerator = Arc<dyn QuestionGenerator>;

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Either every generated question is valid, or the whole call fails.
    async fn generate(&self, material: &[u8]) -> Result<Vec<QuestionDraft>, AppError>;
}

/// Runs an external program once per upload.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessGenerator {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.generator_command.clone(), config.generator_args.clone())
            .with_timeout(Duration::from_secs(config.generator_timeout_secs))
    }
}

#[async_trait]
impl QuestionGenerator for ProcessGenerator {
    async fn generate(&self, material: &[u8]) -> Result<Vec<QuestionDraft>, AppError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::GenerationFailed(format!("failed to start '{}': {}", self.command, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or(AppError::GenerationFailed("generator stdin unavailable".to_string()))?;

        // Feed stdin while stdout is drained so neither pipe can fill up and stall.
        let input = material.to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        // Dropping the child on expiry kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AppError::GenerationFailed(format!(
                    "generator timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::GenerationFailed(format!("generator did not finish: {}", e)))?;

        match writer.await {
            Ok(Err(e)) => tracing::warn!("Generator stopped reading its input: {}", e),
            Err(e) => tracing::warn!("Generator input task failed: {}", e),
            Ok(Ok(())) => {}
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(AppError::GenerationFailed(format!(
                "generator exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if !stderr.trim().is_empty() {
            tracing::warn!("Generator stderr: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let drafts = parse_generated(&stdout)?;
        tracing::info!("Generated {} question(s)", drafts.len());
        Ok(drafts)
    }
}

/// Parses generator output. Malformed JSON, an empty list, or any question
/// without exactly four options fails the whole batch.
pub fn parse_generated(output: &str) -> Result<Vec<QuestionDraft>, AppError> {
    let body = FENCED_JSON
        .captures(output)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .unwrap_or(output)
        .trim();

    let drafts: Vec<QuestionDraft> = serde_json::from_str(body)
        .map_err(|e| AppError::GenerationFailed(format!("malformed generator output: {}", e)))?;

    if drafts.is_empty() {
        return Err(AppError::GenerationFailed(
            "generator returned no questions".to_string(),
        ));
    }

    for (position, draft) in drafts.iter().enumerate() {
        draft.validate().map_err(|e| {
            AppError::GenerationFailed(format!("generated question {} is invalid: {}", position + 1, e))
        })?;
    }

    Ok(drafts)
}
