//! Completion responses and the shared JSON extraction step.
//!
//! Every pipeline stage asks the model for a bare JSON object. Models still
//! wrap the object in markdown fences from time to time, so the text is
//! unwrapped before parsing. A response that does not yield the stage's JSON
//! shape fails the stage; there is no retry and no fallback content.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

static LEADING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:json)?\s*").expect("valid leading fence regex"));
static TRAILING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("valid trailing fence regex"));

/// One block of a completion response. Only text blocks carry the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

/// Raw response from the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl CompletionResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
        }
    }

    /// All text blocks, in order, joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion response contained no text content")]
    EmptyCompletion,

    #[error("Completion response did not contain valid JSON: {0}")]
    MalformedCompletion(#[source] serde_json::Error),

    #[error("Completion service returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Completion service request failed: {0}")]
    Transport(String),
}

/// Remove markdown code fences and stray backticks around a JSON payload.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let start = LEADING_FENCE_RE
        .find(trimmed)
        .map(|m| m.end())
        .unwrap_or(0);
    let unfenced = &trimmed[start..];
    let end = TRAILING_FENCE_RE
        .find(unfenced)
        .map(|m| m.start())
        .unwrap_or(unfenced.len());
    unfenced[..end].trim_matches('`').trim()
}

/// Extract the JSON payload of a completion and decode it as `T`.
pub fn parse_completion<T: DeserializeOwned>(
    response: &CompletionResponse,
) -> Result<T, CompletionError> {
    let text = response.text();
    if text.trim().is_empty() {
        return Err(CompletionError::EmptyCompletion);
    }
    serde_json::from_str(strip_code_fences(&text)).map_err(CompletionError::MalformedCompletion)
}
