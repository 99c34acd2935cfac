//! Generation provider contract and free-text response parsing.
//!
//! Providers are interchangeable behind one trait; the engine only ever
//! sees prompt-in/text-out. Structured interpretation of the text is the
//! strategies' concern.

pub mod external;

pub use external::HttpProvider;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// Reasoning lines are marked with a small fixed set of lead glyphs; the
// parser recognizes exactly these.
static REASONING_LINE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?m)^\s*[✅🔍🧠]\s*(.+)$").expect("reasoning marker regex is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
            top_p: 0.95,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    pub context_window: usize,
}

/// Core trait for generation providers.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Provider metadata for logging and diagnostics.
    fn info(&self) -> ProviderInfo;

    /// Cheap availability probe. A false result means callers should skip
    /// provider-backed strategies for this turn.
    async fn is_ready(&self) -> bool;
}

/// Free text split into a user-facing message and marked reasoning lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNarrative {
    pub message: String,
    pub reasoning: Vec<String>,
}

/// Parse a free-text completion by recognizing the fixed reasoning
/// markers. Absence of markers is tolerated: the entire text becomes the
/// message and the reasoning list is left empty for the caller to
/// supplement with a default step.
pub fn parse_marked_response(raw: &str) -> ParsedNarrative {
    let mut reasoning = Vec::new();
    for capture in REASONING_LINE_RE.captures_iter(raw) {
        if let Some(line) = capture.get(1) {
            let text = line.as_str().trim();
            if !text.is_empty() {
                reasoning.push(text.to_string());
            }
        }
    }

    let message: String = raw
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.starts_with('✅')
                || trimmed.starts_with('🔍')
                || trimmed.starts_with('🧠'))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    // A reply that was nothing but marker lines still needs a message.
    let message = if message.is_empty() {
        raw.trim().to_string()
    } else {
        message
    };

    ParsedNarrative { message, reasoning }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_marked_reasoning_lines() {
        let raw = "✅ Scanned the archive for 1948 council coverage\n🔍 Cross-checked the missing-persons reports\nA councilman vanished that June. Want me to dig in?";
        let parsed = parse_marked_response(raw);
        assert_eq!(parsed.reasoning.len(), 2);
        assert!(parsed.reasoning[0].starts_with("Scanned the archive"));
        assert_eq!(
            parsed.message,
            "A councilman vanished that June. Want me to dig in?"
        );
    }

    #[test]
    fn tolerates_absence_of_markers() {
        let raw = "Nothing but plain prose here.";
        let parsed = parse_marked_response(raw);
        assert!(parsed.reasoning.is_empty());
        assert_eq!(parsed.message, raw);
    }

    #[test]
    fn all_marker_reply_keeps_raw_as_message() {
        let raw = "🧠 Considered three candidate stories";
        let parsed = parse_marked_response(raw);
        assert_eq!(parsed.reasoning.len(), 1);
        assert_eq!(parsed.message, raw);
    }
}
