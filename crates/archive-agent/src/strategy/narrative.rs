//! Narrative strategy: provider-backed free-text generation parsed by
//! fixed marker patterns. Sits between the structured strategy and the
//! record-template fallback: it still needs a model, but it only needs
//! prose from it, not a JSON contract.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Datelike;
use std::sync::Arc;

use super::ResponseStrategy;
use crate::llm::{parse_marked_response, GenerationConfig, GenerationProvider};
use crate::types::{
    AgentResponse, ConfidenceAssessment, GenerationInput, ReasoningKind, ReasoningStep,
};

const NARRATIVE_PREAMBLE: &str = r#"You are an investigative research assistant helping a user discover hidden narratives in historical newspaper archives.

Response format:
- Begin with one to three short reasoning lines, each on its own line, prefixed with ✅, 🔍, or 🧠.
- Then write a short conversational reply. Offer at most one or two concrete story leads and end by asking the user which direction to take.
- Be calm and direct. Never dump a list of headlines."#;

pub struct NarrativeStrategy {
    provider: Arc<dyn GenerationProvider>,
    config: GenerationConfig,
}

impl NarrativeStrategy {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            provider,
            config: GenerationConfig::default(),
        }
    }

    fn build_prompt(input: &GenerationInput) -> String {
        let mut prompt = String::with_capacity(1024);
        prompt.push_str(NARRATIVE_PREAMBLE);
        prompt.push_str("\n\n");

        prompt.push_str(&format!(
            "Project: {} — {}\n",
            input.project.name, input.project.description
        ));
        prompt.push_str(&format!("Detected intent: {}\n", input.context.user_intent));
        prompt.push_str(&format!(
            "Archive note: {}\n",
            input.context.user_intent.availability_hint()
        ));

        if !input.records.is_empty() {
            prompt.push_str("\nTop records:\n");
            for record in input.records.iter().take(3) {
                let year = record
                    .published_on
                    .map(|d| d.year().to_string())
                    .unwrap_or_else(|| "undated".to_string());
                prompt.push_str(&format!(
                    "- {} ({}, {})\n",
                    record.title, year, record.publication
                ));
            }
        }

        prompt.push_str(&format!("\nUser message: {}\n", input.user_message));
        prompt
    }
}

#[async_trait]
impl ResponseStrategy for NarrativeStrategy {
    fn name(&self) -> &'static str {
        "narrative"
    }

    async fn generate(&self, input: &GenerationInput) -> Result<AgentResponse> {
        let prompt = Self::build_prompt(input);
        let raw = self.provider.generate(&prompt, &self.config).await?;
        if raw.trim().is_empty() {
            bail!("provider returned an empty completion");
        }

        let parsed = parse_marked_response(&raw);

        let reasoning_steps: Vec<ReasoningStep> = if parsed.reasoning.is_empty() {
            // Markers absent: supplement the default step.
            vec![ReasoningStep::new(
                1,
                ReasoningKind::Synthesis,
                "Drafted a narrative reply from the retrieved records",
                0.5,
            )]
        } else {
            parsed
                .reasoning
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    ReasoningStep::new(i as u32 + 1, ReasoningKind::Analysis, line.clone(), 0.6)
                })
                .collect()
        };

        let has_records = !input.records.is_empty();
        Ok(AgentResponse {
            message: parsed.message,
            reasoning_steps,
            follow_up_questions: vec![],
            investigative_leads: input
                .records
                .iter()
                .take(3)
                .map(|r| r.title.replace('"', ""))
                .collect(),
            confidence: ConfidenceAssessment {
                overall: if has_records { 0.6 } else { 0.4 },
                reasoning: if has_records {
                    "Free-text reply grounded in retrieved records".to_string()
                } else {
                    "Free-text reply without corpus grounding".to_string()
                },
                limitations: vec!["Free-text generation without structured validation".to_string()],
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::tests::record;
    use crate::llm::ProviderInfo;
    use crate::strategy::tests::input_with_records;
    use crate::types::DocumentaryPotential;

    struct StubProvider {
        reply: String,
    }

    #[async_trait]
    impl GenerationProvider for StubProvider {
        async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
            Ok(self.reply.clone())
        }
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "stub".to_string(),
                model: "stub".to_string(),
                context_window: 4096,
            }
        }
        async fn is_ready(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn marked_reply_becomes_steps_and_message() {
        let strategy = NarrativeStrategy::new(Arc::new(StubProvider {
            reply: "🔍 Checked the council coverage\nA councilman vanished in 1948. Dig in?"
                .to_string(),
        }));
        let input = input_with_records(vec![record(
            "Councilman Vanishes",
            0.8,
            0.7,
            DocumentaryPotential::Yes,
            true,
        )]);

        let response = strategy.generate(&input).await.unwrap();
        assert_eq!(response.reasoning_steps.len(), 1);
        assert_eq!(
            response.reasoning_steps[0].description,
            "Checked the council coverage"
        );
        assert_eq!(response.message, "A councilman vanished in 1948. Dig in?");
        assert_eq!(response.investigative_leads, vec!["Councilman Vanishes"]);
        assert!((response.confidence.overall - 0.6).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn unmarked_reply_gets_default_step() {
        let strategy = NarrativeStrategy::new(Arc::new(StubProvider {
            reply: "Just plain prose, no markers.".to_string(),
        }));
        let response = strategy
            .generate(&input_with_records(vec![]))
            .await
            .unwrap();
        assert_eq!(response.reasoning_steps.len(), 1);
        assert!(response.reasoning_steps[0]
            .description
            .contains("Drafted a narrative reply"));
        assert!((response.confidence.overall - 0.4).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn empty_completion_is_a_strategy_failure() {
        let strategy = NarrativeStrategy::new(Arc::new(StubProvider {
            reply: "   ".to_string(),
        }));
        assert!(strategy
            .generate(&input_with_records(vec![]))
            .await
            .is_err());
    }
}
