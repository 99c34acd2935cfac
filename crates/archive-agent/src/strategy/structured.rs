//! Structured-output strategy: asks the generation provider for the full
//! response contract as a single JSON object. Highest quality, highest
//! failure risk — it depends on an external model provider and on the
//! model honoring the contract. Malformed output is a strategy failure,
//! which advances the chain.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::ResponseStrategy;
use crate::llm::{GenerationConfig, GenerationProvider};
use crate::types::{AgentResponse, GenerationInput};

const PERSONA_PREAMBLE: &str = r#"You are an investigative research assistant specializing in discovering hidden narratives from historical newspaper records.

PERSONALITY REQUIREMENTS:
- Maintain a professional yet curious tone
- Show your analytical reasoning process step by step
- Be encouraging about the user's research journey
- Acknowledge uncertainty when appropriate
- Focus on investigative leads and connections

BEHAVIORAL GUIDELINES:
- Always provide visible reasoning steps
- Reference specific records when available
- Suggest follow-up questions to deepen the investigation
- Assess confidence levels honestly
- Never dump a wall of headlines; offer one or two leads and ask for direction"#;

const RESPONSE_CONTRACT: &str = r#"Respond with a single JSON object with exactly these fields:

{"message":"...","reasoning_steps":[{"step_number":1,"description":"...","kind":"analysis|synthesis|hypothesis|evidence_review|conclusion","confidence":0.8}],"follow_up_questions":["..."],"investigative_leads":["..."],"confidence":{"overall":0.7,"reasoning":"...","limitations":["..."]}}

RULES:
- "message" must be non-empty conversational prose.
- "reasoning_steps" must contain at least one step; confidence values are between 0 and 1.
- "confidence.overall" is between 0 and 1.
Output ONLY the JSON object, nothing else."#;

pub struct StructuredStrategy {
    provider: Arc<dyn GenerationProvider>,
    config: GenerationConfig,
}

impl StructuredStrategy {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            provider,
            config: GenerationConfig {
                max_tokens: 2000,
                temperature: 0.7,
                ..Default::default()
            },
        }
    }

    fn build_prompt(input: &GenerationInput) -> String {
        let mut prompt = String::with_capacity(2048);
        prompt.push_str(PERSONA_PREAMBLE);
        prompt.push_str("\n\n");
        prompt.push_str(RESPONSE_CONTRACT);
        prompt.push_str("\n\n");

        prompt.push_str(&format!("Project: {}\n", input.project.name));
        prompt.push_str(&format!("Description: {}\n", input.project.description));
        if !input.project.research_goals.is_empty() {
            prompt.push_str(&format!(
                "Research goals: {}\n",
                input.project.research_goals.join(", ")
            ));
        }

        prompt.push_str("\nConversation context:\n");
        prompt.push_str(&format!(
            "- User expertise: {:?}\n- Conversation stage: {:?}\n- User intent: {}\n",
            input.context.user_expertise, input.context.conversation_stage, input.context.user_intent
        ));
        if !input.context.research_focus.is_empty() {
            prompt.push_str(&format!(
                "- Research focus: {}\n",
                input.context.research_focus.join(", ")
            ));
        }

        if !input.records.is_empty() {
            prompt.push_str("\nAvailable records:\n");
            for (i, record) in input.records.iter().enumerate() {
                prompt.push_str(&format!(
                    "{}. {} ({}, relevance {:.2})\n   {}\n",
                    i + 1,
                    record.title,
                    record.publication,
                    record.relevance,
                    record.excerpt
                ));
            }
            if input.records_omitted > 0 {
                prompt.push_str(&format!(
                    "({} further records omitted)\n",
                    input.records_omitted
                ));
            }
        }

        prompt.push_str(&format!("\nUser message: \"{}\"\nJSON:", input.user_message));
        prompt
    }

    /// Parse the model reply into the response contract. Handles common
    /// model quirks: markdown fences and trailing prose around the object.
    fn parse_response(raw: &str) -> Result<AgentResponse> {
        let cleaned = raw
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        let json_str = match (cleaned.find('{'), cleaned.rfind('}')) {
            (Some(start), Some(end)) if end > start => &cleaned[start..=end],
            _ => cleaned,
        };

        serde_json::from_str::<AgentResponse>(json_str)
            .context("structured reply did not match the response contract")
    }
}

#[async_trait]
impl ResponseStrategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    async fn generate(&self, input: &GenerationInput) -> Result<AgentResponse> {
        let prompt = Self::build_prompt(input);
        let raw = self.provider.generate(&prompt, &self.config).await?;
        Self::parse_response(&raw)
    }
}
