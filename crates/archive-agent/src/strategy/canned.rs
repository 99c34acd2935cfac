//! Canned strategy: deterministic intent-keyed replies. Lowest quality,
//! zero dependencies, always succeeds — the tail of the chain.

use anyhow::Result;
use async_trait::async_trait;

use super::ResponseStrategy;
use crate::intent::UserIntent;
use crate::types::{
    AgentResponse, ConfidenceAssessment, GenerationInput, ReasoningKind, ReasoningStep,
};

pub struct CannedStrategy {}

impl CannedStrategy {
    pub fn new() -> Self {
        Self {}
    }

    fn reply_for(intent: UserIntent) -> &'static str {
        match intent {
            UserIntent::Greeting => {
                "Hey there. I can help you find and explore stories — or dig into something \
                 you're curious about. What's on your mind?"
            }
            UserIntent::CrimeStory => {
                "That opens up a lot of possibilities. Want something sensational, tragic, or \
                 unresolved?"
            }
            UserIntent::MissingPersons => {
                "Plenty of eerie ones. A city councilman vanished on the way to a meeting in \
                 1948 — no body, no note. Should I dig into that one?"
            }
            UserIntent::PoliceCorruption => {
                "I've seen some odd articles from the '50s involving beatings, bribes, and a \
                 few trials. Want me to start lining up a timeline?"
            }
            UserIntent::StoryInventory => {
                "Right now I'm loaded with material from the archive — mostly covering the \
                 1940s and 1950s. Some of it's pretty wild: murders, scandals, missing \
                 persons, public coverups. Want to narrow it down?"
            }
            _ => {
                "I can help you find and explore stories from the archive. What's on your mind?"
            }
        }
    }
}

impl Default for CannedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseStrategy for CannedStrategy {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn generate(&self, input: &GenerationInput) -> Result<AgentResponse> {
        let intent = input.context.user_intent;
        let message = Self::reply_for(intent).to_string();

        Ok(AgentResponse {
            message,
            reasoning_steps: vec![ReasoningStep::new(
                1,
                ReasoningKind::Analysis,
                format!("Matched a canned reply for intent {}", intent),
                0.9,
            )],
            follow_up_questions: vec![],
            investigative_leads: vec![],
            confidence: ConfidenceAssessment {
                overall: 0.5,
                reasoning: intent.availability_hint().to_string(),
                limitations: vec![
                    "Static reply; no retrieval or generation performed".to_string()
                ],
            },
        })
    }
}
