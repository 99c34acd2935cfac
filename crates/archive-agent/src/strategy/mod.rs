//! Response generation strategies and the fallback chain.
//!
//! The chain is an explicit ordered list of interchangeable strategies
//! behind one trait, iterated until the first validator-approved result.
//! Ordering is policy: the highest-quality, highest-risk strategy runs
//! first and the zero-dependency canned strategy runs last. Strategies
//! are stateless given their input and never touch conversation memory;
//! only the orchestrator mutates state, after a strategy returns.

pub mod canned;
pub mod narrative;
pub mod structured;
pub mod template;

pub use canned::CannedStrategy;
pub use narrative::NarrativeStrategy;
pub use structured::StructuredStrategy;
pub use template::TemplateStrategy;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::types::{
    AgentResponse, ConfidenceAssessment, GenerationInput, ReasoningKind, ReasoningStep,
};
use crate::validator::ResponseValidator;

#[async_trait]
pub trait ResponseStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, input: &GenerationInput) -> Result<AgentResponse>;
}

pub struct StrategyChain {
    strategies: Vec<Box<dyn ResponseStrategy>>,
    validator: ResponseValidator,
    /// Upper bound on a single attempt; expiry advances the chain. The
    /// external provider has no timeout of its own, so without this a hung
    /// call would stall the turn indefinitely.
    attempt_timeout: Duration,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn ResponseStrategy>>, attempt_timeout: Duration) -> Self {
        Self {
            strategies,
            validator: ResponseValidator::new(),
            attempt_timeout,
        }
    }

    /// Run the chain: invoke each strategy in order, validating every
    /// result; the first valid response wins. When every strategy fails,
    /// return the static degraded response. Each strategy is attempted at
    /// most once per turn; the chain itself is the retry mechanism.
    pub async fn run(&self, input: &GenerationInput) -> (AgentResponse, &'static str) {
        for strategy in &self.strategies {
            match tokio::time::timeout(self.attempt_timeout, strategy.generate(input)).await {
                Err(_) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        timeout_secs = self.attempt_timeout.as_secs(),
                        "strategy timed out, advancing"
                    );
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "strategy failed, advancing"
                    );
                }
                Ok(Ok(response)) => match self.validator.validate(&response) {
                    Ok(()) => {
                        tracing::info!(
                            strategy = strategy.name(),
                            "strategy produced a valid response"
                        );
                        return (response, strategy.name());
                    }
                    Err(violation) => {
                        tracing::warn!(
                            strategy = strategy.name(),
                            violation = %violation,
                            "response rejected by validator, advancing"
                        );
                    }
                },
            }
        }

        tracing::warn!("every strategy failed; returning the degraded response");
        (degraded_response(), "degraded")
    }
}

/// The statically-defined reply returned when every strategy fails. Still
/// satisfies the response contract: non-empty message, one reasoning step
/// documenting the failure, confidence well under 0.3.
pub fn degraded_response() -> AgentResponse {
    AgentResponse {
        message: "I'm having trouble accessing my full capabilities right now, but I can still \
                  help you explore stories. What's on your mind?"
            .to_string(),
        reasoning_steps: vec![ReasoningStep::new(
            1,
            ReasoningKind::Conclusion,
            "Every generation strategy failed for this turn; falling back to the static \
             reduced-capability reply",
            0.2,
        )],
        follow_up_questions: vec!["Is there a story angle you'd like me to try again on?".to_string()],
        investigative_leads: vec![],
        confidence: ConfidenceAssessment {
            overall: 0.2,
            reasoning: "No generation strategy was available for this turn".to_string(),
            limitations: vec![
                "Response generated without retrieval or model assistance".to_string()
            ],
        },
    }
}
