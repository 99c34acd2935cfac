//! Structural validation of generated responses.
//!
//! Every strategy's output passes through here before being accepted; a
//! rejection advances the strategy chain instead of failing the turn.

use crate::error::ValidationFailure;
use crate::types::AgentResponse;

pub struct ResponseValidator {}

impl ResponseValidator {
    pub fn new() -> Self {
        Self {}
    }

    /// Check the structural contract. Never mutates the candidate.
    pub fn validate(&self, response: &AgentResponse) -> Result<(), ValidationFailure> {
        if response.message.trim().is_empty() {
            return Err(ValidationFailure::EmptyMessage);
        }
        if response.reasoning_steps.is_empty() {
            return Err(ValidationFailure::NoReasoningSteps);
        }
        for step in &response.reasoning_steps {
            if !(0.0..=1.0).contains(&step.confidence) {
                return Err(ValidationFailure::StepConfidenceOutOfRange {
                    step: step.step_number,
                    value: step.confidence,
                });
            }
        }
        if !(0.0..=1.0).contains(&response.confidence.overall) {
            return Err(ValidationFailure::OverallConfidenceOutOfRange {
                value: response.confidence.overall,
            });
        }
        Ok(())
    }
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfidenceAssessment, ReasoningKind, ReasoningStep};

    fn valid_response() -> AgentResponse {
        AgentResponse {
            message: "Found a promising lead.".to_string(),
            reasoning_steps: vec![ReasoningStep::new(
                1,
                ReasoningKind::Analysis,
                "Matched the query against the archive",
                0.8,
            )],
            follow_up_questions: vec![],
            investigative_leads: vec![],
            confidence: ConfidenceAssessment {
                overall: 0.7,
                reasoning: "Good keyword coverage".to_string(),
                limitations: vec![],
            },
        }
    }

    #[test]
    fn accepts_well_formed_response() {
        assert!(ResponseValidator::new().validate(&valid_response()).is_ok());
    }

    #[test]
    fn rejects_empty_message() {
        let mut response = valid_response();
        response.message = "   ".to_string();
        assert_eq!(
            ResponseValidator::new().validate(&response),
            Err(ValidationFailure::EmptyMessage)
        );
    }

    #[test]
    fn rejects_missing_reasoning() {
        let mut response = valid_response();
        response.reasoning_steps.clear();
        assert_eq!(
            ResponseValidator::new().validate(&response),
            Err(ValidationFailure::NoReasoningSteps)
        );
    }

    #[test]
    fn rejects_out_of_range_step_confidence() {
        let mut response = valid_response();
        response.reasoning_steps[0].confidence = 1.4;
        assert!(matches!(
            ResponseValidator::new().validate(&response),
            Err(ValidationFailure::StepConfidenceOutOfRange { step: 1, .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_overall_confidence() {
        let mut response = valid_response();
        response.confidence.overall = -0.1;
        assert!(matches!(
            ResponseValidator::new().validate(&response),
            Err(ValidationFailure::OverallConfidenceOutOfRange { .. })
        ));
    }
}
