//! Template strategy: fabricates a conversational reply directly from the
//! ranked corpus records. No model dependency; medium quality.
//!
//! Content policy: mention at most the top-ranked record by name, nod at
//! up to two more, and always close with an open question so the user
//! picks the direction. Never present an unprompted content dump.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Datelike;

use super::ResponseStrategy;
use crate::intent::UserIntent;
use crate::types::{
    AgentResponse, ConfidenceAssessment, CorpusRecord, GenerationInput, ReasoningKind,
    ReasoningStep,
};

pub struct TemplateStrategy {}

impl TemplateStrategy {
    pub fn new() -> Self {
        Self {}
    }

    fn year_of(record: &CorpusRecord) -> String {
        record
            .published_on
            .map(|d| d.year().to_string())
            .unwrap_or_else(|| "an unknown year".to_string())
    }

    // Quotation marks inside headlines read badly when embedded in prose.
    fn clean_title(title: &str) -> String {
        title.replace('"', "")
    }

    fn looks_like_crime(record: &CorpusRecord) -> bool {
        let title = record.title.to_lowercase();
        ["murder", "kill", "death", "found dead", "slain"]
            .iter()
            .any(|p| title.contains(p))
            || record
                .story_tags
                .iter()
                .any(|t| t.to_lowercase().contains("crime"))
    }

    fn no_records_response() -> AgentResponse {
        AgentResponse {
            message: "I'm not finding much on that specific angle right now. Want to try a \
                      different approach or topic?"
                .to_string(),
            reasoning_steps: vec![ReasoningStep::new(
                1,
                ReasoningKind::EvidenceReview,
                "No relevant records surfaced for this angle",
                0.5,
            )],
            follow_up_questions: vec![
                "Want to try a different search angle, like a person, a place, or a year?"
                    .to_string(),
            ],
            investigative_leads: vec![],
            confidence: ConfidenceAssessment {
                overall: 0.45,
                reasoning: "Nothing in the corpus matched the query".to_string(),
                limitations: vec!["No corpus records matched the query".to_string()],
            },
        }
    }

    fn compose_message(input: &GenerationInput, top: &[&CorpusRecord]) -> String {
        match input.context.user_intent {
            UserIntent::CrimeStory | UserIntent::DramaticStory => {
                let crime_cases: Vec<&&CorpusRecord> =
                    top.iter().filter(|r| Self::looks_like_crime(r)).collect();
                match crime_cases.first() {
                    Some(first) => {
                        let mut message =
                            "I've got some intriguing unsolved cases from the archives. "
                                .to_string();
                        message.push_str(&format!(
                            "There's a {} case that really caught my attention - {}. ",
                            Self::year_of(first),
                            Self::clean_title(&first.title)
                        ));
                        if crime_cases.len() > 1 {
                            message
                                .push_str("Plus a couple of other mysterious deaths from that era. ");
                        }
                        message.push_str("Want me to dig deeper into any of these?");
                        message
                    }
                    None => "I don't see any obvious murder mysteries in what I'm finding right \
                             now. Want me to search for suspicious deaths or unexplained \
                             disappearances instead?"
                        .to_string(),
                }
            }
            UserIntent::PoliticalScandal | UserIntent::PoliceCorruption => {
                let first = top[0];
                format!(
                    "The political scene of that era had its share of drama. One case from {} \
                     involved {}. Should I pull more details on that one?",
                    Self::year_of(first),
                    Self::clean_title(&first.title).to_lowercase()
                )
            }
            _ => {
                let first = top[0];
                let mut message = format!(
                    "I found {} articles that might interest you. ",
                    input.records.len() + input.records_omitted
                );
                message.push_str(&format!(
                    "One from {} caught my eye: {}. ",
                    Self::year_of(first),
                    Self::clean_title(&first.title)
                ));
                if top.len() > 1 {
                    message.push_str("There are a couple of others from that era too. ");
                }
                message.push_str("What angle interests you most?");
                message
            }
        }
    }
}

impl Default for TemplateStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseStrategy for TemplateStrategy {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn generate(&self, input: &GenerationInput) -> Result<AgentResponse> {
        if input.records.is_empty() {
            return Ok(Self::no_records_response());
        }

        // Records arrive ranked; only the strongest three feed the reply.
        let top: Vec<&CorpusRecord> = input.records.iter().take(3).collect();
        let message = Self::compose_message(input, &top);

        let total_found = input.records.len() + input.records_omitted;
        let reasoning_steps = vec![
            ReasoningStep::new(
                1,
                ReasoningKind::EvidenceReview,
                format!("Found {} relevant records in the corpus", total_found),
                0.7,
            ),
            ReasoningStep::new(
                2,
                ReasoningKind::Synthesis,
                "Composed a conversational reply from the top-ranked records",
                0.6,
            ),
        ];

        let closing_question = message
            .rsplit(&['.', '!'][..])
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| s.ends_with('?'))
            .unwrap_or_else(|| "What angle interests you most?".to_string());

        Ok(AgentResponse {
            message,
            reasoning_steps,
            follow_up_questions: vec![closing_question],
            investigative_leads: top
                .iter()
                .map(|r| Self::clean_title(&r.title))
                .collect(),
            confidence: ConfidenceAssessment {
                overall: 0.55,
                reasoning: "Reply grounded directly in ranked corpus records".to_string(),
                limitations: vec![
                    "Template-based composition without model assistance".to_string()
                ],
            },
        })
    }
}
