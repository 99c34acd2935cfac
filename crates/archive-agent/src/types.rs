use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::UserIntent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single conversation turn as stored in memory and flushed to the
/// persistence gateway. Insertion order is chronological.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TurnMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Pre-computed editorial judgement on whether a record could anchor a
/// documentary-style story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentaryPotential {
    Yes,
    Maybe,
    No,
}

/// A single analyzed newspaper article as returned by the corpus search
/// collaborator. Read-only from the engine's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub publication: String,
    pub published_on: Option<NaiveDate>,
    /// Relevance/interest score in [0, 1], precomputed by the analyzer.
    pub relevance: f32,
    /// Secondary ranking signal used for the diverse-sample ordering.
    pub narrative_strength: f32,
    pub documentary_potential: DocumentaryPotential,
    pub interesting: bool,
    pub story_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub research_goals: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserExpertise {
    Novice,
    Intermediate,
    Expert,
}

/// Coarse progression of a research conversation. Re-derived every turn
/// from the recent window; it may regress, and that is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    Opening,
    Exploration,
    DeepDive,
    Synthesis,
}

/// Derived per-turn view of the conversation. Not stored long-term; the
/// last computed value is stashed on the memory and overwritten each turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub user_expertise: UserExpertise,
    pub conversation_stage: ConversationStage,
    pub research_focus: Vec<String>,
    pub user_intent: UserIntent,
}

/// Everything a generation strategy is allowed to see for one turn.
/// Built fresh, consumed once, never retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationInput {
    pub user_message: String,
    pub context: ConversationContext,
    /// Ranked corpus records, capped by the context assembler.
    pub records: Vec<CorpusRecord>,
    /// How many ranked records were dropped by the cap.
    pub records_omitted: usize,
    pub project: ProjectMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningKind {
    Analysis,
    Synthesis,
    Hypothesis,
    EvidenceReview,
    Conclusion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub step_number: u32,
    pub description: String,
    pub kind: ReasoningKind,
    pub confidence: f32,
}

impl ReasoningStep {
    pub fn new(
        step_number: u32,
        kind: ReasoningKind,
        description: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            step_number,
            description: description.into(),
            kind,
            confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceAssessment {
    pub overall: f32,
    pub reasoning: String,
    pub limitations: Vec<String>,
}

/// The structural contract every generation strategy must satisfy,
/// including the fallbacks. This is the seam that lets strategies be
/// swapped without touching callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub message: String,
    #[serde(default)]
    pub reasoning_steps: Vec<ReasoningStep>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    #[serde(default)]
    pub investigative_leads: Vec<String>,
    pub confidence: ConfidenceAssessment,
}

/// The engine's per-turn result: the validated response plus turn
/// metadata for the caller's bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub response: AgentResponse,
    pub intent: UserIntent,
    /// Name of the strategy that produced the response.
    pub strategy: String,
    pub token_estimate: usize,
    pub duration_ms: u64,
}
