//! Context assembly.
//!
//! Derives the per-turn `ConversationContext` from the recent message
//! window and merges it with project metadata and ranked records into a
//! `GenerationInput`. Pure transforms, no side effects.

use crate::config::AgentConfig;
use crate::intent::UserIntent;
use crate::memory::ConversationMemory;
use crate::types::{
    ConversationContext, ConversationStage, CorpusRecord, GenerationInput, MessageRole,
    ProjectMetadata, UserExpertise,
};

// Vocabulary that signals an experienced archival researcher.
const EXPERT_TERMS: &[&str] = &[
    "primary source",
    "microfilm",
    "provenance",
    "corroborat",
    "attribution",
    "cross-reference",
    "crosswalk",
    "archival",
];

pub struct ContextAssembler {
    recent_window: usize,
    max_records: usize,
}

impl ContextAssembler {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            recent_window: config.memory.recent_window,
            max_records: config.search.max_context_records,
        }
    }

    /// Derive a fresh context from the last few messages, the project's
    /// declared research goals, and the classified intent. The stage is
    /// recomputed from scratch every turn and may report an earlier stage
    /// than the previous turn; that looseness is part of the contract.
    pub fn derive_context(
        &self,
        memory: &ConversationMemory,
        project: &ProjectMetadata,
        intent: UserIntent,
    ) -> ConversationContext {
        let recent: Vec<&str> = memory
            .messages
            .iter()
            .rev()
            .take(self.recent_window)
            .map(|m| m.content.as_str())
            .collect();

        let user_turns = memory
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();

        // Until the conversation surfaces its own focus, the project's
        // declared research goals stand in.
        let research_focus = if memory.research_focus.is_empty() {
            project.research_goals.clone()
        } else {
            memory.research_focus.clone()
        };

        ConversationContext {
            user_expertise: Self::classify_expertise(&recent),
            conversation_stage: Self::classify_stage(user_turns, intent),
            research_focus,
            user_intent: intent,
        }
    }

    fn classify_expertise(recent: &[&str]) -> UserExpertise {
        if recent.is_empty() {
            return UserExpertise::Novice;
        }
        let joined = recent.join(" ").to_lowercase();
        if EXPERT_TERMS.iter().any(|t| joined.contains(t)) {
            return UserExpertise::Expert;
        }
        let avg_words = recent
            .iter()
            .map(|m| m.split_whitespace().count())
            .sum::<usize>()
            / recent.len();
        if avg_words > 12 {
            UserExpertise::Intermediate
        } else {
            UserExpertise::Novice
        }
    }

    fn classify_stage(user_turns: usize, intent: UserIntent) -> ConversationStage {
        if user_turns <= 1 {
            return ConversationStage::Opening;
        }
        if user_turns >= 8 {
            return ConversationStage::Synthesis;
        }
        if user_turns >= 4 || intent == UserIntent::ExpandingThread {
            return ConversationStage::DeepDive;
        }
        ConversationStage::Exploration
    }

    /// Merge context, ranked records, and project metadata into the input
    /// consumed (once) by the strategy chain. Records beyond the cap are
    /// dropped, with the omission count recorded.
    pub fn assemble(
        &self,
        user_message: &str,
        context: ConversationContext,
        mut records: Vec<CorpusRecord>,
        project: &ProjectMetadata,
    ) -> GenerationInput {
        let records_omitted = records.len().saturating_sub(self.max_records);
        records.truncate(self.max_records);

        GenerationInput {
            user_message: user_message.to_string(),
            context,
            records,
            records_omitted,
            project: project.clone(),
        }
    }
}
