//! Conversation orchestration engine for an investigative research
//! assistant working over a pre-analyzed corpus of historical newspaper
//! articles.
//!
//! The pipeline: keyword extraction + intent classification → corpus
//! retrieval (with a diverse-sample fallback) → context assembly →
//! response strategy chain (first validator-approved result wins, with a
//! static degraded reply when every strategy fails) → conversation memory
//! update → best-effort persistence. This crate is a library-level
//! contract; HTTP routing, auth, and the corpus database live elsewhere.

pub mod config;
pub mod context;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod intent;
pub mod keywords;
pub mod llm;
pub mod memory;
pub mod persist;
pub mod strategy;
pub mod types;
pub mod validator;

// Re-export primary types for convenience
pub use config::AgentConfig;
pub use corpus::{CorpusSearch, CorpusStats, InMemoryCorpus, SearchRequest};
pub use engine::{estimate_tokens, AgentEngine};
pub use error::{TurnError, ValidationFailure};
pub use intent::{IntentClassifier, UserIntent};
pub use llm::{GenerationProvider, HttpProvider};
pub use memory::{ConversationKey, ConversationMemory, ConversationStore, InMemoryStore};
pub use persist::{JsonFileGateway, NullGateway, PersistenceGateway};
pub use strategy::{ResponseStrategy, StrategyChain};
pub use types::{
    AgentResponse, ConfidenceAssessment, ConversationContext, CorpusRecord, DocumentaryPotential,
    GenerationInput, ProjectMetadata, ReasoningKind, ReasoningStep, TurnMessage, TurnOutcome,
};
pub use validator::ResponseValidator;

// Re-export common types
pub use anyhow::{Error, Result};
pub use uuid::Uuid;
