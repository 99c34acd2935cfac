//! Turn orchestration: the pipeline from a raw user message to a
//! validated response and updated conversation state.
//!
//! Error policy: only input errors (`TurnError`) cross this boundary.
//! Retrieval errors become zero records, strategy failures advance the
//! chain, exhaustion yields the degraded response, and persistence
//! failures are logged and swallowed.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AgentConfig;
use crate::context::ContextAssembler;
use crate::corpus::{CorpusSearch, CorpusStats, SearchRequest};
use crate::error::TurnError;
use crate::intent::IntentClassifier;
use crate::keywords::extract_keywords;
use crate::llm::GenerationProvider;
use crate::memory::{ConversationKey, ConversationMemory, ConversationStore, InMemoryStore};
use crate::persist::PersistenceGateway;
use crate::strategy::{
    CannedStrategy, NarrativeStrategy, ResponseStrategy, StrategyChain, StructuredStrategy,
    TemplateStrategy,
};
use crate::types::{CorpusRecord, ProjectMetadata, TurnMessage, TurnOutcome};

/// Estimate token count using the chars/4 heuristic.
pub fn estimate_tokens(text: &str) -> usize {
    (text.len() + 3) / 4
}

pub struct AgentEngine {
    config: AgentConfig,
    projects: DashMap<String, ProjectMetadata>,
    store: Arc<dyn ConversationStore>,
    corpus: Arc<dyn CorpusSearch>,
    persistence: Arc<dyn PersistenceGateway>,
    chain: StrategyChain,
    assembler: ContextAssembler,
    classifier: IntentClassifier,
}

impl AgentEngine {
    /// Engine with the dependency-free chain: template then canned. Use
    /// [`with_provider`](Self::with_provider) to install the model-backed
    /// strategies in front.
    pub fn new(
        config: AgentConfig,
        corpus: Arc<dyn CorpusSearch>,
        persistence: Arc<dyn PersistenceGateway>,
    ) -> Self {
        let assembler = ContextAssembler::new(&config);
        let chain = StrategyChain::new(
            Self::fallback_strategies(),
            Duration::from_secs(config.strategy_timeout_secs),
        );
        Self {
            config,
            projects: DashMap::new(),
            store: Arc::new(InMemoryStore::new()),
            corpus,
            persistence,
            chain,
            assembler,
            classifier: IntentClassifier::new(),
        }
    }

    fn fallback_strategies() -> Vec<Box<dyn ResponseStrategy>> {
        vec![
            Box::new(TemplateStrategy::new()),
            Box::new(CannedStrategy::new()),
        ]
    }

    /// Install the provider-backed strategies (structured, then narrative)
    /// ahead of the dependency-free fallbacks.
    pub fn with_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        let mut strategies: Vec<Box<dyn ResponseStrategy>> = vec![
            Box::new(StructuredStrategy::new(provider.clone())),
            Box::new(NarrativeStrategy::new(provider)),
        ];
        strategies.extend(Self::fallback_strategies());
        self.chain = StrategyChain::new(
            strategies,
            Duration::from_secs(self.config.strategy_timeout_secs),
        );
        self
    }

    /// Replace the whole chain. Intended for embedders with custom
    /// strategies and for tests.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ResponseStrategy>>) -> Self {
        self.chain = StrategyChain::new(
            strategies,
            Duration::from_secs(self.config.strategy_timeout_secs),
        );
        self
    }

    /// Swap the conversation store (e.g. for a distributed cache).
    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = store;
        self
    }

    pub fn register_project(&self, project: ProjectMetadata) {
        self.projects.insert(project.id.clone(), project);
    }

    /// Process one user turn. Turns for the same (project, user) key must
    /// not be interleaved by the caller; distinct keys may run
    /// concurrently.
    pub async fn process_turn(
        &self,
        project_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let started = Instant::now();

        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(TurnError::EmptyMessage);
        }
        let project = self
            .projects
            .get(project_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TurnError::ProjectNotFound(project_id.to_string()))?;

        let intent = self.classifier.classify(trimmed);
        tracing::info!(project = %project_id, user = %user_id, intent = %intent, "processing turn");

        // Topic-specific intents sharpen retrieval with a biased term.
        let keywords = match intent.search_bias() {
            Some(bias) => vec![bias.to_string()],
            None => extract_keywords(trimmed),
        };
        let records = self.retrieve(keywords).await;
        tracing::debug!(records = records.len(), "retrieval complete");

        let key = ConversationKey::new(project_id, user_id);
        let mut memory = self.store.get(&key).unwrap_or_default();

        // The incoming message joins the window before context derivation.
        memory.append(TurnMessage::user(trimmed));
        let context = self.assembler.derive_context(&memory, &project, intent);
        let input = self
            .assembler
            .assemble(trimmed, context.clone(), records, &project);

        let (response, strategy) = self.chain.run(&input).await;

        memory.append(TurnMessage::assistant(&response.message));
        memory.derive_research_focus(&response.investigative_leads);
        memory.evict_if_over_capacity(self.config.memory.message_cap);
        memory.context = Some(context);
        let transcript = memory.messages.clone();
        self.store.put(key, memory);

        if let Err(e) = self
            .persistence
            .upsert_conversation(project_id, user_id, &transcript)
            .await
        {
            tracing::warn!(project = %project_id, error = %e, "conversation persist failed; continuing");
        }

        let token_estimate = estimate_tokens(trimmed) + estimate_tokens(&response.message);
        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            strategy = strategy,
            token_estimate = token_estimate,
            duration_ms = duration_ms,
            "turn complete"
        );

        Ok(TurnOutcome {
            response,
            intent,
            strategy: strategy.to_string(),
            token_estimate,
            duration_ms,
        })
    }

    /// Retrieval with the degradation policy: collaborator errors become
    /// zero records, and an empty keyword-search result falls back to the
    /// keyword-less diverse sample before giving up.
    async fn retrieve(&self, keywords: Vec<String>) -> Vec<CorpusRecord> {
        let had_keywords = !keywords.is_empty();
        let request = SearchRequest {
            keywords,
            limit: self.config.search.keyword_limit,
        };

        let mut records = match self.corpus.search(&request).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "corpus search failed; treating as zero records");
                Vec::new()
            }
        };

        if records.is_empty() && had_keywords {
            tracing::debug!("keyword search empty; falling back to diverse sample");
            let fallback = SearchRequest {
                keywords: Vec::new(),
                limit: self.config.search.diverse_limit,
            };
            records = match self.corpus.search(&fallback).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(error = %e, "diverse-sample search failed; continuing without records");
                    Vec::new()
                }
            };
        }

        records
    }

    /// Drop all in-memory conversations for a project and best-effort
    /// delete the durable transcripts. Idempotent; succeeds even when the
    /// project has no conversations.
    pub async fn clear_conversation(&self, project_id: &str) {
        self.store.delete_project(project_id);
        if let Err(e) = self.persistence.delete_conversation(project_id).await {
            tracing::warn!(project = %project_id, error = %e, "transcript delete failed; continuing");
        }
        tracing::info!(project = %project_id, "conversation memory cleared");
    }

    /// Current memory snapshot for a conversation, if any.
    pub fn conversation(&self, project_id: &str, user_id: &str) -> Option<ConversationMemory> {
        self.store
            .get(&ConversationKey::new(project_id, user_id))
    }

    pub async fn corpus_stats(&self) -> anyhow::Result<CorpusStats> {
        self.corpus.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::tests::record;
    use crate::corpus::InMemoryCorpus;
    use crate::persist::NullGateway;
    use crate::types::DocumentaryPotential;
    use crate::validator::ResponseValidator;
    use anyhow::Result;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    fn project() -> ProjectMetadata {
        ProjectMetadata {
            id: "p1".to_string(),
            name: "Cold Cases".to_string(),
            description: "Unsolved mid-century stories".to_string(),
            research_goals: vec!["find documentary leads".to_string()],
        }
    }

    fn seeded_corpus(n: usize) -> Arc<InMemoryCorpus> {
        let corpus = InMemoryCorpus::new();
        for i in 0..n {
            corpus.insert(record(
                &format!("Headline Number {}", i),
                0.9 - i as f32 * 0.01,
                0.5,
                DocumentaryPotential::Yes,
                true,
            ));
        }
        Arc::new(corpus)
    }

    fn engine_with(corpus: Arc<InMemoryCorpus>) -> AgentEngine {
        let engine = AgentEngine::new(
            AgentConfig::default(),
            corpus,
            Arc::new(NullGateway::new()),
        );
        engine.register_project(project());
        engine
    }

    #[tokio::test]
    async fn every_turn_satisfies_the_response_contract() {
        let engine = engine_with(seeded_corpus(15));
        let validator = ResponseValidator::new();
        for message in ["hi", "what about murder", "xyzzy", "tell me more"] {
            let outcome = engine.process_turn("p1", "u1", message).await.unwrap();
            assert!(validator.validate(&outcome.response).is_ok(), "{}", message);
        }
    }

    #[tokio::test]
    async fn unknown_project_is_a_typed_error() {
        let engine = engine_with(seeded_corpus(1));
        let err = engine.process_turn("ghost", "u1", "hello there").await;
        assert!(matches!(err, Err(TurnError::ProjectNotFound(_))));
    }

    #[tokio::test]
    async fn blank_message_is_a_typed_error() {
        let engine = engine_with(seeded_corpus(1));
        let err = engine.process_turn("p1", "u1", "   ").await;
        assert!(matches!(err, Err(TurnError::EmptyMessage)));
    }

    #[tokio::test]
    async fn memory_accumulates_and_persists_across_turns() {
        let engine = engine_with(seeded_corpus(5));
        engine
            .process_turn("p1", "u1", "what about murder")
            .await
            .unwrap();
        engine
            .process_turn("p1", "u1", "tell me more")
            .await
            .unwrap();

        let memory = engine.conversation("p1", "u1").unwrap();
        assert_eq!(memory.messages.len(), 4);
        assert!(memory.context.is_some());
    }

    #[tokio::test]
    async fn clear_conversation_is_idempotent() {
        let engine = engine_with(seeded_corpus(5));
        engine.process_turn("p1", "u1", "hello there").await.unwrap();
        engine.clear_conversation("p1").await;
        engine.clear_conversation("p1").await; // no-op
        assert!(engine.conversation("p1", "u1").is_none());
    }

    #[tokio::test]
    async fn zero_match_query_on_empty_corpus_stays_humble() {
        // Corpus is empty: keyword search and the diverse-sample fallback
        // both come back with nothing.
        let engine = engine_with(Arc::new(InMemoryCorpus::new()));
        let outcome = engine
            .process_turn("p1", "u1", "anything about zoology archives")
            .await
            .unwrap();

        assert!(!outcome.response.message.is_empty());
        assert!(outcome.response.confidence.overall <= 0.5);
        assert!(!outcome.response.follow_up_questions.is_empty());
        assert!(outcome.response.follow_up_questions[0].contains("different"));
    }

    #[tokio::test]
    async fn story_inventory_never_dumps_titles_and_ends_open() {
        let engine = engine_with(seeded_corpus(15));
        let outcome = engine
            .process_turn("p1", "u1", "What kind of stories do you have?")
            .await
            .unwrap();

        let message = &outcome.response.message;
        let mentioned = (0..15)
            .filter(|i| message.contains(&format!("Headline Number {}", i)))
            .count();
        assert!(mentioned < 10, "pacing policy: raw title dumps are not allowed");
        assert!(message.trim_end().ends_with('?'));
    }

    // Corpus wrapper that records every request it sees.
    struct RecordingCorpus {
        requests: Mutex<Vec<SearchRequest>>,
    }

    #[async_trait]
    impl CorpusSearch for RecordingCorpus {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<CorpusRecord>> {
            self.requests.lock().push(request.clone());
            Ok(Vec::new())
        }
        async fn stats(&self) -> Result<CorpusStats> {
            Ok(CorpusStats::default())
        }
    }

    #[tokio::test]
    async fn empty_keyword_result_reissues_diverse_sample() {
        let corpus = Arc::new(RecordingCorpus {
            requests: Mutex::new(Vec::new()),
        });
        let engine = AgentEngine::new(
            AgentConfig::default(),
            corpus.clone(),
            Arc::new(NullGateway::new()),
        );
        engine.register_project(project());

        engine
            .process_turn("p1", "u1", "anything about zoology")
            .await
            .unwrap();

        let requests = corpus.requests.lock();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].keywords.is_empty());
        assert!(requests[1].keywords.is_empty());
    }

    struct FailingCorpus;

    #[async_trait]
    impl CorpusSearch for FailingCorpus {
        async fn search(&self, _request: &SearchRequest) -> Result<Vec<CorpusRecord>> {
            anyhow::bail!("collaborator offline")
        }
        async fn stats(&self) -> Result<CorpusStats> {
            anyhow::bail!("collaborator offline")
        }
    }

    #[tokio::test]
    async fn corpus_errors_never_fail_the_turn() {
        let engine = AgentEngine::new(
            AgentConfig::default(),
            Arc::new(FailingCorpus),
            Arc::new(NullGateway::new()),
        );
        engine.register_project(project());

        let outcome = engine
            .process_turn("p1", "u1", "what about murder")
            .await
            .unwrap();
        assert!(!outcome.response.message.is_empty());
    }

    struct FailingGateway;

    #[async_trait]
    impl PersistenceGateway for FailingGateway {
        async fn upsert_conversation(
            &self,
            _project_id: &str,
            _user_id: &str,
            _messages: &[TurnMessage],
        ) -> Result<()> {
            anyhow::bail!("disk full")
        }
        async fn delete_conversation(&self, _project_id: &str) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn persistence_errors_are_swallowed() {
        let engine = AgentEngine::new(
            AgentConfig::default(),
            seeded_corpus(3),
            Arc::new(FailingGateway),
        );
        engine.register_project(project());

        let outcome = engine.process_turn("p1", "u1", "hello there").await;
        assert!(outcome.is_ok());
        engine.clear_conversation("p1").await; // also must not panic
    }

    struct ExplodingStrategy;

    #[async_trait]
    impl ResponseStrategy for ExplodingStrategy {
        fn name(&self) -> &'static str {
            "exploding"
        }
        async fn generate(
            &self,
            _input: &crate::types::GenerationInput,
        ) -> Result<crate::types::AgentResponse> {
            anyhow::bail!("boom")
        }
    }

    #[tokio::test]
    async fn exhausted_strategies_yield_degraded_outcome() {
        let engine = AgentEngine::new(
            AgentConfig::default(),
            seeded_corpus(3),
            Arc::new(NullGateway::new()),
        )
        .with_strategies(vec![Box::new(ExplodingStrategy), Box::new(ExplodingStrategy)]);
        engine.register_project(project());

        let outcome = engine.process_turn("p1", "u1", "hello there").await.unwrap();
        assert_eq!(outcome.strategy, "degraded");
        assert!(outcome.response.confidence.overall <= 0.3);
        assert!(!outcome.response.reasoning_steps.is_empty());
    }

    #[test]
    fn token_estimate_uses_chars_over_four() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
