//! Per-conversation memory and the injected conversation store.
//!
//! Memory is owned by the orchestrator for the lifetime of a
//! (project, user) pair and only flushed to durable storage explicitly.
//! The store is an interface so the process-wide table can be swapped for
//! a distributed cache without touching the engine.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::types::{ConversationContext, MessageRole, TurnMessage};

/// Research-focus labels retained per conversation. Oldest evicted first.
pub const RESEARCH_FOCUS_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub project_id: String,
    pub user_id: String,
}

impl ConversationKey {
    pub fn new(project_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationMemory {
    /// Chronological message log; bounded by `evict_if_over_capacity`.
    pub messages: Vec<TurnMessage>,
    /// Topic labels surfaced by the conversation, capped at
    /// [`RESEARCH_FOCUS_CAP`].
    pub research_focus: Vec<String>,
    /// Last derived context, overwritten each turn. No history retained.
    pub context: Option<ConversationContext>,
}

impl ConversationMemory {
    pub fn append(&mut self, turn: TurnMessage) {
        self.messages.push(turn);
    }

    /// Merge new leads into the research focus. Leads already present
    /// (case-sensitive exact match) are skipped; the list is truncated to
    /// the most recent [`RESEARCH_FOCUS_CAP`] by dropping from the front.
    pub fn derive_research_focus(&mut self, leads: &[String]) {
        for lead in leads {
            if self.research_focus.iter().any(|f| f == lead) {
                continue;
            }
            self.research_focus.push(lead.clone());
        }
        while self.research_focus.len() > RESEARCH_FOCUS_CAP {
            self.research_focus.remove(0);
        }
    }

    /// Enforce the message cap. Retains every system message plus the most
    /// recent `cap - system_count` non-system messages, in original order;
    /// older non-system messages are dropped first. System messages are
    /// never evicted while a non-system message remains eligible.
    pub fn evict_if_over_capacity(&mut self, cap: usize) {
        if self.messages.len() <= cap {
            return;
        }
        let system_count = self
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .count();
        let non_system_total = self.messages.len() - system_count;
        let keep_non_system = cap.saturating_sub(system_count);
        let mut drop_remaining = non_system_total.saturating_sub(keep_non_system);

        // retain walks front to back, so the oldest non-system turns go first.
        self.messages.retain(|m| {
            if m.role == MessageRole::System {
                return true;
            }
            if drop_remaining > 0 {
                drop_remaining -= 1;
                false
            } else {
                true
            }
        });
    }
}

/// Injected store for conversation memory, keyed by (project, user).
/// Implementations must support concurrent insertion of distinct keys;
/// turns for the same key are serialized by the caller.
pub trait ConversationStore: Send + Sync {
    fn get(&self, key: &ConversationKey) -> Option<ConversationMemory>;
    fn put(&self, key: ConversationKey, memory: ConversationMemory);
    fn delete(&self, key: &ConversationKey);
    /// Remove every conversation belonging to a project. Idempotent.
    fn delete_project(&self, project_id: &str);
}

/// Process-wide in-memory table.
pub struct InMemoryStore {
    table: DashMap<ConversationKey, ConversationMemory>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore for InMemoryStore {
    fn get(&self, key: &ConversationKey) -> Option<ConversationMemory> {
        self.table.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: ConversationKey, memory: ConversationMemory) {
        self.table.insert(key, memory);
    }

    fn delete(&self, key: &ConversationKey) {
        self.table.remove(key);
    }

    fn delete_project(&self, project_id: &str) {
        self.table.retain(|key, _| key.project_id != project_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with(roles: &[MessageRole]) -> ConversationMemory {
        let mut memory = ConversationMemory::default();
        for (i, role) in roles.iter().enumerate() {
            let turn = match role {
                MessageRole::System => TurnMessage::system(format!("sys {}", i)),
                MessageRole::User => TurnMessage::user(format!("user {}", i)),
                MessageRole::Assistant => TurnMessage::assistant(format!("agent {}", i)),
            };
            memory.append(turn);
        }
        memory
    }

    #[test]
    fn eviction_drops_oldest_non_system_first() {
        use MessageRole::*;
        let mut memory = memory_with(&[System, User, Assistant, User, Assistant, User]);
        memory.evict_if_over_capacity(4);

        assert_eq!(memory.messages.len(), 4);
        assert_eq!(memory.messages[0].role, System);
        // The two oldest non-system turns ("user 1", "agent 2") are gone.
        assert_eq!(memory.messages[1].content, "user 3");
        assert_eq!(memory.messages[2].content, "agent 4");
        assert_eq!(memory.messages[3].content, "user 5");
    }

    #[test]
    fn eviction_never_drops_system_while_non_system_remains() {
        use MessageRole::*;
        let mut memory = memory_with(&[System, System, User, User, User]);
        memory.evict_if_over_capacity(3);

        let system_count = memory
            .messages
            .iter()
            .filter(|m| m.role == System)
            .count();
        assert_eq!(system_count, 2);
        assert_eq!(memory.messages.len(), 3);
        assert_eq!(memory.messages[2].content, "user 4");
    }

    #[test]
    fn eviction_is_noop_under_cap() {
        use MessageRole::*;
        let mut memory = memory_with(&[User, Assistant]);
        memory.evict_if_over_capacity(10);
        assert_eq!(memory.messages.len(), 2);
    }

    #[test]
    fn research_focus_is_idempotent_for_repeated_leads() {
        let mut memory = ConversationMemory::default();
        let leads = vec!["missing councilman".to_string()];
        memory.derive_research_focus(&leads);
        memory.derive_research_focus(&leads);
        assert_eq!(memory.research_focus.len(), 1);
    }

    #[test]
    fn research_focus_caps_at_ten_dropping_front() {
        let mut memory = ConversationMemory::default();
        let leads: Vec<String> = (0..12).map(|i| format!("lead {}", i)).collect();
        memory.derive_research_focus(&leads);
        assert_eq!(memory.research_focus.len(), RESEARCH_FOCUS_CAP);
        assert_eq!(memory.research_focus[0], "lead 2");
        assert_eq!(memory.research_focus[9], "lead 11");
    }

    #[test]
    fn store_roundtrip_and_idempotent_delete() {
        let store = InMemoryStore::new();
        let key = ConversationKey::new("p1", "u1");
        assert!(store.get(&key).is_none());

        let mut memory = ConversationMemory::default();
        memory.append(TurnMessage::user("hello"));
        store.put(key.clone(), memory);
        assert_eq!(store.get(&key).unwrap().messages.len(), 1);

        store.delete(&key);
        store.delete(&key); // no-op on missing key
        assert!(store.get(&key).is_none());
    }

    #[test]
    fn delete_project_clears_all_users() {
        let store = InMemoryStore::new();
        store.put(
            ConversationKey::new("p1", "u1"),
            ConversationMemory::default(),
        );
        store.put(
            ConversationKey::new("p1", "u2"),
            ConversationMemory::default(),
        );
        store.put(
            ConversationKey::new("p2", "u1"),
            ConversationMemory::default(),
        );

        store.delete_project("p1");
        assert!(store.get(&ConversationKey::new("p1", "u1")).is_none());
        assert!(store.get(&ConversationKey::new("p1", "u2")).is_none());
        assert!(store.get(&ConversationKey::new("p2", "u1")).is_some());
    }
}
