//! Corpus search contract and a reference in-process implementation.
//!
//! The real corpus lives behind an external collaborator; the engine only
//! depends on the ordering policy documented here. Collaborator errors
//! are absorbed by the engine as zero records, never as turn failures.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{CorpusRecord, DocumentaryPotential};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub keywords: Vec<String>,
    pub limit: usize,
}

/// Corpus overview counts, used for reporting and reasoning hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_records: usize,
    pub interesting_records: usize,
    pub potential_yes: usize,
    pub potential_maybe: usize,
    pub potential_no: usize,
}

impl CorpusStats {
    /// Share of analyzed records flagged interesting, in percent.
    pub fn interesting_share(&self) -> f32 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.interesting_records as f32 / self.total_records as f32 * 100.0
    }
}

/// The contract consumed from the external corpus collaborator.
///
/// Empty keywords must produce a diverse high-confidence sample: records
/// flagged interesting with documentary potential YES or MAYBE, ordered by
/// relevance descending then narrative strength descending. Non-empty
/// keywords match any keyword against title, excerpt, or tags
/// (case-insensitive OR), ordered by relevance descending. Both paths are
/// capped by `request.limit`. An empty result set is valid, not an error.
#[async_trait]
pub trait CorpusSearch: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<CorpusRecord>>;
    async fn stats(&self) -> Result<CorpusStats>;
}

/// In-process corpus implementing the documented ordering policy exactly.
/// Backs the tests and small deployments where the analyzed records fit
/// in memory.
pub struct InMemoryCorpus {
    records: RwLock<Vec<CorpusRecord>>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn insert(&self, record: CorpusRecord) {
        self.records.write().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn diverse_sample(&self, limit: usize) -> Vec<CorpusRecord> {
        let records = self.records.read();
        let mut candidates: Vec<CorpusRecord> = records
            .iter()
            .filter(|r| {
                r.interesting
                    && matches!(
                        r.documentary_potential,
                        DocumentaryPotential::Yes | DocumentaryPotential::Maybe
                    )
            })
            .cloned()
            .collect();

        candidates.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.narrative_strength
                        .partial_cmp(&a.narrative_strength)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        candidates.truncate(limit);
        candidates
    }

    fn keyword_search(&self, keywords: &[String], limit: usize) -> Vec<CorpusRecord> {
        let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let records = self.records.read();

        let mut candidates: Vec<CorpusRecord> = records
            .iter()
            .filter(|r| {
                let title = r.title.to_lowercase();
                let excerpt = r.excerpt.to_lowercase();
                needles.iter().any(|needle| {
                    title.contains(needle)
                        || excerpt.contains(needle)
                        || r.story_tags
                            .iter()
                            .any(|t| t.to_lowercase().contains(needle))
                })
            })
            .cloned()
            .collect();

        candidates.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);
        candidates
    }
}

impl Default for InMemoryCorpus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CorpusSearch for InMemoryCorpus {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<CorpusRecord>> {
        let results = if request.keywords.is_empty() {
            self.diverse_sample(request.limit)
        } else {
            self.keyword_search(&request.keywords, request.limit)
        };
        tracing::debug!(
            keywords = ?request.keywords,
            limit = request.limit,
            hits = results.len(),
            "corpus search"
        );
        Ok(results)
    }

    async fn stats(&self) -> Result<CorpusStats> {
        let records = self.records.read();
        let mut stats = CorpusStats {
            total_records: records.len(),
            ..Default::default()
        };
        for record in records.iter() {
            if record.interesting {
                stats.interesting_records += 1;
            }
            match record.documentary_potential {
                DocumentaryPotential::Yes => stats.potential_yes += 1,
                DocumentaryPotential::Maybe => stats.potential_maybe += 1,
                DocumentaryPotential::No => stats.potential_no += 1,
            }
        }
        Ok(stats)
    }
}
