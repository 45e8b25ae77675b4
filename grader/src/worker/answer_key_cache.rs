use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::core::client::database::{AnswerKeyProvider, DatabaseError};
use crate::types::CanonicalQuestion;

struct CachedQuestion {
    question: CanonicalQuestion,
    fetched_at: Instant,
}

/// Read-through cache of canonical questions shared by all grading tasks.
///
/// Entries expire `ttl` after they were fetched. Ids the provider does not know
/// are never cached, so a question added later is picked up on the next miss.
pub struct AnswerKeyCache {
    provider: Arc<dyn AnswerKeyProvider>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedQuestion>>,
}

impl AnswerKeyCache {
    pub fn new(provider: Arc<dyn AnswerKeyProvider>, ttl: Duration) -> Self {
        Self { provider, ttl, entries: RwLock::new(HashMap::new()) }
    }

    /// Resolves the given question ids, fetching missing and expired ones in a single call.
    ///
    /// Unknown ids are absent from the returned map.
    pub async fn resolve(&self, question_ids: &[String]) -> Result<HashMap<String, CanonicalQuestion>, DatabaseError> {
        let mut resolved = HashMap::with_capacity(question_ids.len());
        let mut missing = Vec::new();
        {
            let now = Instant::now();
            let entries = self.entries.read().await;
            for id in question_ids {
                match entries.get(id) {
                    Some(cached) if now.duration_since(cached.fetched_at) < self.ttl => {
                        resolved.insert(id.clone(), cached.question.clone());
                    }
                    _ => missing.push(id.clone()),
                }
            }
        }

        if missing.is_empty() {
            return Ok(resolved);
        }

        let fetched = self.provider.fetch_questions(&missing).await?;
        let requested: HashSet<&String> = missing.iter().collect();
        let fetched_at = Instant::now();
        let mut entries = self.entries.write().await;
        for question in fetched.into_iter().filter(|question| requested.contains(&question.question_id)) {
            entries.insert(question.question_id.clone(), CachedQuestion { question: question.clone(), fetched_at });
            resolved.insert(question.question_id.clone(), question);
        }

        debug!(
            requested = question_ids.len(),
            fetched = missing.len(),
            unknown = question_ids.len() - resolved.len(),
            "Resolved answer key"
        );
        Ok(resolved)
    }

    /// Number of cached questions, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
