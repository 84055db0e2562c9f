use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Identifiers of items that were delivered during this process lifetime.
///
/// Each identifier remembers when it was first recorded so the store can be
/// swept; anything older than `retention` is past every recency window and can
/// no longer become eligible again.
#[derive(Debug)]
pub struct NoveltyStore {
    delivered: HashMap<String, DateTime<Utc>>,
    retention: Duration,
}

impl NoveltyStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            delivered: HashMap::new(),
            retention,
        }
    }

    pub fn seen(&self, identifier: &str) -> bool {
        self.delivered.contains_key(identifier)
    }

    /// Record a confirmed delivery
    pub fn mark_seen(&mut self, identifier: impl Into<String>) {
        self.mark_seen_at(identifier, Utc::now());
    }

    /// Record a confirmed delivery at a given instant; the first record wins
    pub fn mark_seen_at(&mut self, identifier: impl Into<String>, at: DateTime<Utc>) {
        self.delivered.entry(identifier.into()).or_insert(at);
    }

    /// Drop identifiers first seen before `now - retention`, returning how many went
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(self.retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
        else {
            return 0;
        };

        let before = self.delivered.len();
        self.delivered.retain(|_, first_seen| *first_seen >= cutoff);
        let evicted = before - self.delivered.len();

        if evicted > 0 {
            debug!("Evicted {} delivered identifiers older than {}", evicted, cutoff);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}
