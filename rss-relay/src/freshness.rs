use crate::state::NoveltyStore;
use crate::types::FeedItem;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Why an item was or was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    MissingTimestamp,
    Stale,
    AlreadySeen,
}

/// Decides whether an entry is recent enough and not yet delivered
#[derive(Debug, Clone, Copy)]
pub struct FreshnessFilter {
    max_age: Duration,
}

impl FreshnessFilter {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn is_eligible(&self, item: &FeedItem, now: DateTime<Utc>, store: &NoveltyStore) -> bool {
        self.check(item, now, store) == Eligibility::Eligible
    }

    pub fn check(&self, item: &FeedItem, now: DateTime<Utc>, store: &NoveltyStore) -> Eligibility {
        // Undated entries cannot be placed in time, so they never pass
        let Some(published_at) = item.published_at else {
            return Eligibility::MissingTimestamp;
        };

        if !self.is_fresh(published_at, now) {
            return Eligibility::Stale;
        }

        if store.seen(&item.identifier) {
            return Eligibility::AlreadySeen;
        }

        Eligibility::Eligible
    }

    /// Inclusive at the boundary: published exactly `max_age` ago is still fresh
    pub fn is_fresh(&self, published_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let cutoff = chrono::Duration::from_std(self.max_age)
            .ok()
            .and_then(|max_age| now.checked_sub_signed(max_age));

        match cutoff {
            Some(cutoff) => published_at.with_timezone(&Utc) >= cutoff,
            // Window reaches past the representable range
            None => true,
        }
    }
}
