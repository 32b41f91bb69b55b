//! Record persistence contract and the in-memory implementation.

use std::cmp::Reverse;
use std::collections::HashMap;

use agent_primitives::{
    HumanDecision, PolicyDecision, RecordId, ReasoningRecord, ReviewPriority, ReviewState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{StoreError, StoreResult};

/// Filters applied by [`RecordStore::query`]. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordQuery {
    /// Only records produced by this agent.
    pub agent_id: Option<String>,
    /// Only records whose verdict does (or does not) require review.
    pub review_required: Option<bool>,
    /// Only records created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only records created before this instant.
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of records returned.
    pub limit: Option<usize>,
}

impl RecordQuery {
    /// Restricts results to one agent.
    #[must_use]
    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Restricts results by whether review was required.
    #[must_use]
    pub fn review_required(mut self, required: bool) -> Self {
        self.review_required = Some(required);
        self
    }

    /// Restricts results to a creation-time window.
    #[must_use]
    pub fn between(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    /// Caps the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` when `record` passes every filter.
    #[must_use]
    pub fn matches(&self, record: &ReasoningRecord) -> bool {
        self.agent_id
            .as_deref()
            .is_none_or(|agent| record.agent_id() == agent)
            && self
                .review_required
                .is_none_or(|required| requires_review(record) == required)
            && self.since.is_none_or(|since| record.created_at() >= since)
            && self.until.is_none_or(|until| record.created_at() < until)
    }
}

/// Aggregate counters over every stored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Records with a policy verdict.
    pub total_decisions: usize,
    /// Records that required human review.
    pub total_reviews: usize,
    /// Records a human approved.
    pub approved: usize,
    /// Records a human rejected.
    pub rejected: usize,
    /// Records a human approved with modifications.
    pub modified: usize,
    /// Records still queued or in review.
    pub pending: usize,
    /// Records whose review expired.
    pub expired: usize,
    /// Mean completeness score over scored records, `0.0` when none.
    pub average_completeness: f64,
}

/// Persistence contract for reasoning records.
///
/// Implementations must make [`RecordStore::update_if`] atomic per record:
/// it is the only serialisation point between concurrent reviewers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record.
    async fn save(&self, record: ReasoningRecord) -> StoreResult<()>;

    /// Loads a record by identifier.
    async fn get(&self, record_id: RecordId) -> StoreResult<Option<ReasoningRecord>>;

    /// Replaces a record only if its stored review state equals `expected`.
    async fn update_if(&self, record: ReasoningRecord, expected: ReviewState) -> StoreResult<()>;

    /// Returns records matching `query`, newest first.
    async fn query(&self, query: &RecordQuery) -> StoreResult<Vec<ReasoningRecord>>;

    /// Returns queued and in-review records, highest priority then oldest first.
    async fn pending_reviews(&self, assignee: Option<&str>) -> StoreResult<Vec<ReasoningRecord>>;

    /// Computes summary counters.
    async fn summary(&self) -> StoreResult<SummaryStats>;
}

/// Store keeping every record in a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<RecordId, ReasoningRecord>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` when the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn save(&self, record: ReasoningRecord) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        let record_id = record.id();
        if guard.contains_key(&record_id) {
            return Err(StoreError::Duplicate { record_id });
        }
        guard.insert(record_id, record);
        Ok(())
    }

    async fn get(&self, record_id: RecordId) -> StoreResult<Option<ReasoningRecord>> {
        Ok(self.records.read().await.get(&record_id).cloned())
    }

    async fn update_if(&self, record: ReasoningRecord, expected: ReviewState) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        let record_id = record.id();
        let Some(slot) = guard.get_mut(&record_id) else {
            return Err(StoreError::NotFound { record_id });
        };
        let actual = slot.review_state();
        if actual != expected {
            return Err(StoreError::Conflict {
                record_id,
                expected,
                actual,
            });
        }
        *slot = record;
        Ok(())
    }

    async fn query(&self, query: &RecordQuery) -> StoreResult<Vec<ReasoningRecord>> {
        let guard = self.records.read().await;
        let mut records: Vec<ReasoningRecord> = guard
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        records.sort_by_key(|record| Reverse(record.created_at()));
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn pending_reviews(&self, assignee: Option<&str>) -> StoreResult<Vec<ReasoningRecord>> {
        let guard = self.records.read().await;
        let mut records: Vec<ReasoningRecord> = guard
            .values()
            .filter(|record| record.review_state().is_pending())
            .filter(|record| {
                assignee.is_none_or(|reviewer| {
                    record
                        .review_ticket()
                        .and_then(|ticket| ticket.assigned_to.as_deref())
                        == Some(reviewer)
                })
            })
            .cloned()
            .collect();
        records.sort_by_key(|record| (Reverse(queue_priority(record)), queued_at(record)));
        Ok(records)
    }

    async fn summary(&self) -> StoreResult<SummaryStats> {
        let guard = self.records.read().await;
        let mut stats = SummaryStats::default();
        let mut completeness_total = 0.0;
        let mut scored = 0_u32;

        for record in guard.values() {
            if record.policy_verdict().is_some() {
                stats.total_decisions += 1;
            }
            if requires_review(record) {
                stats.total_reviews += 1;
            }
            match record.human_decision() {
                HumanDecision::Approved => stats.approved += 1,
                HumanDecision::Rejected => stats.rejected += 1,
                HumanDecision::Modified => stats.modified += 1,
                HumanDecision::None => {}
            }
            match record.review_state() {
                ReviewState::Queued | ReviewState::InReview => stats.pending += 1,
                ReviewState::Expired => stats.expired += 1,
                ReviewState::NotRequired | ReviewState::Completed => {}
            }
            if let Some(assessment) = record.completeness() {
                completeness_total += assessment.score;
                scored += 1;
            }
        }

        if scored > 0 {
            stats.average_completeness = completeness_total / f64::from(scored);
        }
        Ok(stats)
    }
}

fn requires_review(record: &ReasoningRecord) -> bool {
    record
        .policy_verdict()
        .is_some_and(|verdict| verdict.decision() == PolicyDecision::ReviewRequired)
}

fn queue_priority(record: &ReasoningRecord) -> ReviewPriority {
    record
        .review_ticket()
        .map_or(ReviewPriority::Normal, |ticket| ticket.priority)
}

fn queued_at(record: &ReasoningRecord) -> DateTime<Utc> {
    record
        .review_ticket()
        .map_or(record.created_at(), |ticket| ticket.enqueued_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_primitives::{ProposedAction, ReviewTicket};
    use chrono::Duration;
    use serde_json::Map;

    fn record(agent: &str) -> ReasoningRecord {
        let action = ProposedAction::new("execute_trade", Map::new()).unwrap();
        ReasoningRecord::builder(action)
            .provenance(agent, "Portfolio_Manager", "rebalance")
            .build()
    }

    fn queued(priority: ReviewPriority, enqueued_at: DateTime<Utc>) -> ReasoningRecord {
        let mut record = record("pm-1");
        record.set_review_state(ReviewState::Queued);
        record.set_review_ticket(ReviewTicket {
            priority,
            enqueued_at,
            expires_at: enqueued_at + Duration::hours(24),
            assigned_to: None,
            claimed_at: None,
        });
        record
    }

    #[tokio::test]
    async fn save_rejects_duplicates() {
        let store = InMemoryStore::new();
        let record = record("pm-1");
        store.save(record.clone()).await.unwrap();
        let err = store.save(record).await.expect_err("duplicate");
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn update_if_is_compare_and_set() {
        let store = InMemoryStore::new();
        let mut record = record("pm-1");
        store.save(record.clone()).await.unwrap();

        record.set_review_state(ReviewState::Queued);
        store
            .update_if(record.clone(), ReviewState::NotRequired)
            .await
            .unwrap();

        let err = store
            .update_if(record.clone(), ReviewState::NotRequired)
            .await
            .expect_err("stale expectation");
        assert!(matches!(
            err,
            StoreError::Conflict {
                actual: ReviewState::Queued,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn pending_orders_by_priority_then_age() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let old_normal = queued(ReviewPriority::Normal, now - Duration::minutes(30));
        let new_urgent = queued(ReviewPriority::Urgent, now);
        let old_high = queued(ReviewPriority::High, now - Duration::minutes(20));
        let new_high = queued(ReviewPriority::High, now - Duration::minutes(5));
        for record in [&old_normal, &new_urgent, &old_high, &new_high] {
            store.save(record.clone()).await.unwrap();
        }
        store.save(record("pm-2")).await.unwrap();

        let ids: Vec<RecordId> = store
            .pending_reviews(None)
            .await
            .unwrap()
            .iter()
            .map(ReasoningRecord::id)
            .collect();
        assert_eq!(
            ids,
            [new_urgent.id(), old_high.id(), new_high.id(), old_normal.id()]
        );
    }

    #[tokio::test]
    async fn query_filters_and_limits() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        for (agent, minutes) in [("pm-1", 3), ("pm-1", 2), ("pm-2", 1)] {
            let action = ProposedAction::new("execute_trade", Map::new()).unwrap();
            let record = ReasoningRecord::builder(action)
                .provenance(agent, "Portfolio_Manager", "rebalance")
                .created_at(now - Duration::minutes(minutes))
                .build();
            store.save(record).await.unwrap();
        }

        let records = store
            .query(&RecordQuery::default().agent("pm-1"))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].created_at() > records[1].created_at());

        let limited = store.query(&RecordQuery::default().limit(1)).await.unwrap();
        assert_eq!(limited[0].agent_id(), "pm-2");

        let unreviewed = store
            .query(&RecordQuery::default().review_required(true))
            .await
            .unwrap();
        assert!(unreviewed.is_empty());
    }
}
