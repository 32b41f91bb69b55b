//! Background task expiring overdue reviews.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::workflow::ReviewWorkflow;

/// Periodically calls [`ReviewWorkflow::expire_overdue`] until shut down.
///
/// Dropping the sweeper aborts the background task.
pub struct ExpirySweeper {
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl fmt::Debug for ExpirySweeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpirySweeper")
            .field("shutdown", &self.shutdown.load(Ordering::Relaxed))
            .field("worker", &self.worker.is_some())
            .finish()
    }
}

impl ExpirySweeper {
    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// The first sweep runs immediately.
    #[must_use]
    pub fn spawn(workflow: Arc<ReviewWorkflow>, interval: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker = tokio::spawn(run_sweep_loop(workflow, Arc::clone(&shutdown), interval));
        Self {
            shutdown,
            worker: Some(worker),
        }
    }

    /// Spawns the sweep loop using the workflow's configured interval.
    #[must_use]
    pub fn from_config(workflow: Arc<ReviewWorkflow>) -> Self {
        let interval = workflow.config().sweep_interval();
        Self::spawn(workflow, interval)
    }

    /// Returns `true` while the background task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
            && self.worker.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the loop and waits for the task to wind down.
    pub async fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            handle.abort();
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    warn!(?err, "expiry sweeper terminated abnormally");
                }
            }
        }
        debug!("expiry sweeper stopped");
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            handle.abort();
        }
    }
}

async fn run_sweep_loop(
    workflow: Arc<ReviewWorkflow>,
    shutdown: Arc<AtomicBool>,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !shutdown.load(Ordering::Acquire) {
        interval.tick().await;
        if shutdown.load(Ordering::Acquire) {
            break;
        }

        match workflow.expire_overdue().await {
            Ok(expired) if expired.is_empty() => {}
            Ok(expired) => info!(count = expired.len(), "expired overdue reviews"),
            Err(err) => warn!(?err, "expiry sweep failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_audit::InMemoryRecorder;
    use agent_primitives::{
        PolicyDecision, PolicyVerdict, ProposedAction, ReasoningRecord, ReviewState,
    };
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::Map;

    use crate::config::ReviewConfig;
    use crate::store::{InMemoryStore, RecordStore};

    #[tokio::test]
    async fn sweeps_overdue_items() {
        let store = Arc::new(InMemoryStore::new());
        let recorder = Arc::new(InMemoryRecorder::new());
        let workflow = Arc::new(
            ReviewWorkflow::new(store.clone(), recorder, ReviewConfig::default()).unwrap(),
        );

        let action = ProposedAction::new("execute_trade", Map::new()).unwrap();
        let mut record = ReasoningRecord::builder(action).build();
        record
            .attach_verdict(PolicyVerdict::new(
                PolicyDecision::ReviewRequired,
                Vec::new(),
                vec!["Completeness below threshold".into()],
                Vec::new(),
                None,
                Utc::now(),
            ))
            .unwrap();
        let id = record.id();
        store.save(record).await.unwrap();
        workflow
            .enqueue_at(id, Utc::now() - ChronoDuration::hours(25))
            .await
            .unwrap();

        let sweeper = ExpirySweeper::spawn(Arc::clone(&workflow), Duration::from_millis(10));
        assert!(sweeper.is_running());

        let mut state = ReviewState::Queued;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            state = workflow.get(id).await.unwrap().review_state();
            if state == ReviewState::Expired {
                break;
            }
        }
        assert_eq!(state, ReviewState::Expired);

        sweeper.shutdown().await;
    }
}
