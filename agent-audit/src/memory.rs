//! In-process recorder retaining events in memory.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::AuditResult;
use crate::event::{AuditEvent, AuditEventType};
use crate::journal::AuditRecorder;

/// Recorder that keeps every event in memory, in append order.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    /// Returns the event types recorded so far, in order.
    pub async fn event_types(&self) -> Vec<AuditEventType> {
        self.events
            .read()
            .await
            .iter()
            .map(AuditEvent::event_type)
            .collect()
    }

    /// Returns the number of recorded events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns `true` when nothing was recorded.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl AuditRecorder for InMemoryRecorder {
    async fn append(&self, event: AuditEvent) -> AuditResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_primitives::RecordId;
    use serde_json::Value;

    #[tokio::test]
    async fn keeps_append_order() {
        let recorder = InMemoryRecorder::new();
        let id = RecordId::generate();
        recorder
            .append(AuditEvent::new(AuditEventType::ReviewEnqueued, id, Value::Null))
            .await
            .unwrap();
        recorder
            .append(AuditEvent::new(AuditEventType::ReviewExpired, id, Value::Null))
            .await
            .unwrap();

        assert_eq!(
            recorder.event_types().await,
            [AuditEventType::ReviewEnqueued, AuditEventType::ReviewExpired]
        );
        assert_eq!(recorder.len().await, 2);
    }
}
