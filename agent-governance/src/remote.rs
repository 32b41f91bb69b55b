//! Governor delegating to an external governance service.

use std::sync::Arc;

use agent_policy::EvaluationContext;
use agent_primitives::ReasoningRecord;
use async_trait::async_trait;

use crate::governor::{QualityMetrics, ReasoningGovernor};
use crate::request::GovernanceRequest;
use crate::{GovernanceError, GovernanceResult};

/// Transport to a remote governance backend.
#[async_trait]
pub trait GovernanceClient: Send + Sync {
    /// Submits the request and returns the record the backend governed.
    async fn intercept(
        &self,
        request: &GovernanceRequest,
        ctx: &EvaluationContext,
    ) -> GovernanceResult<ReasoningRecord>;

    /// Fetches the backend's quality metrics.
    async fn quality_metrics(&self) -> GovernanceResult<QualityMetrics>;
}

/// [`ReasoningGovernor`] backed by a [`GovernanceClient`].
///
/// Requests without a proposed action never leave the process, and a
/// response lacking a verdict or completeness score is rejected.
#[derive(Clone)]
pub struct RemoteGovernor<C>
where
    C: GovernanceClient + 'static,
{
    client: Arc<C>,
}

impl<C> std::fmt::Debug for RemoteGovernor<C>
where
    C: GovernanceClient + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteGovernor").finish_non_exhaustive()
    }
}

impl<C> RemoteGovernor<C>
where
    C: GovernanceClient + 'static,
{
    /// Creates a governor using the provided client.
    #[must_use]
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C> ReasoningGovernor for RemoteGovernor<C>
where
    C: GovernanceClient + 'static,
{
    async fn intercept(
        &self,
        request: &GovernanceRequest,
        ctx: &EvaluationContext,
    ) -> GovernanceResult<ReasoningRecord> {
        if request.action.is_none() {
            return Err(agent_reasoning::ExtractionError::InvalidInput(
                "a proposed action is required for extraction",
            )
            .into());
        }

        let record = self.client.intercept(request, ctx).await?;
        if record.policy_verdict().is_none() {
            return Err(GovernanceError::remote(format!(
                "record {} was returned without a policy verdict",
                record.id()
            )));
        }
        if record.completeness().is_none() {
            return Err(GovernanceError::remote(format!(
                "record {} was returned without a completeness score",
                record.id()
            )));
        }
        Ok(record)
    }

    async fn quality_metrics(&self) -> GovernanceResult<QualityMetrics> {
        self.client.quality_metrics().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_audit::InMemoryRecorder;
    use agent_config::GovernanceConfig;
    use agent_primitives::{PolicyDecision, ProposedAction};
    use agent_review::InMemoryStore;
    use serde_json::Map;

    use crate::pipeline::GovernancePipeline;

    struct LoopbackClient {
        pipeline: GovernancePipeline,
    }

    #[async_trait]
    impl GovernanceClient for LoopbackClient {
        async fn intercept(
            &self,
            request: &GovernanceRequest,
            ctx: &EvaluationContext,
        ) -> GovernanceResult<ReasoningRecord> {
            self.pipeline.run(request, ctx).await
        }

        async fn quality_metrics(&self) -> GovernanceResult<QualityMetrics> {
            Ok(QualityMetrics::default())
        }
    }

    struct HollowClient;

    #[async_trait]
    impl GovernanceClient for HollowClient {
        async fn intercept(
            &self,
            request: &GovernanceRequest,
            _ctx: &EvaluationContext,
        ) -> GovernanceResult<ReasoningRecord> {
            let action = request
                .action
                .clone()
                .ok_or_else(|| GovernanceError::remote("no action"))?;
            Ok(ReasoningRecord::builder(action).build())
        }

        async fn quality_metrics(&self) -> GovernanceResult<QualityMetrics> {
            Err(GovernanceError::remote("unavailable"))
        }
    }

    fn request() -> GovernanceRequest {
        let action = ProposedAction::new("rebalance", Map::new()).unwrap();
        GovernanceRequest::new("pm-1", "Portfolio_Manager").with_action(action)
    }

    #[tokio::test]
    async fn remote_governor_delegates_to_client() {
        let pipeline = GovernancePipeline::new(
            GovernanceConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryRecorder::new()),
        )
        .unwrap();
        let governor = RemoteGovernor::new(Arc::new(LoopbackClient { pipeline }));

        let record = governor
            .intercept(&request(), &EvaluationContext::default())
            .await
            .unwrap();
        assert_eq!(
            record.policy_verdict().map(|verdict| verdict.decision()),
            Some(PolicyDecision::ReviewRequired)
        );
    }

    #[tokio::test]
    async fn incomplete_responses_are_rejected() {
        let governor = RemoteGovernor::new(Arc::new(HollowClient));
        let err = governor
            .intercept(&request(), &EvaluationContext::default())
            .await
            .expect_err("missing verdict");
        assert!(matches!(err, GovernanceError::Remote { .. }));
        assert!(governor.quality_metrics().await.is_err());
    }

    #[tokio::test]
    async fn requests_without_action_stay_local() {
        let governor = RemoteGovernor::new(Arc::new(HollowClient));
        let request = GovernanceRequest::new("pm-1", "Portfolio_Manager");
        let err = governor
            .intercept(&request, &EvaluationContext::default())
            .await
            .expect_err("no action");
        assert!(matches!(err, GovernanceError::Extraction(_)));
    }
}
