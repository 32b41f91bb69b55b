//! The capability interface hosts depend on, and its local implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_policy::EvaluationContext;
use agent_primitives::ReasoningRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::GovernanceResult;
use crate::pipeline::GovernancePipeline;
use crate::request::GovernanceRequest;

/// Average completeness a healthy extractor should reach.
pub const COMPLETENESS_TARGET: f64 = 0.8;

/// Average extraction latency, in milliseconds, a healthy extractor stays under.
pub const LATENCY_TARGET_MS: f64 = 100.0;

/// Gate the host calls before executing a proposed action.
///
/// Implementations may evaluate locally or delegate to a remote service;
/// hosts depend only on this trait.
#[async_trait]
pub trait ReasoningGovernor: Send + Sync {
    /// Captures reasoning for the request and returns the governed record.
    ///
    /// The host proceeds only on `auto_approved`, drops the action on
    /// `blocked`, and waits for the review outcome on `review_required`.
    async fn intercept(
        &self,
        request: &GovernanceRequest,
        ctx: &EvaluationContext,
    ) -> GovernanceResult<ReasoningRecord>;

    /// Reports extraction quality since creation or the last reset.
    async fn quality_metrics(&self) -> GovernanceResult<QualityMetrics>;
}

/// Extraction quality summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// Successful extractions counted.
    pub extraction_count: u64,
    /// Mean completeness score.
    pub average_completeness: f64,
    /// Mean extraction latency in milliseconds.
    pub average_latency_ms: f64,
    /// Fastest extraction in milliseconds.
    pub min_latency_ms: f64,
    /// Slowest extraction in milliseconds.
    pub max_latency_ms: f64,
    /// Whether the mean completeness reaches [`COMPLETENESS_TARGET`].
    pub completeness_target_met: bool,
    /// Whether the mean latency stays under [`LATENCY_TARGET_MS`].
    pub latency_target_met: bool,
}

#[derive(Debug, Default)]
struct QualityTracker {
    count: u64,
    completeness_total: f64,
    latency_total_ms: f64,
    min_latency_ms: Option<f64>,
    max_latency_ms: f64,
}

impl QualityTracker {
    fn observe(&mut self, completeness: f64, elapsed: Duration) {
        let latency_ms = elapsed.as_secs_f64() * 1_000.0;
        self.count += 1;
        self.completeness_total += completeness;
        self.latency_total_ms += latency_ms;
        self.min_latency_ms = Some(
            self.min_latency_ms
                .map_or(latency_ms, |current| current.min(latency_ms)),
        );
        self.max_latency_ms = self.max_latency_ms.max(latency_ms);
    }

    #[allow(clippy::cast_precision_loss)]
    fn snapshot(&self) -> QualityMetrics {
        if self.count == 0 {
            return QualityMetrics::default();
        }
        let count = self.count as f64;
        let average_completeness = self.completeness_total / count;
        let average_latency_ms = self.latency_total_ms / count;
        QualityMetrics {
            extraction_count: self.count,
            average_completeness,
            average_latency_ms,
            min_latency_ms: self.min_latency_ms.unwrap_or_default(),
            max_latency_ms: self.max_latency_ms,
            completeness_target_met: average_completeness >= COMPLETENESS_TARGET,
            latency_target_met: average_latency_ms < LATENCY_TARGET_MS,
        }
    }
}

/// In-process governor running the heuristic pipeline.
#[derive(Debug)]
pub struct LocalGovernor {
    pipeline: Arc<GovernancePipeline>,
    quality: Mutex<QualityTracker>,
}

impl LocalGovernor {
    /// Wraps a pipeline.
    #[must_use]
    pub fn new(pipeline: Arc<GovernancePipeline>) -> Self {
        Self {
            pipeline,
            quality: Mutex::new(QualityTracker::default()),
        }
    }

    /// Returns the wrapped pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Arc<GovernancePipeline> {
        &self.pipeline
    }

    /// Clears the collected quality metrics.
    pub async fn reset_metrics(&self) {
        *self.quality.lock().await = QualityTracker::default();
        debug!("quality metrics reset");
    }
}

#[async_trait]
impl ReasoningGovernor for LocalGovernor {
    async fn intercept(
        &self,
        request: &GovernanceRequest,
        ctx: &EvaluationContext,
    ) -> GovernanceResult<ReasoningRecord> {
        let started = Instant::now();
        let record = self.pipeline.evaluate(request, ctx)?;
        let elapsed = started.elapsed();

        self.quality
            .lock()
            .await
            .observe(record.completeness_score(), elapsed);
        debug!(
            record_id = %record.id(),
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "reasoning captured"
        );

        self.pipeline.commit(record, ctx).await
    }

    async fn quality_metrics(&self) -> GovernanceResult<QualityMetrics> {
        Ok(self.quality.lock().await.snapshot())
    }
}
