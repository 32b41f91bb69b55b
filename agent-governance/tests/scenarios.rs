use std::sync::Arc;

use agent_audit::{AuditEventType, AuditRecorder, FileJournal, InMemoryRecorder};
use agent_config::GovernanceConfig;
use agent_governance::{GovernancePipeline, GovernanceRequest, LocalGovernor, ReasoningGovernor};
use agent_policy::EvaluationContext;
use agent_primitives::{
    ConversationMessage, FunctionCall, HumanDecision, PolicyDecision, PolicyRuleKind,
    ProposedAction, ReasoningComponent, ReasoningRecord, ReviewPriority, ReviewState, ToolCall,
};
use agent_review::{InMemoryStore, RecordStore, ReviewError, ReviewSubmission};
use chrono::{Duration, Utc};
use serde_json::{Map, json};
use uuid::Uuid;

const CONCENTRATED_BOOK: &str = "Current situation: the portfolio holds $150M of NVDA, a 32% \
concentration against a 25% single-name limit.\n\n\
I recommend selling $90M of NVDA because the position breaches the single-name concentration limit.\n\n\
Risks:\n\
1. Market impact could result in slippage on a large block.\n\
2. Tax drag may impact after-tax returns.\n\
3. Downside risk if the rally continues after we sell.";

const IDLE_CASH: &str = "Currently the fund holds $40M of idle cash, roughly 8% of net assets and \
above the 5% target.\n\nI recommend deploying $30M into the index sleeve.";

struct Harness {
    pipeline: GovernancePipeline,
    store: Arc<InMemoryStore>,
    recorder: Arc<InMemoryRecorder>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let recorder = Arc::new(InMemoryRecorder::new());
    let pipeline =
        GovernancePipeline::new(GovernanceConfig::default(), store.clone(), recorder.clone())
            .expect("default configuration is valid");
    Harness {
        pipeline,
        store,
        recorder,
    }
}

fn sell(quantity: u64) -> ProposedAction {
    let mut parameters = Map::new();
    parameters.insert("symbol".into(), json!("NVDA"));
    parameters.insert("side".into(), json!("sell"));
    parameters.insert("quantity".into(), json!(quantity));
    ProposedAction::new("execute_trade", parameters).unwrap()
}

fn request(text: &str, action: ProposedAction) -> GovernanceRequest {
    GovernanceRequest::new("pm-1", "Portfolio_Manager")
        .with_task("Reduce single-name concentration")
        .with_message(ConversationMessage::assistant(text))
        .with_action(action)
}

fn submission(record: &ReasoningRecord, reviewer: &str) -> ReviewSubmission {
    ReviewSubmission {
        record_id: record.id(),
        reviewer_id: reviewer.into(),
        decision: HumanDecision::Approved,
        rationale: "Concentration breach confirmed against the mandate".into(),
        modification: None,
    }
}

#[tokio::test]
async fn scenario_a_complete_reasoning_scores_one() {
    let h = harness();
    let record = h
        .pipeline
        .evaluate(
            &request(CONCENTRATED_BOOK, sell(90_000_000)),
            &EvaluationContext::default(),
        )
        .unwrap();

    assert!((record.completeness_score() - 1.0).abs() < f64::EPSILON);
    assert!(record.missing_components().is_empty());
    assert!(record.situation().contains("32% concentration"));
    assert_eq!(record.risks().len(), 3);
    assert_eq!(record.quantitative_analysis().amounts, ["$150M", "$90M"]);
    assert_eq!(
        record.rationale(),
        "the position breaches the single-name concentration limit"
    );
}

#[tokio::test]
async fn scenario_b_missing_risks_and_rationale() {
    let h = harness();
    let record = h
        .pipeline
        .evaluate(
            &request(IDLE_CASH, ProposedAction::new("rebalance", Map::new()).unwrap()),
            &EvaluationContext::default(),
        )
        .unwrap();

    assert!((record.completeness_score() - 0.6).abs() < 1e-9);
    let missing = record.missing_components();
    assert!(missing.contains(&ReasoningComponent::Risks));
    assert!(missing.contains(&ReasoningComponent::Rationale));
    assert_eq!(missing.len(), 2);
    assert!(record.completeness().is_some_and(|assessment| assessment.valid));
}

#[tokio::test]
async fn scenario_c_oversized_trade_is_blocked() {
    let h = harness();
    let record = h
        .pipeline
        .run(
            &request(CONCENTRATED_BOOK, sell(120_000_000)),
            &EvaluationContext::default(),
        )
        .await
        .unwrap();

    let verdict = record.policy_verdict().unwrap();
    assert_eq!(verdict.decision(), PolicyDecision::Blocked);
    assert!(
        verdict
            .violations()
            .iter()
            .any(|violation| violation.contains("exceeds maximum"))
    );
    assert_eq!(record.review_state(), ReviewState::NotRequired);
    assert!(record.is_finalized());
    assert_eq!(
        h.recorder.event_types().await,
        [
            AuditEventType::ReasoningExtracted,
            AuditEventType::CompletenessScored,
            AuditEventType::PolicyEvaluated,
            AuditEventType::RecordFinalized,
        ]
    );
}

#[tokio::test]
async fn scenario_d_high_value_trade_is_queued_with_high_priority() {
    let h = harness();
    let record = h
        .pipeline
        .run(
            &request(CONCENTRATED_BOOK, sell(60_000_000)),
            &EvaluationContext::default(),
        )
        .await
        .unwrap();

    let verdict = record.policy_verdict().unwrap();
    assert_eq!(verdict.decision(), PolicyDecision::ReviewRequired);
    assert!(verdict.violations().is_empty());
    assert!(verdict.fired(PolicyRuleKind::HighValueReview));
    assert_eq!(record.review_state(), ReviewState::Queued);
    assert_eq!(
        record.review_ticket().map(|ticket| ticket.priority),
        Some(ReviewPriority::High)
    );

    let pending = h.pipeline.workflow().pending(None).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id(), record.id());
}

#[tokio::test]
async fn scenario_e_expired_review_rejects_decisions() {
    let h = harness();
    let queued_at = Utc::now() - Duration::hours(25);
    let record = h
        .pipeline
        .run(
            &request(CONCENTRATED_BOOK, sell(60_000_000)),
            &EvaluationContext::at(queued_at),
        )
        .await
        .unwrap();
    assert_eq!(record.review_state(), ReviewState::Queued);

    let workflow = h.pipeline.workflow();
    let expired = workflow.expire_overdue().await.unwrap();
    assert_eq!(expired, [record.id()]);
    assert_eq!(
        workflow.get(record.id()).await.unwrap().review_state(),
        ReviewState::Expired
    );

    let err = workflow
        .submit(submission(&record, "reviewer-1"))
        .await
        .expect_err("expired reviews are final");
    assert!(matches!(
        err,
        ReviewError::StaleReview {
            state: ReviewState::Expired,
            ..
        }
    ));
}

#[tokio::test]
async fn finalized_record_survives_serde_round_trip() {
    let h = harness();
    let record = h
        .pipeline
        .run(
            &request(CONCENTRATED_BOOK, sell(60_000_000)),
            &EvaluationContext::default(),
        )
        .await
        .unwrap();
    let workflow = h.pipeline.workflow();
    workflow.claim(record.id(), "reviewer-1").await.unwrap();
    let decided = workflow
        .submit(submission(&record, "reviewer-1"))
        .await
        .unwrap();
    assert!(decided.is_finalized());
    assert_eq!(decided.human_decision(), HumanDecision::Approved);

    let stored = h.store.get(decided.id()).await.unwrap().unwrap();
    assert_eq!(stored, decided);

    let json = serde_json::to_string(&decided).unwrap();
    let restored: ReasoningRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, decided);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn only_one_reviewer_can_complete_a_record() {
    let h = harness();
    let record = h
        .pipeline
        .run(
            &request(CONCENTRATED_BOOK, sell(60_000_000)),
            &EvaluationContext::default(),
        )
        .await
        .unwrap();
    let workflow = Arc::clone(h.pipeline.workflow());
    workflow.claim(record.id(), "reviewer-1").await.unwrap();
    workflow.claim(record.id(), "reviewer-2").await.unwrap();

    let tasks: Vec<_> = ["reviewer-1", "reviewer-2"]
        .into_iter()
        .map(|reviewer| {
            let workflow = Arc::clone(&workflow);
            let submission = submission(&record, reviewer);
            tokio::spawn(async move { workflow.submit(submission).await })
        })
        .collect();

    let mut completed = 0;
    let mut stale = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => completed += 1,
            Err(ReviewError::StaleReview { .. }) => stale += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!((completed, stale), (1, 1));

    let summary = h.store.summary().await.unwrap();
    assert_eq!(summary.approved, 1);
    assert_eq!(summary.pending, 0);
}

#[tokio::test]
async fn extraction_is_deterministic_across_runs() {
    let h = harness();
    let ctx = EvaluationContext::default();
    let first = h
        .pipeline
        .evaluate(&request(CONCENTRATED_BOOK, sell(90_000_000)), &ctx)
        .unwrap();
    let second = h
        .pipeline
        .evaluate(&request(CONCENTRATED_BOOK, sell(90_000_000)), &ctx)
        .unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(first.situation(), second.situation());
    assert_eq!(first.rationale(), second.rationale());
    assert_eq!(first.options(), second.options());
    assert_eq!(first.risks(), second.risks());
    assert_eq!(first.quantitative_analysis(), second.quantitative_analysis());
    assert_eq!(first.completeness(), second.completeness());
}

#[tokio::test]
async fn tool_call_proposals_flow_through_the_governor() {
    let h = harness();
    let governor = LocalGovernor::new(Arc::new(h.pipeline));
    let call = ToolCall {
        id: Some("call_42".into()),
        function: FunctionCall {
            name: "execute_trade".into(),
            arguments: json!(r#"{"symbol": "NVDA", "quantity": 90000000}"#),
        },
    };
    let messages = vec![
        ConversationMessage::user("Reduce single-name concentration"),
        ConversationMessage::assistant(CONCENTRATED_BOOK).with_tool_call(call.clone()),
        ConversationMessage::assistant("Risk of a squeeze is elevated after the sale."),
    ];
    let request =
        GovernanceRequest::for_tool_call("pm-1", "Portfolio_Manager", messages, &call).unwrap();

    let record = governor
        .intercept(&request, &EvaluationContext::default())
        .await
        .unwrap();
    assert_eq!(record.task(), "Reduce single-name concentration");
    assert_eq!(record.selected_action().tool_call_id(), Some("call_42"));
    assert_eq!(record.risks().len(), 3);
    assert_eq!(record.review_state(), ReviewState::Queued);

    let metrics = governor.quality_metrics().await.unwrap();
    assert_eq!(metrics.extraction_count, 1);
    assert!(metrics.completeness_target_met);
}

#[tokio::test]
async fn journal_captures_the_review_lifecycle() {
    let mut path = std::env::temp_dir();
    path.push(format!("governance-scenario-{}.log", Uuid::new_v4()));
    let journal: Arc<FileJournal> = Arc::new(FileJournal::open(&path).await.unwrap());
    let recorder: Arc<dyn AuditRecorder> = journal.clone();
    let pipeline = GovernancePipeline::new(
        GovernanceConfig::default(),
        Arc::new(InMemoryStore::new()),
        recorder,
    )
    .unwrap();

    let record = pipeline
        .run(
            &request(CONCENTRATED_BOOK, sell(60_000_000)),
            &EvaluationContext::default(),
        )
        .await
        .unwrap();
    pipeline
        .workflow()
        .claim(record.id(), "reviewer-1")
        .await
        .unwrap();
    pipeline
        .workflow()
        .submit(submission(&record, "reviewer-1"))
        .await
        .unwrap();

    let types: Vec<AuditEventType> = journal
        .tail(10)
        .await
        .unwrap()
        .iter()
        .map(|event| event.event_type())
        .collect();
    assert_eq!(
        types,
        [
            AuditEventType::ReasoningExtracted,
            AuditEventType::CompletenessScored,
            AuditEventType::PolicyEvaluated,
            AuditEventType::ReviewEnqueued,
            AuditEventType::ReviewClaimed,
            AuditEventType::ReviewCompleted,
        ]
    );

    let _ = std::fs::remove_file(path);
}
