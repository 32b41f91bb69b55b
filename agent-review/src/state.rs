//! Review lifecycle state machine.

use agent_primitives::{RecordId, ReviewState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ReviewError, ReviewResult};

/// Events that trigger review transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewEvent {
    /// The policy verdict requires review.
    Enqueue,
    /// A reviewer claims the item. Repeat claims are allowed.
    Claim,
    /// A reviewer submits a decision.
    Decide,
    /// The time-to-live elapsed.
    Expire,
}

/// Computes the state reached from `from` via `event`.
///
/// # Errors
///
/// Returns [`ReviewError::StaleReview`] when `from` is terminal and
/// [`ReviewError::InvalidTransition`] for any other disallowed pair.
pub fn transition(
    record_id: RecordId,
    from: ReviewState,
    event: ReviewEvent,
) -> ReviewResult<ReviewState> {
    if from.is_terminal() {
        return Err(ReviewError::StaleReview {
            record_id,
            state: from,
        });
    }

    let next = match (from, event) {
        (ReviewState::NotRequired, ReviewEvent::Enqueue) => Some(ReviewState::Queued),
        (ReviewState::Queued | ReviewState::InReview, ReviewEvent::Claim) => {
            Some(ReviewState::InReview)
        }
        (ReviewState::InReview, ReviewEvent::Decide) => Some(ReviewState::Completed),
        (ReviewState::Queued | ReviewState::InReview, ReviewEvent::Expire) => {
            Some(ReviewState::Expired)
        }
        _ => None,
    };

    let Some(next_state) = next else {
        return Err(ReviewError::InvalidTransition {
            record_id,
            from,
            event,
        });
    };

    debug!(
        record_id = %record_id,
        from = %from,
        to = %next_state,
        ?event,
        "review transition"
    );
    Ok(next_state)
}
