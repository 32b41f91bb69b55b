//! Input handed to the gate by the host agent runtime.

use agent_primitives::{ConversationMessage, MessageRole, ProposedAction, ToolCall};
use serde::{Deserialize, Serialize};

use crate::GovernanceResult;

/// Task label used when neither the caller nor the conversation names one.
pub const UNKNOWN_TASK: &str = "Unknown task";

/// One interception: who is acting, what they said, and what they propose.
///
/// The host must call the gate before executing `action` and honour the
/// resulting verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceRequest {
    /// Identifier of the acting agent.
    pub agent_id: String,
    /// Role the agent plays, e.g. `Portfolio_Manager`.
    pub agent_role: String,
    /// Explicit task description. Derived from the conversation when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Conversation history up to and including the proposal.
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
    /// The action under evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ProposedAction>,
}

impl GovernanceRequest {
    /// Creates a request with no conversation and no action.
    #[must_use]
    pub fn new(agent_id: impl Into<String>, agent_role: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_role: agent_role.into(),
            task: None,
            messages: Vec::new(),
            action: None,
        }
    }

    /// Builds a request for a host tool call.
    ///
    /// # Errors
    ///
    /// Fails when the tool call carries no function name.
    pub fn for_tool_call(
        agent_id: impl Into<String>,
        agent_role: impl Into<String>,
        messages: Vec<ConversationMessage>,
        call: &ToolCall,
    ) -> GovernanceResult<Self> {
        let action = ProposedAction::from_tool_call(call)?;
        Ok(Self::new(agent_id, agent_role)
            .with_messages(messages)
            .with_action(action))
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Replaces the conversation history.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<ConversationMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Appends one message to the conversation.
    #[must_use]
    pub fn with_message(mut self, message: ConversationMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the proposed action.
    #[must_use]
    pub fn with_action(mut self, action: ProposedAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Returns the explicit task, else the first user message, else
    /// [`UNKNOWN_TASK`].
    #[must_use]
    pub fn resolved_task(&self) -> &str {
        if let Some(task) = self.task.as_deref().filter(|task| !task.trim().is_empty()) {
            return task;
        }
        self.messages
            .iter()
            .filter(|message| message.role == MessageRole::User)
            .map(|message| message.text().trim())
            .find(|text| !text.is_empty())
            .unwrap_or(UNKNOWN_TASK)
    }
}
