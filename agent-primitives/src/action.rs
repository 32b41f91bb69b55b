//! Conversation input and proposed action contracts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Author of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt or runtime instructions.
    System,
    /// Human or upstream agent input.
    User,
    /// The agent whose reasoning is being captured.
    Assistant,
    /// Output returned by a tool invocation.
    Tool,
    /// Any role the host runtime emits that is not recognised above.
    #[serde(other)]
    Other,
}

impl MessageRole {
    /// Returns `true` when the entry carries tool output rather than narrative.
    #[must_use]
    pub const fn is_tool(self) -> bool {
        matches!(self, Self::Tool)
    }
}

/// Function portion of a host tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function the agent wants to invoke.
    pub name: String,
    /// Arguments, either a JSON-encoded string or an inline object.
    #[serde(default)]
    pub arguments: Value,
}

/// Tool call as emitted by the host agent runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Runtime-assigned identifier of the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Function and arguments being invoked.
    pub function: FunctionCall,
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    /// Author of the entry.
    pub role: MessageRole,
    /// Plain text content; `None` for tool-call-only entries.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls attached to the entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ConversationMessage {
    /// Creates a text-only message.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Shorthand for an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Shorthand for a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Shorthand for a tool output message.
    #[must_use]
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Tool, content)
    }

    /// Attaches a tool call to the message.
    #[must_use]
    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }

    /// Returns the text content, or an empty string when absent.
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// The action the agent proposes to execute, copied verbatim onto the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedAction {
    function: String,
    #[serde(default)]
    parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ProposedAction {
    /// Creates a proposed action for the named function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAction`] when the function name is empty.
    pub fn new(function: impl Into<String>, parameters: Map<String, Value>) -> Result<Self> {
        let function = function.into();
        if function.trim().is_empty() {
            return Err(Error::InvalidAction {
                reason: "function name cannot be empty".into(),
            });
        }
        Ok(Self {
            function,
            parameters,
            tool_call_id: None,
        })
    }

    /// Converts a host tool call into a proposed action.
    ///
    /// String arguments are decoded as JSON; when they are not a JSON object
    /// the raw text is preserved under the `raw` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAction`] when the call has no function name.
    pub fn from_tool_call(call: &ToolCall) -> Result<Self> {
        let parameters = match &call.function.arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                _ => raw_parameters(Value::String(raw.clone())),
            },
            other => raw_parameters(other.clone()),
        };

        let mut action = Self::new(call.function.name.clone(), parameters)?;
        action.tool_call_id.clone_from(&call.id);
        Ok(action)
    }

    /// Returns the function name.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Returns the action parameters.
    #[must_use]
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Returns the originating tool call identifier, if any.
    #[must_use]
    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call_id.as_deref()
    }

    /// Returns `true` when this action was produced from `call`.
    #[must_use]
    pub fn matches_call(&self, call: &ToolCall) -> bool {
        match (&self.tool_call_id, &call.id) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => self.function == call.function.name,
        }
    }
}

fn raw_parameters(raw: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("raw".into(), raw);
    map
}
