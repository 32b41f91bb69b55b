//! Flattens a conversation into role-tagged text segments.

use agent_primitives::{ConversationMessage, MessageRole, ProposedAction};

/// A single non-empty piece of conversation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Role of the message the text came from.
    pub role: MessageRole,
    /// Message text, untouched.
    pub text: String,
}

/// Conversation text split into narrative and tool output, in original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedConversation {
    segments: Vec<Segment>,
    narrative: String,
}

impl NormalizedConversation {
    /// Builds the normalised view from already-ordered segments.
    #[must_use]
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let narrative = segments
            .iter()
            .filter(|segment| !segment.role.is_tool())
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            segments,
            narrative,
        }
    }

    /// Returns every segment in conversation order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns assistant and user text joined by blank lines.
    #[must_use]
    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    /// Returns tool outputs in conversation order.
    pub fn tool_outputs(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter(|segment| segment.role.is_tool())
            .map(|segment| segment.text.as_str())
    }

    /// Returns `true` when no text was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Stateless conversation flattener.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageNormalizer;

impl MessageNormalizer {
    /// Collects assistant, user, and tool text up to the proposed action.
    ///
    /// The message that carries the proposed tool call contributes its text
    /// but nothing after it does. System prompts and unrecognised roles are
    /// skipped.
    #[must_use]
    pub fn normalize(
        messages: &[ConversationMessage],
        proposed: Option<&ProposedAction>,
    ) -> NormalizedConversation {
        let mut segments = Vec::new();

        for message in messages {
            let keep = matches!(
                message.role,
                MessageRole::Assistant | MessageRole::User | MessageRole::Tool
            );
            let text = message.text().trim();
            if keep && !text.is_empty() {
                segments.push(Segment {
                    role: message.role,
                    text: text.to_owned(),
                });
            }

            let carries_proposal = proposed.is_some_and(|action| {
                message
                    .tool_calls
                    .iter()
                    .any(|call| action.matches_call(call))
            });
            if carries_proposal {
                break;
            }
        }

        NormalizedConversation::from_segments(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_primitives::{FunctionCall, ToolCall};
    use serde_json::json;

    fn trade_call() -> ToolCall {
        ToolCall {
            id: Some("call_9".into()),
            function: FunctionCall {
                name: "execute_trade".into(),
                arguments: json!({"amount": 1}),
            },
        }
    }

    #[test]
    fn stops_at_proposed_action() {
        let call = trade_call();
        let action = ProposedAction::from_tool_call(&call).unwrap();
        let messages = vec![
            ConversationMessage::new(MessageRole::System, "You are a trader."),
            ConversationMessage::user("Rebalance the book."),
            ConversationMessage::tool(r#"{"price": 190.5}"#),
            ConversationMessage::assistant("Selling now.").with_tool_call(call),
            ConversationMessage::assistant("Trade submitted."),
        ];

        let normalized = MessageNormalizer::normalize(&messages, Some(&action));
        assert_eq!(normalized.segments().len(), 3);
        assert_eq!(normalized.narrative(), "Rebalance the book.\n\nSelling now.");
        assert_eq!(normalized.tool_outputs().collect::<Vec<_>>(), [r#"{"price": 190.5}"#]);
    }

    #[test]
    fn empty_conversation_is_not_an_error() {
        let normalized = MessageNormalizer::normalize(&[], None);
        assert!(normalized.is_empty());
        assert_eq!(normalized.narrative(), "");
    }
}
