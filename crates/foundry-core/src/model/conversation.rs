use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::Document;
use super::message::{Message, Role};
use crate::error::CoreError;

/// Identifier used to correlate the turns of one conversation in logs.
/// Generated as UUID v4 hex (no dashes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The value threaded through every chat turn.
///
/// A turn never edits a state in place: the workflow engine reads one state and
/// hands back a new one, so a failed turn leaves the caller's copy untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    session_id: SessionId,
    messages: Vec<Message>,
    context: Vec<Document>,
    is_relevant: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::from_messages(Vec::new())
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            session_id: SessionId::new(),
            messages,
            context: Vec::new(),
            is_relevant: false,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Documents that grounded the most recent answer, in rank order.
    pub fn context(&self) -> &[Document] {
        &self.context
    }

    pub fn is_relevant(&self) -> bool {
        self.is_relevant
    }

    /// The content of the last message if it was written by the user.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// The content of the last message if it was written by the assistant.
    pub fn latest_answer(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// A copy of this state with a user message appended.
    pub fn with_user_message(&self, content: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.messages.push(Message::user(content));
        next
    }

    /// The state that results from a completed turn.
    pub fn advance(&self, reply: Message, context: Vec<Document>, is_relevant: bool) -> Self {
        let mut messages = self.messages.clone();
        messages.push(reply);
        Self {
            session_id: self.session_id.clone(),
            messages,
            context,
            is_relevant,
        }
    }

    /// Serialize the history as a pretty JSON array of `{role, content}`.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(&self.messages)?)
    }

    /// Rebuild a state from the export format. Retrieval context is not part of
    /// the export, so the restored state starts ungrounded.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let messages: Vec<Message> = serde_json::from_str(json)?;
        Ok(Self::from_messages(messages))
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConversationState {
        ConversationState::new()
            .with_user_message("How do I raise a seed round?")
            .advance(
                Message::assistant("Start with angels."),
                vec![Document::new("Angels invest early.", "guide.pdf")],
                true,
            )
            .with_user_message("And after that?")
    }

    #[test]
    fn test_session_id_format() {
        let id = SessionId::new();
        assert_eq!(id.as_str().len(), 32);
        assert!(!id.as_str().contains('-'));
    }

    #[test]
    fn test_export_roundtrip_preserves_order() {
        let state = sample();
        let json = state.to_json().unwrap();
        let parsed = ConversationState::from_json(&json).unwrap();

        assert_eq!(parsed.messages().len(), 3);
        for (a, b) in state.messages().iter().zip(parsed.messages()) {
            assert_eq!(a.role, b.role);
            assert_eq!(a.content, b.content);
        }
    }

    #[test]
    fn test_import_legacy_export() {
        let json = r#"[
            {"role": "human", "content": "hello"},
            {"role": "ai", "content": "hi there"}
        ]"#;
        let state = ConversationState::from_json(json).unwrap();
        assert_eq!(state.messages()[0], Message::user("hello"));
        assert_eq!(state.messages()[1], Message::assistant("hi there"));
        assert!(state.context().is_empty());
        assert!(!state.is_relevant());
    }

    #[test]
    fn test_latest_user_message() {
        let state = sample();
        assert_eq!(state.latest_user_message(), Some("And after that?"));
        assert_eq!(state.latest_answer(), None);

        let answered = state.advance(Message::assistant("Series A."), Vec::new(), false);
        assert_eq!(answered.latest_user_message(), None);
        assert_eq!(answered.latest_answer(), Some("Series A."));
    }

    #[test]
    fn test_advance_leaves_prior_state_untouched() {
        let before = sample();
        let snapshot = before.clone();
        let after = before.advance(Message::assistant("ok"), Vec::new(), false);

        assert_eq!(before, snapshot);
        assert_eq!(after.messages().len(), before.messages().len() + 1);
        assert_eq!(after.session_id(), before.session_id());
        assert!(!after.is_relevant());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(ConversationState::from_json("not json").is_err());
        assert!(ConversationState::from_json(r#"{"role":"user"}"#).is_err());
    }
}
