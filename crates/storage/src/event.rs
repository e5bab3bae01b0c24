//! Event types for the conversation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// The kind of event that occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A message was added to the transcript.
    Message { role: Role, content: String },
    /// The model was invoked (one loop-state entry).
    ModelCall {
        input_tokens: u32,
        output_tokens: u32,
    },
    /// A tool was invoked.
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// A tool returned a result (or a contained failure).
    ToolResult {
        id: String,
        name: String,
        output: serde_json::Value,
    },
    /// Conversation started.
    ConversationStart,
    /// Conversation ended.
    ConversationEnd,
}

/// An event in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(conversation_id: ConversationId, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn message(
        conversation_id: ConversationId,
        role: Role,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            conversation_id,
            EventKind::Message {
                role,
                content: content.into(),
            },
        )
    }
}
