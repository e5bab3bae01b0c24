//! SQLite event store implementation.

use crate::{ConversationId, Event, EventKind, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;

/// Summary of a stored conversation.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub message_count: usize,
}

/// SQLite-backed event store.
pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    /// Open or create an event store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory event store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                kind TEXT NOT NULL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_conversation
                ON events(conversation_id, timestamp);
            "#,
        )?;
        Ok(())
    }

    /// Append an event to the store.
    pub fn append(&self, event: &Event) -> Result<()> {
        self.conn.execute(
            "INSERT INTO events (id, conversation_id, timestamp, kind, data) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id.to_string(),
                event.conversation_id.to_string(),
                event.timestamp.to_rfc3339(),
                event_kind_name(&event.kind),
                serde_json::to_string(&event.kind)?,
            ],
        )?;
        Ok(())
    }

    /// Load all events for a conversation in append order, optionally
    /// filtered by kind name (e.g. "tool_call").
    pub fn load_events(
        &self,
        conversation_id: ConversationId,
        kind: Option<&str>,
    ) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, conversation_id, timestamp, data FROM events
             WHERE conversation_id = ?1 AND (?2 IS NULL OR kind = ?2)
             ORDER BY timestamp, rowid",
        )?;

        let events = stmt
            .query_map(params![conversation_id.to_string(), kind], |row| {
                let id: String = row.get(0)?;
                let conversation_id: String = row.get(1)?;
                let timestamp: String = row.get(2)?;
                let data: String = row.get(3)?;
                Ok((id, conversation_id, timestamp, data))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, conversation_id, timestamp, data)| {
                Some(Event {
                    id: id.parse().ok()?,
                    conversation_id: ConversationId(conversation_id.parse().ok()?),
                    timestamp: timestamp.parse().ok()?,
                    kind: serde_json::from_str(&data).ok()?,
                })
            })
            .collect();

        Ok(events)
    }

    /// Load the full event log for a conversation.
    pub fn load_conversation(&self, conversation_id: ConversationId) -> Result<Vec<Event>> {
        self.load_events(conversation_id, None)
    }

    /// List all conversations, newest first.
    pub fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT conversation_id,
                    MIN(timestamp),
                    MAX(CASE WHEN kind = 'conversation_end' THEN timestamp END),
                    SUM(CASE WHEN kind = 'message' THEN 1 ELSE 0 END)
             FROM events
             GROUP BY conversation_id
             ORDER BY MIN(timestamp) DESC",
        )?;

        let summaries = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let started_at: String = row.get(1)?;
                let ended_at: Option<String> = row.get(2)?;
                let message_count: i64 = row.get(3)?;
                Ok((id, started_at, ended_at, message_count))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, started_at, ended_at, message_count)| {
                Some(ConversationSummary {
                    id: ConversationId(id.parse().ok()?),
                    started_at: started_at.parse().ok()?,
                    ended_at: ended_at.and_then(|t| t.parse().ok()),
                    message_count: usize::try_from(message_count).ok()?,
                })
            })
            .collect();

        Ok(summaries)
    }
}

fn event_kind_name(kind: &EventKind) -> &'static str {
    match kind {
        EventKind::Message { .. } => "message",
        EventKind::ModelCall { .. } => "model_call",
        EventKind::ToolCall { .. } => "tool_call",
        EventKind::ToolResult { .. } => "tool_result",
        EventKind::ConversationStart => "conversation_start",
        EventKind::ConversationEnd => "conversation_end",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn append_and_load_round_trip() {
        let store = EventStore::in_memory().unwrap();
        let id = ConversationId::new();

        store
            .append(&Event::new(id, EventKind::ConversationStart))
            .unwrap();
        store
            .append(&Event::message(id, Role::User, "red shoes please"))
            .unwrap();
        store
            .append(&Event::message(id, Role::Assistant, "here are some"))
            .unwrap();
        store
            .append(&Event::new(id, EventKind::ConversationEnd))
            .unwrap();

        let events = store.load_conversation(id).unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0].kind, EventKind::ConversationStart));
        assert!(matches!(
            &events[1].kind,
            EventKind::Message { role: Role::User, content } if content == "red shoes please"
        ));
    }

    #[test]
    fn kind_filter_selects_subset() {
        let store = EventStore::in_memory().unwrap();
        let id = ConversationId::new();

        store
            .append(&Event::new(id, EventKind::ConversationStart))
            .unwrap();
        store
            .append(&Event::new(
                id,
                EventKind::ToolCall {
                    id: "call_1".into(),
                    name: "search_products".into(),
                    input: serde_json::json!({"query": "shoes"}),
                },
            ))
            .unwrap();
        store
            .append(&Event::message(id, Role::Assistant, "done"))
            .unwrap();

        let calls = store.load_events(id, Some("tool_call")).unwrap();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0].kind, EventKind::ToolCall { name, .. } if name == "search_products"));
    }

    #[test]
    fn list_conversations_reports_counts_and_status() {
        let store = EventStore::in_memory().unwrap();
        let id = ConversationId::new();

        store
            .append(&Event::new(id, EventKind::ConversationStart))
            .unwrap();
        store
            .append(&Event::message(id, Role::User, "hello"))
            .unwrap();

        let summaries = store.list_conversations().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, id);
        assert_eq!(summaries[0].message_count, 1);
        assert!(summaries[0].ended_at.is_none());
    }
}
