//! SQLite-backed event storage for clerk conversations.
//!
//! Every message, model call, tool call, and tool result is appended
//! to a per-conversation event log. The log serves two purposes:
//!
//! 1. **Audit trail** — a complete record of what the agent did and
//!    why, queryable after the fact (`clerk logs`).
//! 2. **Resumption** — the presentation shell persists transcripts
//!    across invocations by replaying message events.
//!
//! # Example
//!
//! ```no_run
//! use storage::{ConversationId, Event, EventKind, EventStore, Role};
//!
//! let store = EventStore::open("events.db")?;
//!
//! let id = ConversationId::new();
//! store.append(&Event::new(id, EventKind::ConversationStart))?;
//! store.append(&Event::message(id, Role::User, "find me red shoes"))?;
//!
//! for event in store.load_conversation(id)? {
//!     println!("{}: {:?}", event.timestamp, event.kind);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod event;
mod store;

pub use error::{Error, Result};
pub use event::{ConversationId, Event, EventKind, Role};
pub use store::{ConversationSummary, EventStore};
