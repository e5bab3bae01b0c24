//! Clerk runtime — the tool-calling conversation loop and the
//! shopping tool registry.
//!
//! # Overview
//!
//! The runtime is organized around these concepts:
//!
//! - **Conversation**: the loop alternating between model calls and
//!   tool execution, owning the transcript and call count.
//! - **Backend**: a trait abstracting LLM providers; the OpenAI chat
//!   completions adapter lives in `model::backend`.
//! - **ToolHost**: the boundary between the loop and side effects.
//! - **ShopToolbox**: the fixed shopping tool set (search, filters,
//!   details, compare, cart) over injected catalog clients.
//!
//! # Example
//!
//! ```ignore
//! use catalog::{OpenAiEmbedder, QdrantIndex};
//! use runtime::{Conversation, OpenAiBackend, ShopToolbox};
//! use storage::EventStore;
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = OpenAiBackend::builder("sk-...", "gpt-4o-mini").build();
//! let toolbox = ShopToolbox::new(
//!     OpenAiEmbedder::new("sk-..."),
//!     QdrantIndex::new("http://localhost:6333", "shop_products"),
//!     "cool-shoes.myshopify.com",
//! );
//! let store = EventStore::in_memory()?;
//!
//! let mut conversation = Conversation::new(store, backend, toolbox)?
//!     .with_system("You are a helpful shopping assistant.");
//! let answer = conversation.send("Can you find me some red shoes?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

mod conversation;
mod error;
pub mod model;
pub mod tools;
mod toolbox;

pub use conversation::{Conversation, DEFAULT_MAX_TOOL_ROUNDS};
pub use error::{Error, Result};
pub use model::backend::{OpenAiBackend, OpenAiBackendBuilder};
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolResult,
    ToolSpec, Usage,
};
pub use toolbox::{CartLine, ShopToolbox};
pub use tools::{EmptyToolHost, ToolError, ToolHost};
