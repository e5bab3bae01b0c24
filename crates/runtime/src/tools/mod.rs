//! Tool execution boundary.
//!
//! The [`ToolHost`] trait is the seam between the conversation loop
//! and side effects: the loop only ever sees declared specs going out
//! and values or [`ToolError`]s coming back.

mod empty;
mod errors;

pub use empty::EmptyToolHost;
pub use errors::ToolError;

use crate::model::{ToolCall, ToolSpec};
use serde_json::Value;
use std::future::Future;

/// Trait for tool execution hosts.
///
/// Implementations provide tool specifications and execute tool calls.
/// Hosts are shared across concurrently running conversations, so they
/// must be `Send + Sync` and internally synchronized.
pub trait ToolHost: Send + Sync {
    /// Get available tool specifications.
    fn specs(&self) -> &[ToolSpec];

    /// Execute a tool call.
    fn execute(&self, call: &ToolCall) -> impl Future<Output = Result<Value, ToolError>> + Send;
}
