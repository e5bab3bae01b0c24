use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// These are data-level errors: the conversation loop never propagates
/// them. Each one is serialized into a failure tool result so the
/// model can read it and adapt.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ToolError {
    /// The model requested a tool that is not in the registry.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The argument mapping did not match the tool's declared schema
    /// (missing field, wrong type, or unknown field).
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record flowing through a filter was malformed.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// An external service the tool depends on failed.
    #[error("execution failed: {0}")]
    Execution(String),
}
