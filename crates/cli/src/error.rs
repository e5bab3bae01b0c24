//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The database file does not exist.
    ///
    /// This typically means no conversation has been started yet.
    #[error("database not found at {path}. Run 'clerk chat' first")]
    DatabaseNotFound { path: PathBuf },

    /// No conversation was found matching the given prefix.
    #[error("no conversation found matching '{prefix}'")]
    ConversationNotFound { prefix: String },

    /// Multiple conversations match the given prefix.
    ///
    /// The user should provide a longer prefix to disambiguate.
    #[error("multiple conversations match '{prefix}': {matches:?}")]
    AmbiguousConversation {
        prefix: String,
        matches: Vec<String>,
    },

    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// An error occurred talking to the catalog services.
    #[error(transparent)]
    Catalog(#[from] catalog::Error),

    /// A product file could not be parsed.
    #[error("invalid product file: {0}")]
    ProductFile(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
